// src/curves/mod.rs
//! Montgomery curves, small-degree isogenies and the isogeny engine.

pub mod elliptic_curve;
pub mod isogeny;
pub mod isogeny_chain;
pub mod isogeny_kernel;
pub mod strategy;

pub use elliptic_curve::{MontgomeryCurve, ProjectiveCurve, ProjectivePoint};
pub use isogeny::{FourIsogeny, Isogeny, ThreeIsogeny, TwoIsogeny};
pub use isogeny_chain::{IsogenyDegree, IsogenyEngine, IsogenyImage, WalkStats};
pub use isogeny_kernel::TorsionBasis;
pub use strategy::{CostModel, Strategy};
