// src/arithmetic/mod.rs
//! Finite field arithmetic: the base prime field Fp and its quadratic extension Fp².

pub mod fp;
pub mod fp2;

pub use fp::{Fp, PrimeField};
pub use fp2::Fp2;
