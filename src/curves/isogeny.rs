// src/curves/isogeny.rs
//! Small-degree isogenies between Montgomery curves in XZ coordinates.
//!
//! Each isogeny is built from a kernel generator of order 2, 4 or 3. Building
//! it yields the codomain in the constant form the matching multiplication
//! routine consumes: (A + 2C : 4C) for degrees 2 and 4, (A − 2C : A + 2C) for
//! degree 3. Evaluation maps points of the domain to the codomain and sends
//! kernel points to infinity.

use crate::arithmetic::Fp2;
use crate::curves::elliptic_curve::{ProjectiveCurve, ProjectivePoint};

/// An isogeny that can push points to its codomain
pub trait Isogeny {
    /// Degree of the isogeny
    fn degree(&self) -> u32;

    /// Image of `point` under the isogeny
    fn evaluate(&self, point: &ProjectivePoint) -> ProjectivePoint;

    /// Codomain as (A : C)
    fn codomain(&self) -> ProjectiveCurve;
}

/// 2-isogeny with kernel generated by a point of order 2 other than (0, 0)
#[derive(Clone, Debug)]
pub struct TwoIsogeny {
    kernel_x: Fp2,
    kernel_z: Fp2,
    a24_plus: Fp2,
    c24: Fp2,
}

impl TwoIsogeny {
    pub fn new(kernel: &ProjectivePoint) -> Self {
        let x2 = kernel.x().square();
        let z2 = kernel.z().square();
        Self {
            kernel_x: kernel.x().clone(),
            kernel_z: kernel.z().clone(),
            a24_plus: z2.sub(&x2),
            c24: z2,
        }
    }

    /// Codomain constants (A + 2C : 4C)
    pub fn codomain_constants(&self) -> (&Fp2, &Fp2) {
        (&self.a24_plus, &self.c24)
    }
}

impl Isogeny for TwoIsogeny {
    fn degree(&self) -> u32 {
        2
    }

    fn evaluate(&self, point: &ProjectivePoint) -> ProjectivePoint {
        let t0 = self
            .kernel_x
            .add(&self.kernel_z)
            .mul(&point.x().sub(point.z()));
        let t1 = self
            .kernel_x
            .sub(&self.kernel_z)
            .mul(&point.x().add(point.z()));
        ProjectivePoint::new(
            point.x().mul(&t0.add(&t1)),
            point.z().mul(&t0.sub(&t1)),
        )
    }

    fn codomain(&self) -> ProjectiveCurve {
        ProjectiveCurve::from_doubling_constants(&self.a24_plus, &self.c24)
    }
}

/// 4-isogeny with kernel generated by a point K of order 4 with [2]K ≠ (0, 0)
#[derive(Clone, Debug)]
pub struct FourIsogeny {
    coefficients: [Fp2; 3],
    a24_plus: Fp2,
    c24: Fp2,
}

impl FourIsogeny {
    pub fn new(kernel: &ProjectivePoint) -> Self {
        let (x, z) = (kernel.x(), kernel.z());
        let c1 = x.sub(z);
        let c2 = x.add(z);
        let c0 = z.square().double();
        let c24 = c0.square();
        let c0 = c0.double();
        let a24_plus = x.square().double().square();
        Self {
            coefficients: [c0, c1, c2],
            a24_plus,
            c24,
        }
    }

    /// Codomain constants (A + 2C : 4C)
    pub fn codomain_constants(&self) -> (&Fp2, &Fp2) {
        (&self.a24_plus, &self.c24)
    }
}

impl Isogeny for FourIsogeny {
    fn degree(&self) -> u32 {
        4
    }

    fn evaluate(&self, point: &ProjectivePoint) -> ProjectivePoint {
        let [c0, c1, c2] = &self.coefficients;
        let t0 = point.x().add(point.z());
        let t1 = point.x().sub(point.z());
        let x = t0.mul(c1);
        let z = t1.mul(c2);
        let t0 = t0.mul(&t1).mul(c0);
        let t1 = x.add(&z).square();
        let z = x.sub(&z).square();
        let x = t1.add(&t0).mul(&t1);
        let z = z.sub(&t0).mul(&z);
        ProjectivePoint::new(x, z)
    }

    fn codomain(&self) -> ProjectiveCurve {
        ProjectiveCurve::from_doubling_constants(&self.a24_plus, &self.c24)
    }
}

/// 3-isogeny with kernel generated by a point of order 3
#[derive(Clone, Debug)]
pub struct ThreeIsogeny {
    coefficients: [Fp2; 2],
    a24_minus: Fp2,
    a24_plus: Fp2,
}

impl ThreeIsogeny {
    pub fn new(kernel: &ProjectivePoint) -> Self {
        let (x, z) = (kernel.x(), kernel.z());
        let c0 = x.sub(z);
        let t0 = c0.square();
        let c1 = x.add(z);
        let t1 = c1.square();
        let t2 = t0.add(&t1);
        let t3 = c0.add(&c1).square().sub(&t2);
        let t2 = t1.add(&t3);
        let t3 = t3.add(&t0);
        let t4 = t1.add(&t3.add(&t0).double());
        let a24_minus = t2.mul(&t4);
        let t4 = t0.add(&t1.add(&t2).double());
        let a24_plus = t3.mul(&t4);
        Self {
            coefficients: [c0, c1],
            a24_minus,
            a24_plus,
        }
    }

    /// Codomain constants (A − 2C : A + 2C)
    pub fn codomain_constants(&self) -> (&Fp2, &Fp2) {
        (&self.a24_minus, &self.a24_plus)
    }
}

impl Isogeny for ThreeIsogeny {
    fn degree(&self) -> u32 {
        3
    }

    fn evaluate(&self, point: &ProjectivePoint) -> ProjectivePoint {
        let [c0, c1] = &self.coefficients;
        let t0 = point.x().add(point.z()).mul(c0);
        let t1 = point.x().sub(point.z()).mul(c1);
        let t2 = t0.add(&t1).square();
        let t0 = t1.sub(&t0).square();
        ProjectivePoint::new(point.x().mul(&t2), point.z().mul(&t0))
    }

    fn codomain(&self) -> ProjectiveCurve {
        ProjectiveCurve::from_tripling_constants(&self.a24_minus, &self.a24_plus)
    }
}
