// src/curves/elliptic_curve.rs
//! Montgomery curves y² = x³ + Ax² + x over Fp² with XZ-only arithmetic.
//!
//! Points are kept as projective x-coordinates (X : Z), with Z = 0 standing for
//! the point at infinity. The y-coordinate is never tracked: doubling, tripling
//! and differential addition only need x, and the protocol only exchanges
//! x-coordinates and curve coefficients.
//!
//! Curves appear in two shapes. [`MontgomeryCurve`] holds an affine A together
//! with the ladder constant (A + 2)/4. [`ProjectiveCurve`] holds (A : C) and is
//! what the isogeny walk produces, since it avoids an inversion per step.

use crate::arithmetic::{Fp2, PrimeField};
use crate::errors::{Result, SidhError};
use rug::Integer;
use std::fmt;
use subtle::Choice;

/// Point in XZ projective coordinates
#[derive(Clone)]
pub struct ProjectivePoint {
    x: Fp2,
    z: Fp2,
}

impl ProjectivePoint {
    pub fn new(x: Fp2, z: Fp2) -> Self {
        Self { x, z }
    }

    /// The point at infinity (1 : 0)
    pub fn infinity(field: &'static PrimeField) -> Self {
        Self {
            x: Fp2::one(field),
            z: Fp2::zero(field),
        }
    }

    /// (x : 1)
    pub fn from_affine(x: Fp2) -> Self {
        let z = Fp2::one(x.field());
        Self { x, z }
    }

    pub fn x(&self) -> &Fp2 {
        &self.x
    }

    pub fn z(&self) -> &Fp2 {
        &self.z
    }

    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// Affine x = X/Z; fails for the point at infinity.
    pub fn to_affine_x(&self) -> Result<Fp2> {
        let z_inv = self
            .z
            .invert()
            .map_err(|_| SidhError::zero_inverse("point_to_affine"))?;
        Ok(self.x.mul(&z_inv))
    }

    /// Projective equality of x-coordinates: X1·Z2 = X2·Z1, with infinity
    /// equal only to itself.
    pub fn equivalent(&self, other: &Self) -> bool {
        match (self.is_infinity(), other.is_infinity()) {
            (true, true) => true,
            (false, false) => self.x.mul(&other.z) == other.x.mul(&self.z),
            _ => false,
        }
    }

    pub fn conditional_swap(a: &mut Self, b: &mut Self, choice: Choice) {
        Fp2::conditional_swap(&mut a.x, &mut b.x, choice);
        Fp2::conditional_swap(&mut a.z, &mut b.z, choice);
    }
}

impl fmt::Debug for ProjectivePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?} : {:?})", self.x, self.z)
    }
}

/// Doubling on the curve given by (A + 2C : 4C).
///
/// Infinity doubles to infinity.
pub fn x_dbl(p: &ProjectivePoint, a24_plus: &Fp2, c24: &Fp2) -> ProjectivePoint {
    let t0 = p.x.sub(&p.z).square();
    let t1 = p.x.add(&p.z).square();
    let z2 = c24.mul(&t0);
    let x2 = t1.mul(&z2);
    let t1 = t1.sub(&t0);
    let t0 = a24_plus.mul(&t1);
    let z2 = z2.add(&t0).mul(&t1);
    ProjectivePoint { x: x2, z: z2 }
}

/// [2^e]P by repeated doubling
pub fn x_dbl_e(p: &ProjectivePoint, a24_plus: &Fp2, c24: &Fp2, e: usize) -> ProjectivePoint {
    let mut q = p.clone();
    for _ in 0..e {
        q = x_dbl(&q, a24_plus, c24);
    }
    q
}

/// Tripling on the curve given by (A − 2C : A + 2C).
pub fn x_tpl(p: &ProjectivePoint, a24_minus: &Fp2, a24_plus: &Fp2) -> ProjectivePoint {
    let t0 = p.x.sub(&p.z);
    let t2 = t0.square();
    let t1 = p.x.add(&p.z);
    let t3 = t1.square();
    let t4 = t0.add(&t1);
    let t0 = t1.sub(&t0);
    let t1 = t4.square().sub(&t3).sub(&t2);
    let t5 = t3.mul(a24_plus);
    let t3 = t5.mul(&t3);
    let t6 = t2.mul(a24_minus);
    let t2 = t2.mul(&t6);
    let t3 = t2.sub(&t3);
    let t2 = t5.sub(&t6);
    let t1 = t2.mul(&t1);
    let x = t3.add(&t1).square().mul(&t4);
    let z = t3.sub(&t1).square().mul(&t0);
    ProjectivePoint { x, z }
}

/// [3^e]P by repeated tripling
pub fn x_tpl_e(p: &ProjectivePoint, a24_minus: &Fp2, a24_plus: &Fp2, e: usize) -> ProjectivePoint {
    let mut q = p.clone();
    for _ in 0..e {
        q = x_tpl(&q, a24_minus, a24_plus);
    }
    q
}

/// Differential addition: x(P + Q) from x(P), x(Q) and x(P − Q).
///
/// The difference must be a finite point with non-zero x.
pub fn x_add(p: &ProjectivePoint, q: &ProjectivePoint, diff: &ProjectivePoint) -> ProjectivePoint {
    let t0 = p.x.add(&p.z).mul(&q.x.sub(&q.z));
    let t1 = p.x.sub(&p.z).mul(&q.x.add(&q.z));
    let x = diff.z.mul(&t0.add(&t1).square());
    let z = diff.x.mul(&t0.sub(&t1).square());
    ProjectivePoint { x, z }
}

/// Combined ladder step: returns (2P, P + Q) given D = P − Q and the affine
/// constant a24 = (A + 2)/4.
pub fn x_dbl_add(
    p: &ProjectivePoint,
    q: &ProjectivePoint,
    diff: &ProjectivePoint,
    a24: &Fp2,
) -> (ProjectivePoint, ProjectivePoint) {
    let t0 = p.x.add(&p.z);
    let t1 = p.x.sub(&p.z);
    let xp = t0.square();
    let t2 = q.x.sub(&q.z);
    let xq = q.x.add(&q.z);
    let t0 = t0.mul(&t2);
    let zp = t1.square();
    let t1 = t1.mul(&xq);
    let t2 = xp.sub(&zp);
    let x2p = xp.mul(&zp);
    let z2p = a24.mul(&t2).add(&zp).mul(&t2);
    let zq = t0.sub(&t1).square();
    let xq = t0.add(&t1).square();
    let sum = ProjectivePoint {
        x: diff.z.mul(&xq),
        z: diff.x.mul(&zq),
    };
    (ProjectivePoint { x: x2p, z: z2p }, sum)
}

/// Montgomery curve with affine coefficient A
#[derive(Clone)]
pub struct MontgomeryCurve {
    a: Fp2,
    /// (A + 2)/4
    a24: Fp2,
}

impl MontgomeryCurve {
    /// Create the curve y² = x³ + Ax² + x, rejecting the singular A = ±2.
    pub fn new(a: Fp2) -> Result<Self> {
        let field = a.field();
        if a.square() == Fp2::from_u64(4, field) {
            return Err(SidhError::Malformed {
                context: "Montgomery curve",
                reason: "A² = 4 gives a singular curve".to_string(),
            });
        }
        let a24 = a.add(&Fp2::from_u64(2, field)).quarter();
        Ok(Self { a, a24 })
    }

    /// Curve with a small real coefficient, as used for the base curve
    pub fn from_u64(a: u64, field: &'static PrimeField) -> Result<Self> {
        Self::new(Fp2::from_u64(a, field))
    }

    /// Recover A from the x-coordinates of P, Q and P − Q:
    /// A = (1 − xPxQ − xPxR − xQxR)² / (4·xP·xQ·xR) − xP − xQ − xR
    pub fn recover(xp: &Fp2, xq: &Fp2, xr: &Fp2) -> Result<Self> {
        let field = xp.field();
        let pq = xp.mul(xq);
        let numerator = Fp2::one(field)
            .sub(&pq)
            .sub(&xp.mul(xr))
            .sub(&xq.mul(xr))
            .square();
        let denominator = pq.mul(xr).mul_u32(4);
        let quotient = numerator.mul(
            &denominator
                .invert()
                .map_err(|_| SidhError::zero_inverse("curve_recovery"))?,
        );
        Self::new(quotient.sub(xp).sub(xq).sub(xr))
    }

    pub fn a(&self) -> &Fp2 {
        &self.a
    }

    pub fn a24(&self) -> &Fp2 {
        &self.a24
    }

    pub fn field(&self) -> &'static PrimeField {
        self.a.field()
    }

    /// Projective (A : 1)
    pub fn to_projective(&self) -> ProjectiveCurve {
        ProjectiveCurve {
            a: self.a.clone(),
            c: Fp2::one(self.field()),
        }
    }

    /// x³ + Ax² + x
    pub fn rhs(&self, x: &Fp2) -> Fp2 {
        let x2 = x.square();
        x2.mul(x).add(&self.a.mul(&x2)).add(x)
    }

    /// Whether x is the abscissa of a point on this curve over Fp².
    pub fn is_on_curve_x(&self, x: &Fp2) -> bool {
        self.rhs(x).is_square()
    }

    /// A y-coordinate for x; fails with a missing square root when x is not on the curve.
    pub fn lift_y(&self, x: &Fp2) -> Result<Fp2> {
        self.rhs(x).sqrt()
    }

    pub fn j_invariant(&self) -> Result<Fp2> {
        self.to_projective().j_invariant()
    }

    pub fn double(&self, p: &ProjectivePoint) -> ProjectivePoint {
        x_dbl(p, &self.a24, &Fp2::one(self.field()))
    }

    pub fn triple(&self, p: &ProjectivePoint) -> ProjectivePoint {
        let two = Fp2::from_u64(2, self.field());
        x_tpl(p, &self.a.sub(&two), &self.a.add(&two))
    }

    /// Montgomery ladder computing [scalar]P over the low `bits` bits of scalar.
    ///
    /// Processes bits most-significant first with the same step sequence for
    /// every bit; the bit only drives conditional swaps. The base point must
    /// be a valid point of this curve; infinity maps to infinity and the
    /// 2-torsion point (0, 0) is handled by parity since its x-coordinate
    /// cannot serve as a ladder difference.
    pub fn ladder(&self, p: &ProjectivePoint, scalar: &Integer, bits: u32) -> ProjectivePoint {
        let field = self.field();
        if p.is_infinity() {
            return ProjectivePoint::infinity(field);
        }
        if p.x.is_zero() {
            let mut result = ProjectivePoint::infinity(field);
            let mut base = p.clone();
            let odd = bits > 0 && scalar.get_bit(0);
            ProjectivePoint::conditional_swap(&mut result, &mut base, Choice::from(odd as u8));
            return result;
        }

        let mut r0 = ProjectivePoint::infinity(field);
        let mut r1 = p.clone();
        for i in (0..bits).rev() {
            let bit = Choice::from(scalar.get_bit(i) as u8);
            ProjectivePoint::conditional_swap(&mut r0, &mut r1, bit);
            let (doubled, sum) = x_dbl_add(&r0, &r1, p, &self.a24);
            r0 = doubled;
            r1 = sum;
            ProjectivePoint::conditional_swap(&mut r0, &mut r1, bit);
        }
        r0
    }

    /// Three-point ladder: x(P + [m]Q) from affine x(P), x(Q), x(P − Q).
    ///
    /// Runs exactly `bits` steps, least-significant bit first, keeping [2^i]Q
    /// and the two running points P + [m mod 2^i]Q and its neighbour.
    pub fn ladder_three_point(
        &self,
        xp: &Fp2,
        xq: &Fp2,
        xpq: &Fp2,
        m: &Integer,
        bits: u32,
    ) -> ProjectivePoint {
        let mut r0 = ProjectivePoint::from_affine(xq.clone());
        let mut r2 = ProjectivePoint::from_affine(xpq.clone());
        let mut r = ProjectivePoint::from_affine(xp.clone());
        let mut prev = 0u8;
        for i in 0..bits {
            let bit = m.get_bit(i) as u8;
            let swap = Choice::from(bit ^ prev);
            prev = bit;
            ProjectivePoint::conditional_swap(&mut r, &mut r2, swap);
            let (doubled, sum) = x_dbl_add(&r0, &r2, &r, &self.a24);
            r0 = doubled;
            r2 = sum;
        }
        ProjectivePoint::conditional_swap(&mut r, &mut r2, Choice::from(prev));
        r
    }

    /// Fixed-width encoding of A
    pub fn to_bytes(&self) -> Vec<u8> {
        self.a.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8], field: &'static PrimeField) -> Result<Self> {
        Self::new(Fp2::from_bytes(bytes, field)?)
    }
}

impl PartialEq for MontgomeryCurve {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a
    }
}

impl Eq for MontgomeryCurve {}

impl fmt::Debug for MontgomeryCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MontgomeryCurve(A = {:?})", self.a)
    }
}

/// Montgomery curve with projective coefficient (A : C), i.e. affine A/C
#[derive(Clone)]
pub struct ProjectiveCurve {
    a: Fp2,
    c: Fp2,
}

impl ProjectiveCurve {
    pub fn new(a: Fp2, c: Fp2) -> Self {
        Self { a, c }
    }

    pub fn a(&self) -> &Fp2 {
        &self.a
    }

    pub fn c(&self) -> &Fp2 {
        &self.c
    }

    /// Constants (A + 2C, 4C) for doubling
    pub fn doubling_constants(&self) -> (Fp2, Fp2) {
        let c2 = self.c.double();
        (self.a.add(&c2), c2.double())
    }

    /// Constants (A − 2C, A + 2C) for tripling
    pub fn tripling_constants(&self) -> (Fp2, Fp2) {
        let c2 = self.c.double();
        (self.a.sub(&c2), self.a.add(&c2))
    }

    /// From (A + 2C : 4C): A = 4·a24p − 2·c24, C = c24, up to a common factor
    pub fn from_doubling_constants(a24_plus: &Fp2, c24: &Fp2) -> Self {
        Self {
            a: a24_plus.mul_u32(4).sub(&c24.double()),
            c: c24.clone(),
        }
    }

    /// From (A − 2C : A + 2C): A = 2(a24p + a24m), C = a24p − a24m
    pub fn from_tripling_constants(a24_minus: &Fp2, a24_plus: &Fp2) -> Self {
        Self {
            a: a24_plus.add(a24_minus).double(),
            c: a24_plus.sub(a24_minus),
        }
    }

    /// Normalise to an affine curve with one inversion.
    pub fn to_affine(&self) -> Result<MontgomeryCurve> {
        let c_inv = self
            .c
            .invert()
            .map_err(|_| SidhError::zero_inverse("curve_to_affine"))?;
        MontgomeryCurve::new(self.a.mul(&c_inv))
    }

    /// j = 256·(A² − 3C²)³ / (C⁴·(A² − 4C²))
    pub fn j_invariant(&self) -> Result<Fp2> {
        let a2 = self.a.square();
        let c2 = self.c.square();
        let t = a2.sub(&c2.mul_u32(3));
        let numerator = t.square().mul(&t).mul_u32(256);
        let denominator = c2.square().mul(&a2.sub(&c2.mul_u32(4)));
        let inv = denominator
            .invert()
            .map_err(|_| SidhError::zero_inverse("j_invariant"))?;
        Ok(numerator.mul(&inv))
    }

    /// Same curve up to scaling of (A : C)
    pub fn equivalent(&self, other: &Self) -> bool {
        self.a.mul(&other.c) == other.a.mul(&self.c)
    }
}

impl fmt::Debug for ProjectiveCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectiveCurve({:?} : {:?})", self.a, self.c)
    }
}
