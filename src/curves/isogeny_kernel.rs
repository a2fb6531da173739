// src/curves/isogeny_kernel.rs
//! Public torsion bases and secret kernel generators.
//!
//! Each role owns a basis (P, Q) of the ℓ^e torsion of the base curve, stored
//! as the affine x-coordinates of P, Q and P − Q. A private scalar m selects
//! the kernel ⟨P + [m]Q⟩ through the three-point ladder.
//!
//! Bases are derived deterministically from the curve instead of being read
//! from tables: candidate abscissae x = c + i for c = 1, 2, ... are tested for
//! lying on the curve, the cofactor is cleared with the ladder, and the first
//! points of exact order ℓ^e that generate independent subgroups are kept.
//! For the 2-power basis, Q is chosen with [2^(e−1)]Q = (0, 0) and P with
//! [2^(e−1)]P ≠ (0, 0), so that no kernel ⟨P + [m]Q⟩ ever contains (0, 0).

use crate::arithmetic::{Fp, Fp2};
use crate::curves::elliptic_curve::{MontgomeryCurve, ProjectivePoint};
use crate::curves::isogeny_chain::{multiply_by_prime_power, IsogenyDegree};
use crate::errors::{Result, SidhError};
use log::debug;
use rug::Integer;

/// Candidate abscissae examined before giving up on a basis
const MAX_CANDIDATES: u64 = 100_000;

/// Torsion basis as affine x-coordinates of P, Q and P − Q
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TorsionBasis {
    p: Fp2,
    q: Fp2,
    p_minus_q: Fp2,
}

impl TorsionBasis {
    pub fn new(p: Fp2, q: Fp2, p_minus_q: Fp2) -> Self {
        Self { p, q, p_minus_q }
    }

    pub fn p(&self) -> &Fp2 {
        &self.p
    }

    pub fn q(&self) -> &Fp2 {
        &self.q
    }

    pub fn p_minus_q(&self) -> &Fp2 {
        &self.p_minus_q
    }

    /// (P, Q, P − Q) as projective points, in that order
    pub fn points(&self) -> Vec<ProjectivePoint> {
        vec![
            ProjectivePoint::from_affine(self.p.clone()),
            ProjectivePoint::from_affine(self.q.clone()),
            ProjectivePoint::from_affine(self.p_minus_q.clone()),
        ]
    }

    /// Kernel generator P + [m]Q on `curve`, over a fixed `bits`-step ladder
    pub fn kernel(&self, curve: &MontgomeryCurve, m: &Integer, bits: u32) -> ProjectivePoint {
        curve.ladder_three_point(&self.p, &self.q, &self.p_minus_q, m, bits)
    }

    /// Basis of the 2^e torsion. `cofactor` is the part of p + 1 prime to 2.
    pub fn derive_two_power(curve: &MontgomeryCurve, exponent: u32, cofactor: &Integer) -> Result<Self> {
        let projective = curve.to_projective();
        let mut p = None;
        let mut q = None;

        for x in candidates(curve) {
            let point = curve.ladder(&ProjectivePoint::from_affine(x), cofactor, cofactor.significant_bits());
            if point.is_infinity() {
                continue;
            }
            let half = multiply_by_prime_power(&projective, &point, IsogenyDegree::Two, exponent - 1);
            if half.is_infinity() {
                continue;
            }
            if half.x().is_zero() {
                if q.is_none() {
                    q = Some(point.to_affine_x()?);
                }
            } else if p.is_none() {
                p = Some(point.to_affine_x()?);
            }
            if let (Some(p), Some(q)) = (&p, &q) {
                debug!("2^{} torsion basis found", exponent);
                let p_minus_q = difference(curve, p, q)?;
                return Ok(Self::new(p.clone(), q.clone(), p_minus_q));
            }
        }
        Err(basis_not_found(2, exponent))
    }

    /// Basis of the 3^e torsion. `cofactor` is the part of p + 1 prime to 3.
    pub fn derive_three_power(curve: &MontgomeryCurve, exponent: u32, cofactor: &Integer) -> Result<Self> {
        let projective = curve.to_projective();
        let mut first: Option<(Fp2, ProjectivePoint)> = None;

        for x in candidates(curve) {
            let point = curve.ladder(&ProjectivePoint::from_affine(x), cofactor, cofactor.significant_bits());
            if point.is_infinity() {
                continue;
            }
            let third = multiply_by_prime_power(&projective, &point, IsogenyDegree::Three, exponent - 1);
            if third.is_infinity() {
                continue;
            }
            match &first {
                None => first = Some((point.to_affine_x()?, third)),
                Some((p, p_third)) => {
                    if !third.equivalent(p_third) {
                        debug!("3^{} torsion basis found", exponent);
                        let q = point.to_affine_x()?;
                        let p_minus_q = difference(curve, p, &q)?;
                        return Ok(Self::new(p.clone(), q, p_minus_q));
                    }
                }
            }
        }
        Err(basis_not_found(3, exponent))
    }
}

/// Abscissae c + i, c = 1, 2, ..., that lie on the curve
fn candidates(curve: &MontgomeryCurve) -> impl Iterator<Item = Fp2> + '_ {
    let field = curve.field();
    (1..=MAX_CANDIDATES)
        .map(move |c| Fp2::new(Fp::from_u64(c, field), Fp::one(field)))
        .filter(move |x| curve.is_on_curve_x(x))
}

/// x(P − Q) = ((yP + yQ)/(xP − xQ))² − A − xP − xQ for lifted y-coordinates
fn difference(curve: &MontgomeryCurve, xp: &Fp2, xq: &Fp2) -> Result<Fp2> {
    let yp = curve.lift_y(xp)?;
    let yq = curve.lift_y(xq)?;
    let slope = yp.add(&yq).mul(&xp.sub(xq).invert()?);
    Ok(slope.square().sub(curve.a()).sub(xp).sub(xq))
}

fn basis_not_found(prime: u32, exponent: u32) -> SidhError {
    SidhError::InvalidConfiguration {
        parameter: "torsion basis".to_string(),
        reason: format!(
            "no {}^{} torsion basis among the first {} candidates",
            prime, exponent, MAX_CANDIDATES
        ),
    }
}
