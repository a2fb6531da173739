// src/arithmetic/fp2.rs
//! Quadratic extension field Fp² = Fp[i]/(i² + 1).
//!
//! Every supported prime satisfies p ≡ 3 (mod 4), so −1 is a non-residue in Fp
//! and i² + 1 is irreducible. Multiplication uses three base-field products,
//! squaring two, and inversion goes through the norm a² + b² so that only one
//! base-field inversion is ever needed.

use crate::arithmetic::fp::{Fp, PrimeField};
use crate::errors::{Result, SidhError};
use crate::random::RandomSource;
use rug::Integer;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Element of the quadratic extension field Fp²: a + b·i, where i² = −1
#[derive(Clone)]
pub struct Fp2 {
    real: Fp,
    imag: Fp,
}

impl Fp2 {
    pub fn new(real: Fp, imag: Fp) -> Self {
        debug_assert!(
            std::ptr::eq(real.field(), imag.field()),
            "Components must belong to the same field"
        );
        Self { real, imag }
    }

    pub fn zero(field: &'static PrimeField) -> Self {
        Self {
            real: Fp::zero(field),
            imag: Fp::zero(field),
        }
    }

    pub fn one(field: &'static PrimeField) -> Self {
        Self {
            real: Fp::one(field),
            imag: Fp::zero(field),
        }
    }

    /// Embed a small integer as a + 0·i
    pub fn from_u64(value: u64, field: &'static PrimeField) -> Self {
        Self {
            real: Fp::from_u64(value, field),
            imag: Fp::zero(field),
        }
    }

    pub fn field(&self) -> &'static PrimeField {
        self.real.field()
    }

    /// Real and imaginary components
    pub fn components(&self) -> (&Fp, &Fp) {
        (&self.real, &self.imag)
    }

    pub fn is_zero(&self) -> bool {
        self.real.is_zero() && self.imag.is_zero()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            real: self.real.add(&other.real),
            imag: self.imag.add(&other.imag),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            real: self.real.sub(&other.real),
            imag: self.imag.sub(&other.imag),
        }
    }

    pub fn neg(&self) -> Self {
        Self {
            real: self.real.neg(),
            imag: self.imag.neg(),
        }
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Multiplication with three base-field products:
    /// (a + bi)(c + di) = (ac − bd) + ((a + b)(c + d) − ac − bd)i
    pub fn mul(&self, other: &Self) -> Self {
        let ac = self.real.mul(&other.real);
        let bd = self.imag.mul(&other.imag);
        let cross = self
            .real
            .add(&self.imag)
            .mul(&other.real.add(&other.imag));
        Self {
            real: ac.sub(&bd),
            imag: cross.sub(&ac).sub(&bd),
        }
    }

    /// Squaring with two base-field products: (a + b)(a − b) + 2ab·i
    pub fn square(&self) -> Self {
        let real = self.real.add(&self.imag).mul(&self.real.sub(&self.imag));
        let imag = self.real.mul(&self.imag).double();
        Self { real, imag }
    }

    /// Scale by a base-field element
    pub fn mul_fp(&self, scalar: &Fp) -> Self {
        Self {
            real: self.real.mul(scalar),
            imag: self.imag.mul(scalar),
        }
    }

    pub fn mul_u32(&self, k: u32) -> Self {
        Self {
            real: self.real.mul_u32(k),
            imag: self.imag.mul_u32(k),
        }
    }

    pub fn quarter(&self) -> Self {
        Self {
            real: self.real.quarter(),
            imag: self.imag.quarter(),
        }
    }

    /// Frobenius conjugate: a + bi → a − bi
    pub fn conjugate(&self) -> Self {
        Self {
            real: self.real.clone(),
            imag: self.imag.neg(),
        }
    }

    /// Field norm N(a + bi) = a² + b²
    ///
    /// Multiplicative, and zero only for the zero element since −1 is not a
    /// square in Fp.
    pub fn norm(&self) -> Fp {
        self.real.square().add(&self.imag.square())
    }

    /// (a + bi)⁻¹ = (a − bi)/(a² + b²)
    pub fn invert(&self) -> Result<Self> {
        let norm_inv = self
            .norm()
            .invert()
            .map_err(|_| SidhError::zero_inverse("fp2_invert"))?;
        Ok(self.conjugate().mul_fp(&norm_inv))
    }

    /// Invert every element with a single field inversion.
    ///
    /// Fails if any element is zero; no partial output is returned.
    pub fn batch_invert(elements: &[Fp2]) -> Result<Vec<Fp2>> {
        let Some(first) = elements.first() else {
            return Ok(Vec::new());
        };
        let field = first.field();

        let mut prefix = Vec::with_capacity(elements.len());
        let mut acc = Fp2::one(field);
        for element in elements {
            prefix.push(acc.clone());
            acc = acc.mul(element);
        }

        let mut inv = acc
            .invert()
            .map_err(|_| SidhError::zero_inverse("fp2_batch_invert"))?;
        let mut result = vec![Fp2::zero(field); elements.len()];
        for (i, element) in elements.iter().enumerate().rev() {
            result[i] = inv.mul(&prefix[i]);
            inv = inv.mul(element);
        }
        Ok(result)
    }

    /// Binary exponentiation by a public non-negative exponent
    pub fn pow(&self, exponent: &Integer) -> Self {
        let mut result = Fp2::one(self.field());
        for bit in (0..exponent.significant_bits()).rev() {
            result = result.square();
            if exponent.get_bit(bit) {
                result = result.mul(self);
            }
        }
        result
    }

    /// An element of Fp² is a square exactly when its norm is a square in Fp.
    pub fn is_square(&self) -> bool {
        self.norm().is_square()
    }

    /// Square root
    ///
    /// Reduces to base-field square roots through the norm: with t = √(a² + b²)
    /// the root is x0 + x1·i where x0² = (a ± t)/2 and x1 = b/(2·x0). Purely
    /// real inputs are handled separately since one of a and −a is always a
    /// square in Fp. The result is checked by squaring before it is returned.
    pub fn sqrt(&self) -> Result<Self> {
        let field = self.field();
        let root = if self.imag.is_zero() {
            match self.real.sqrt() {
                Ok(r) => Self::new(r, Fp::zero(field)),
                Err(_) => {
                    let r = self
                        .real
                        .neg()
                        .sqrt()
                        .map_err(|_| SidhError::no_square_root("fp2_sqrt"))?;
                    Self::new(Fp::zero(field), r)
                }
            }
        } else {
            let t = self
                .norm()
                .sqrt()
                .map_err(|_| SidhError::no_square_root("fp2_sqrt"))?;
            let x0 = match self.real.add(&t).halve().sqrt() {
                Ok(x0) => x0,
                Err(_) => self
                    .real
                    .sub(&t)
                    .halve()
                    .sqrt()
                    .map_err(|_| SidhError::no_square_root("fp2_sqrt"))?,
            };
            let x1 = self.imag.mul(
                &x0.double()
                    .invert()
                    .map_err(|_| SidhError::no_square_root("fp2_sqrt"))?,
            );
            Self::new(x0, x1)
        };

        if root.square().ct_eq(self).into() {
            Ok(root)
        } else {
            Err(SidhError::no_square_root("fp2_sqrt"))
        }
    }

    pub fn ct_eq(&self, other: &Self) -> Choice {
        self.real.ct_eq(&other.real) & self.imag.ct_eq(&other.imag)
    }

    pub fn conditional_swap(a: &mut Self, b: &mut Self, choice: Choice) {
        Fp::conditional_swap(&mut a.real, &mut b.real, choice);
        Fp::conditional_swap(&mut a.imag, &mut b.imag, choice);
    }

    /// Encoded width in bytes: two base-field elements
    pub fn encoded_len(field: &PrimeField) -> usize {
        2 * field.byte_len
    }

    /// Real part followed by imaginary part, each little-endian and fixed width.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.real.to_bytes();
        bytes.extend_from_slice(&self.imag.to_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8], field: &'static PrimeField) -> Result<Self> {
        let expected = Self::encoded_len(field);
        if bytes.len() != expected {
            return Err(SidhError::InvalidLength {
                context: "Fp2 element",
                expected,
                actual: bytes.len(),
            });
        }
        let (real, imag) = bytes.split_at(field.byte_len);
        Ok(Self {
            real: Fp::from_bytes(real, field)?,
            imag: Fp::from_bytes(imag, field)?,
        })
    }

    pub fn random<R: RandomSource + ?Sized>(rng: &mut R, field: &'static PrimeField) -> Result<Self> {
        Ok(Self {
            real: Fp::random(rng, field)?,
            imag: Fp::random(rng, field)?,
        })
    }
}

impl ConstantTimeEq for Fp2 {
    fn ct_eq(&self, other: &Self) -> Choice {
        Fp2::ct_eq(self, other)
    }
}

impl PartialEq for Fp2 {
    fn eq(&self, other: &Self) -> bool {
        Fp2::ct_eq(self, other).into()
    }
}

impl Eq for Fp2 {}

// Operators on references; by-value impls would shadow the inherent methods.
impl<'a> Add<&'a Fp2> for &'a Fp2 {
    type Output = Fp2;

    fn add(self, other: &'a Fp2) -> Fp2 {
        Fp2::add(self, other)
    }
}

impl<'a> Sub<&'a Fp2> for &'a Fp2 {
    type Output = Fp2;

    fn sub(self, other: &'a Fp2) -> Fp2 {
        Fp2::sub(self, other)
    }
}

impl<'a> Mul<&'a Fp2> for &'a Fp2 {
    type Output = Fp2;

    fn mul(self, other: &'a Fp2) -> Fp2 {
        Fp2::mul(self, other)
    }
}

impl Neg for &Fp2 {
    type Output = Fp2;

    fn neg(self) -> Fp2 {
        Fp2::neg(self)
    }
}

impl Zeroize for Fp2 {
    fn zeroize(&mut self) {
        self.real.zeroize();
        self.imag.zeroize();
    }
}

impl fmt::Debug for Fp2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fp2({} + {}·i)", self.real, self.imag)
    }
}
