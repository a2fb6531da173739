// src/arithmetic/fp.rs
//! Prime field arithmetic over Fp for the primes p = 2^eA·3^eB·f − 1.
//!
//! Elements carry a `'static` reference to the [`PrimeField`] they belong to,
//! so a parameter set can hand out elements of its own field without a global
//! singleton. Values are always kept in the canonical range [0, p). Operations
//! on secret data (inversion, equality, conditional swaps) are written with a
//! data-independent operation sequence; encoding and square-root search work on
//! public values only.

use crate::errors::{Result, SidhError};
use crate::random::RandomSource;
use rug::integer::{IsPrime, Order};
use rug::ops::RemRoundingAssign;
use rug::{Assign, Integer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Number of Miller-Rabin rounds used to validate a modulus
const PRIMALITY_REPS: u32 = 40;

/// Modulus descriptor with the exponents and constants derived from p.
///
/// Built once per distinct prime and leaked to `'static`, which is what lets
/// [`Fp`] hold a plain reference.
pub struct PrimeField {
    /// The prime modulus
    pub p: Integer,
    /// Bit length of p
    pub bit_len: u32,
    /// Width of the fixed little-endian encoding of an element
    pub byte_len: usize,
    /// p − 2, exponent for inversion by Fermat's little theorem
    inversion_exponent: Integer,
    /// (p − 1)/2, Euler criterion exponent
    legendre_exponent: Integer,
    /// (p + 1)/4 when p ≡ 3 (mod 4)
    sqrt_exponent: Option<Integer>,
    /// p − 1 = 2^two_adicity · odd_part
    two_adicity: u32,
    odd_part: Integer,
    /// Smallest quadratic non-residue, for Tonelli-Shanks
    non_residue: Integer,
    inv_two: Integer,
    inv_four: Integer,
}

impl PrimeField {
    /// Validate `p` and precompute its exponents.
    ///
    /// Fails with [`SidhError::InvalidConfiguration`] unless p is an odd
    /// (probable) prime greater than 3.
    pub fn new(p: Integer) -> Result<Self> {
        if p <= 3 || p.is_even() {
            return Err(SidhError::InvalidConfiguration {
                parameter: "p".to_string(),
                reason: "modulus must be an odd prime greater than 3".to_string(),
            });
        }
        if p.is_probably_prime(PRIMALITY_REPS) == IsPrime::No {
            return Err(SidhError::InvalidConfiguration {
                parameter: "p".to_string(),
                reason: format!("{}-bit modulus is composite", p.significant_bits()),
            });
        }

        let bit_len = p.significant_bits();
        let byte_len = (bit_len as usize + 7) / 8;
        let p_minus_one = Integer::from(&p - 1u32);
        let inversion_exponent = Integer::from(&p - 2u32);
        let legendre_exponent = Integer::from(&p_minus_one >> 1);
        let sqrt_exponent = if p.is_congruent_u(3, 4) {
            Some(Integer::from(&p + 1u32) >> 2)
        } else {
            None
        };

        let two_adicity = p_minus_one.find_one(0).unwrap_or(0);
        let odd_part = Integer::from(&p_minus_one >> two_adicity);

        // The smallest non-residue is tiny for every prime, so a linear scan is enough.
        let mut candidate = Integer::from(2);
        loop {
            let symbol = candidate
                .clone()
                .secure_pow_mod(&legendre_exponent, &p);
            if symbol == p_minus_one {
                break;
            }
            candidate += 1;
        }

        let inv_two = Integer::from(&p + 1u32) >> 1;
        let inv_four = Integer::from(4)
            .secure_pow_mod(&inversion_exponent, &p);

        Ok(Self {
            p,
            bit_len,
            byte_len,
            inversion_exponent,
            legendre_exponent,
            sqrt_exponent,
            two_adicity,
            odd_part,
            non_residue: candidate,
            inv_two,
            inv_four,
        })
    }

    /// Whether the fast square-root exponent applies.
    pub fn is_three_mod_four(&self) -> bool {
        self.sqrt_exponent.is_some()
    }
}

impl fmt::Debug for PrimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimeField")
            .field("bit_len", &self.bit_len)
            .field("byte_len", &self.byte_len)
            .field("p", &self.p)
            .finish()
    }
}

/// Element of the prime field Fp
#[derive(Clone)]
pub struct Fp {
    value: Integer,
    field: &'static PrimeField,
}

impl Fp {
    /// Create a field element, reducing any integer into [0, p).
    pub fn new(value: Integer, field: &'static PrimeField) -> Self {
        let mut value = value;
        value.rem_euc_assign(&field.p);
        Self { value, field }
    }

    pub fn from_u64(value: u64, field: &'static PrimeField) -> Self {
        Self::new(Integer::from(value), field)
    }

    pub fn zero(field: &'static PrimeField) -> Self {
        Self {
            value: Integer::new(),
            field,
        }
    }

    pub fn one(field: &'static PrimeField) -> Self {
        Self {
            value: Integer::from(1),
            field,
        }
    }

    /// The field this element lives in
    pub fn field(&self) -> &'static PrimeField {
        self.field
    }

    /// Canonical representative in [0, p)
    pub fn value(&self) -> &Integer {
        &self.value
    }

    /// Reduce a value in [0, 2p) by one conditional subtraction of p.
    ///
    /// The subtraction always happens; the wrap bit only decides whether p or 0
    /// is subtracted.
    fn reduce_once(mut sum: Integer, field: &'static PrimeField) -> Integer {
        let wrap = Choice::from((sum >= field.p) as u8);
        let correction = Integer::from(&field.p * u32::from(wrap.unwrap_u8()));
        sum -= correction;
        sum
    }

    /// Modular addition
    pub fn add(&self, other: &Self) -> Self {
        debug_assert!(
            std::ptr::eq(self.field, other.field),
            "Cannot add elements from different fields"
        );
        let sum = Integer::from(&self.value + &other.value);
        Self {
            value: Self::reduce_once(sum, self.field),
            field: self.field,
        }
    }

    /// Modular subtraction, computed as a + (p − b)
    pub fn sub(&self, other: &Self) -> Self {
        debug_assert!(
            std::ptr::eq(self.field, other.field),
            "Cannot subtract elements from different fields"
        );
        let neg_b = Integer::from(&self.field.p - &other.value);
        let sum = neg_b + &self.value;
        Self {
            value: Self::reduce_once(sum, self.field),
            field: self.field,
        }
    }

    pub fn neg(&self) -> Self {
        Self::zero(self.field).sub(self)
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Modular multiplication
    ///
    /// The full product of two reduced values has at most 2·bit_len bits and
    /// is held by an arbitrary-precision integer before reduction, so no
    /// intermediate can overflow.
    pub fn mul(&self, other: &Self) -> Self {
        debug_assert!(
            std::ptr::eq(self.field, other.field),
            "Cannot multiply elements from different fields"
        );
        let mut product = Integer::from(&self.value * &other.value);
        product %= &self.field.p;
        Self {
            value: product,
            field: self.field,
        }
    }

    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Multiply by a small public constant.
    pub fn mul_u32(&self, k: u32) -> Self {
        let mut product = Integer::from(&self.value * k);
        product %= &self.field.p;
        Self {
            value: product,
            field: self.field,
        }
    }

    /// Multiplicative inverse a^(p−2)
    ///
    /// Uses GMP's side-channel resistant modular exponentiation so the running
    /// time does not depend on the value being inverted. Fails on zero.
    pub fn invert(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(SidhError::zero_inverse("fp_invert"));
        }
        let inv = self
            .value
            .clone()
            .secure_pow_mod(&self.field.inversion_exponent, &self.field.p);
        Ok(Self {
            value: inv,
            field: self.field,
        })
    }

    /// Exponentiation by a public non-negative exponent.
    pub fn pow(&self, exponent: &Integer) -> Self {
        debug_assert!(exponent.cmp0() != Ordering::Less, "negative exponent");
        if exponent.cmp0() != Ordering::Greater {
            return Self::one(self.field);
        }
        let value = self
            .value
            .clone()
            .secure_pow_mod(exponent, &self.field.p);
        Self {
            value,
            field: self.field,
        }
    }

    pub fn halve(&self) -> Self {
        let mut value = Integer::from(&self.value * &self.field.inv_two);
        value %= &self.field.p;
        Self {
            value,
            field: self.field,
        }
    }

    pub fn quarter(&self) -> Self {
        let mut value = Integer::from(&self.value * &self.field.inv_four);
        value %= &self.field.p;
        Self {
            value,
            field: self.field,
        }
    }

    /// Euler's criterion: zero counts as a square.
    pub fn is_square(&self) -> bool {
        if self.is_zero() {
            return true;
        }
        self.pow(&self.field.legendre_exponent).value == 1
    }

    /// Square root
    ///
    /// For p ≡ 3 (mod 4) this is the single exponentiation a^((p+1)/4);
    /// otherwise Tonelli-Shanks with the precomputed non-residue. The result is
    /// always checked by squaring, and a non-residue yields
    /// [`ArithmeticFault::NoSquareRoot`](crate::errors::ArithmeticFault).
    pub fn sqrt(&self) -> Result<Self> {
        if self.is_zero() {
            return Ok(Self::zero(self.field));
        }
        let root = match &self.field.sqrt_exponent {
            Some(exponent) => self.pow(exponent),
            None => self.tonelli_shanks()?,
        };
        if root.square().ct_eq(self).into() {
            Ok(root)
        } else {
            Err(SidhError::no_square_root("fp_sqrt"))
        }
    }

    fn tonelli_shanks(&self) -> Result<Self> {
        let field = self.field;
        let one = Self::one(field);
        let mut m = field.two_adicity;
        let mut c = Self::new(field.non_residue.clone(), field).pow(&field.odd_part);
        let mut t = self.pow(&field.odd_part);
        let half = Integer::from(&field.odd_part + 1u32) >> 1;
        let mut r = self.pow(&half);

        while t != one {
            let mut i = 0u32;
            let mut probe = t.clone();
            while probe != one {
                probe = probe.square();
                i += 1;
                if i == m {
                    return Err(SidhError::no_square_root("fp_sqrt"));
                }
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = b.square();
            }
            m = i;
            c = b.square();
            t = t.mul(&c);
            r = r.mul(&b);
        }
        Ok(r)
    }

    pub fn is_zero(&self) -> bool {
        self.value.cmp0() == Ordering::Equal
    }

    /// Constant-time equality over the fixed-width encodings.
    pub fn ct_eq(&self, other: &Self) -> Choice {
        let same_field = Choice::from(std::ptr::eq(self.field, other.field) as u8);
        same_field & self.to_bytes().as_slice().ct_eq(other.to_bytes().as_slice())
    }

    /// Swap `a` and `b` when `choice` is set, with the same operations either way.
    pub fn conditional_swap(a: &mut Self, b: &mut Self, choice: Choice) {
        let mask = Self::from_u64(u64::from(choice.unwrap_u8()), a.field);
        let t = a.sub(b).mul(&mask);
        *a = a.sub(&t);
        *b = b.add(&t);
    }

    /// Fixed-width little-endian encoding of `byte_len` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = vec![0u8; self.field.byte_len];
        let digits = self.value.to_digits::<u8>(Order::Lsf);
        result[..digits.len()].copy_from_slice(&digits);
        result
    }

    /// Decode a fixed-width little-endian encoding, rejecting values ≥ p.
    pub fn from_bytes(bytes: &[u8], field: &'static PrimeField) -> Result<Self> {
        if bytes.len() != field.byte_len {
            return Err(SidhError::InvalidLength {
                context: "Fp element",
                expected: field.byte_len,
                actual: bytes.len(),
            });
        }
        let value = Integer::from_digits(bytes, Order::Lsf);
        if value >= field.p {
            return Err(SidhError::OutOfRange {
                context: "Fp element",
                reason: "encoded value is not below the modulus".to_string(),
            });
        }
        Ok(Self { value, field })
    }

    /// Uniformly random element
    pub fn random<R: RandomSource + ?Sized>(rng: &mut R, field: &'static PrimeField) -> Result<Self> {
        let value = crate::random::sample_below(rng, &field.p)?;
        Ok(Self { value, field })
    }
}

impl ConstantTimeEq for Fp {
    fn ct_eq(&self, other: &Self) -> Choice {
        Fp::ct_eq(self, other)
    }
}

impl PartialEq for Fp {
    fn eq(&self, other: &Self) -> bool {
        Fp::ct_eq(self, other).into()
    }
}

impl Eq for Fp {}

// Operators on references; by-value impls would shadow the inherent methods.
impl<'a> Add<&'a Fp> for &'a Fp {
    type Output = Fp;

    fn add(self, other: &'a Fp) -> Fp {
        Fp::add(self, other)
    }
}

impl<'a> Sub<&'a Fp> for &'a Fp {
    type Output = Fp;

    fn sub(self, other: &'a Fp) -> Fp {
        Fp::sub(self, other)
    }
}

impl<'a> Mul<&'a Fp> for &'a Fp {
    type Output = Fp;

    fn mul(self, other: &'a Fp) -> Fp {
        Fp::mul(self, other)
    }
}

impl Neg for &Fp {
    type Output = Fp;

    fn neg(self) -> Fp {
        Fp::neg(self)
    }
}

impl Zeroize for Fp {
    fn zeroize(&mut self) {
        self.value.assign(0);
    }
}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fp({})", self.value)
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
