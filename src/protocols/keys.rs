// src/protocols/keys.rs
//! Private keys, public keys and shared secrets with their fixed-width encodings.
//!
//! Layouts (n = byte length of p, all little-endian):
//! - private key: scalar (n bytes) ‖ random string (message length)
//! - public key: A ‖ x(φ(P)) ‖ x(φ(Q)) ‖ x(φ(P − Q)), 2n bytes each
//! - shared secret: j-invariant, 2n bytes

use crate::arithmetic::{Fp2, PrimeField};
use crate::curves::elliptic_curve::MontgomeryCurve;
use crate::errors::{Result, SidhError};
use crate::params::{ParameterSet, Role};
use crate::random::{random_bytes, RandomSource};
use rug::integer::Order;
use rug::{Assign, Integer};
use std::fmt;
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// Private key: the scalar m selecting the kernel ⟨P + [m]Q⟩, and a random
/// string kept for a KEM layer.
pub struct PrivateKey<'a> {
    params: &'a ParameterSet,
    role: Role,
    scalar: Integer,
    random_string: Vec<u8>,
}

impl<'a> PrivateKey<'a> {
    /// Wrap a scalar, rejecting values outside [0, ℓ^e).
    pub fn from_scalar(
        params: &'a ParameterSet,
        role: Role,
        scalar: Integer,
        random_string: Vec<u8>,
    ) -> Result<Self> {
        if scalar.cmp0().is_lt() || scalar >= *params.order(role) {
            return Err(SidhError::OutOfRange {
                context: "private scalar",
                reason: format!(
                    "{}-bit scalar exceeds {}^{}",
                    scalar.significant_bits(),
                    role.degree().prime(),
                    params.exponent(role)
                ),
            });
        }
        if random_string.len() != params.message_bytes() {
            return Err(SidhError::InvalidLength {
                context: "private key random string",
                expected: params.message_bytes(),
                actual: random_string.len(),
            });
        }
        Ok(Self {
            params,
            role,
            scalar,
            random_string,
        })
    }

    /// Build a key from an encoded scalar alone, drawing a fresh random string.
    pub fn from_scalar_bytes<R: RandomSource + ?Sized>(
        params: &'a ParameterSet,
        role: Role,
        bytes: &[u8],
        rng: &mut R,
    ) -> Result<Self> {
        let scalar = decode_scalar(params, bytes)?;
        let random_string = random_bytes(rng, params.message_bytes())?;
        Self::from_scalar(params, role, scalar, random_string)
    }

    pub fn encoded_len(params: &ParameterSet) -> usize {
        params.fp_bytes() + params.message_bytes()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = encode_scalar(&self.scalar, self.params.fp_bytes());
        bytes.extend_from_slice(&self.random_string);
        bytes
    }

    pub fn from_bytes(params: &'a ParameterSet, role: Role, bytes: &[u8]) -> Result<Self> {
        let expected = Self::encoded_len(params);
        if bytes.len() != expected {
            return Err(SidhError::InvalidLength {
                context: "private key",
                expected,
                actual: bytes.len(),
            });
        }
        let (scalar_bytes, random_string) = bytes.split_at(params.fp_bytes());
        let scalar = decode_scalar(params, scalar_bytes)?;
        Self::from_scalar(params, role, scalar, random_string.to_vec())
    }

    /// Name of the parameter set the key belongs to
    pub fn algorithm(&self) -> &'static str {
        self.params.name()
    }

    pub fn params(&self) -> &'a ParameterSet {
        self.params
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn scalar(&self) -> &Integer {
        &self.scalar
    }

    pub fn random_string(&self) -> &[u8] {
        &self.random_string
    }
}

impl ConstantTimeEq for PrivateKey<'_> {
    /// Compares parameter set, role and scalar; the random string is not part
    /// of the key's identity.
    fn ct_eq(&self, other: &Self) -> Choice {
        let width = self.params.fp_bytes();
        let same_set = Choice::from((self.params.name() == other.params.name()) as u8);
        let same_role = Choice::from((self.role == other.role) as u8);
        let mut ours = encode_scalar(&self.scalar, width);
        let mut theirs = encode_scalar(&other.scalar, width);
        let same_scalar = ours.as_slice().ct_eq(theirs.as_slice());
        ours.zeroize();
        theirs.zeroize();
        same_set & same_role & same_scalar
    }
}

impl PartialEq for PrivateKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for PrivateKey<'_> {}

impl Zeroize for PrivateKey<'_> {
    fn zeroize(&mut self) {
        self.scalar.assign(0);
        self.random_string.zeroize();
    }
}

impl Drop for PrivateKey<'_> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for PrivateKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .field("role", &self.role)
            .field("scalar", &"<redacted>")
            .finish()
    }
}

/// Public key: the image curve and the images of the peer's basis P, Q, P − Q
#[derive(Clone)]
pub struct PublicKey<'a> {
    params: &'a ParameterSet,
    role: Role,
    curve: MontgomeryCurve,
    points: [Fp2; 3],
}

impl<'a> PublicKey<'a> {
    pub(crate) fn from_parts(
        params: &'a ParameterSet,
        role: Role,
        curve: MontgomeryCurve,
        points: [Fp2; 3],
    ) -> Self {
        Self {
            params,
            role,
            curve,
            points,
        }
    }

    pub fn encoded_len(params: &ParameterSet) -> usize {
        4 * Fp2::encoded_len(params.field())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::encoded_len(self.params));
        bytes.extend_from_slice(&self.curve.to_bytes());
        for x in &self.points {
            bytes.extend_from_slice(&x.to_bytes());
        }
        bytes
    }

    /// Decode and validate a public key.
    ///
    /// Every x-coordinate must lie on the transmitted curve, and the curve
    /// must be the one determined by the three x-coordinates.
    pub fn from_bytes(params: &'a ParameterSet, role: Role, bytes: &[u8]) -> Result<Self> {
        let expected = Self::encoded_len(params);
        if bytes.len() != expected {
            return Err(SidhError::InvalidLength {
                context: "public key",
                expected,
                actual: bytes.len(),
            });
        }
        let field = params.field();
        let width = Fp2::encoded_len(field);
        let mut chunks = bytes.chunks_exact(width);
        let mut next = || -> Result<Fp2> {
            let chunk = chunks.next().ok_or(SidhError::InvalidLength {
                context: "public key",
                expected,
                actual: bytes.len(),
            })?;
            Fp2::from_bytes(chunk, field)
        };

        let a = next()?;
        let points = [next()?, next()?, next()?];
        let curve = MontgomeryCurve::new(a)?;

        if points.iter().any(|x| !curve.is_on_curve_x(x)) {
            return Err(SidhError::Malformed {
                context: "public key",
                reason: "point is not on the curve".to_string(),
            });
        }
        let recovered = MontgomeryCurve::recover(&points[0], &points[1], &points[2]).map_err(|_| {
            SidhError::Malformed {
                context: "public key",
                reason: "points do not determine a curve".to_string(),
            }
        })?;
        if recovered != curve {
            return Err(SidhError::Malformed {
                context: "public key",
                reason: "curve does not match its points".to_string(),
            });
        }

        Ok(Self::from_parts(params, role, curve, points))
    }

    pub fn algorithm(&self) -> &'static str {
        self.params.name()
    }

    pub fn params(&self) -> &'a ParameterSet {
        self.params
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn curve(&self) -> &MontgomeryCurve {
        &self.curve
    }

    /// x(φ(P)), x(φ(Q)), x(φ(P − Q)) for the peer's basis
    pub fn points(&self) -> &[Fp2; 3] {
        &self.points
    }
}

impl PartialEq for PublicKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.params.name() == other.params.name()
            && self.role == other.role
            && self.curve == other.curve
            && self.points == other.points
    }
}

impl Eq for PublicKey<'_> {}

impl fmt::Debug for PublicKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm())
            .field("role", &self.role)
            .field("curve", &self.curve)
            .finish()
    }
}

/// Shared secret: j-invariant of the final curve
#[derive(Clone)]
pub struct SharedSecret {
    j_invariant: Fp2,
}

impl SharedSecret {
    pub fn new(j_invariant: Fp2) -> Self {
        Self { j_invariant }
    }

    pub fn j_invariant(&self) -> &Fp2 {
        &self.j_invariant
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.j_invariant.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8], field: &'static PrimeField) -> Result<Self> {
        Ok(Self::new(Fp2::from_bytes(bytes, field)?))
    }
}

impl ConstantTimeEq for SharedSecret {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.j_invariant.ct_eq(&other.j_invariant)
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SharedSecret {}

impl Zeroize for SharedSecret {
    fn zeroize(&mut self) {
        self.j_invariant.zeroize();
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

fn encode_scalar(scalar: &Integer, width: usize) -> Vec<u8> {
    let mut bytes = scalar.to_digits::<u8>(Order::Lsf);
    bytes.resize(width, 0);
    bytes
}

fn decode_scalar(params: &ParameterSet, bytes: &[u8]) -> Result<Integer> {
    if bytes.len() != params.fp_bytes() {
        return Err(SidhError::InvalidLength {
            context: "private scalar",
            expected: params.fp_bytes(),
            actual: bytes.len(),
        });
    }
    Ok(Integer::from_digits(bytes, Order::Lsf))
}
