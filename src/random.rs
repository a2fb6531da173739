// src/random.rs
//! Random byte capability consumed by key generation.
//!
//! The engine never reaches for ambient randomness: callers hand a
//! [`RandomSource`] to the key generator. [`OsRandom`] draws from the operating
//! system, and every `rand_core` cryptographic generator is accepted as well,
//! which lets tests run against a seeded ChaCha stream.

use crate::errors::{Result, SidhError};
use rand_core::{CryptoRng, RngCore};
use rug::integer::Order;
use rug::{Assign, Integer};
use zeroize::Zeroizing;

/// Source of uniformly random bytes.
pub trait RandomSource {
    /// Fill `dest` entirely or fail with [`SidhError::RandomnessFailure`].
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// Operating-system entropy through `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        getrandom::getrandom(dest).map_err(|e| SidhError::RandomnessFailure {
            requested: dest.len(),
            reason: e.to_string(),
        })
    }
}

impl<R: RngCore + CryptoRng> RandomSource for R {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        self.try_fill_bytes(dest)
            .map_err(|e| SidhError::RandomnessFailure {
                requested: dest.len(),
                reason: e.to_string(),
            })
    }
}

/// Draw `len` random bytes.
pub fn random_bytes<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Sample an integer uniformly from `[0, bound)` by rejection.
///
/// Candidates are drawn with exactly as many bits as `bound - 1` has, so each
/// attempt succeeds with probability above one half and the accepted value is
/// unbiased.
pub fn sample_below<R: RandomSource + ?Sized>(rng: &mut R, bound: &Integer) -> Result<Integer> {
    if *bound <= 1 {
        return Ok(Integer::new());
    }
    let max = Integer::from(bound - 1u32);
    let bits = max.significant_bits() as usize;
    let len = (bits + 7) / 8;
    let top_mask = match bits % 8 {
        0 => 0xffu8,
        r => (1u8 << r) - 1,
    };

    // Wiped on every exit, rejected candidates and failed draws included
    let mut buffer = Zeroizing::new(vec![0u8; len]);
    loop {
        rng.fill_bytes(&mut buffer)?;
        buffer[len - 1] &= top_mask;
        let mut candidate = Integer::from_digits(&buffer, Order::Lsf);
        if candidate < *bound {
            return Ok(candidate);
        }
        candidate.assign(0);
    }
}
