// src/protocols/key_exchange.rs
//! SIDH key generation and shared-secret derivation.
//!
//! Key generation walks from the base curve along the isogeny whose kernel is
//! ⟨P + [m]Q⟩ for the role's own basis, pushing the peer's basis through it.
//! Derivation repeats the walk on the peer's image curve with the kernel
//! built from the peer's images of our basis. Both sides land on isomorphic
//! curves and agree on the j-invariant.

use crate::arithmetic::Fp2;
use crate::curves::elliptic_curve::{MontgomeryCurve, ProjectivePoint};
use crate::curves::isogeny_chain::IsogenyImage;
use crate::errors::{Result, ResultExt, SidhError};
use crate::params::{ParameterSet, Role};
use crate::protocols::keys::{PrivateKey, PublicKey, SharedSecret};
use crate::random::{random_bytes, sample_below, RandomSource};
use log::debug;

/// Produces key pairs for one parameter set
#[derive(Debug, Clone, Copy)]
pub struct KeyGenerator<'a> {
    params: &'a ParameterSet,
}

impl<'a> KeyGenerator<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &'a ParameterSet {
        self.params
    }

    /// Sample a private key for `role` and compute its public key.
    ///
    /// A failing random source aborts before any key is built.
    pub fn generate<R: RandomSource + ?Sized>(
        &self,
        role: Role,
        rng: &mut R,
    ) -> Result<(PrivateKey<'a>, PublicKey<'a>)> {
        let private = self
            .generate_private_key(role, rng)
            .log_on_error("key_exchange", "generate")?;
        let public = self.public_key(&private)?;
        Ok((private, public))
    }

    /// Scalar uniform in [0, ℓ^e) plus a fresh random string
    pub fn generate_private_key<R: RandomSource + ?Sized>(
        &self,
        role: Role,
        rng: &mut R,
    ) -> Result<PrivateKey<'a>> {
        let scalar = sample_below(rng, self.params.order(role))?;
        let random_string = random_bytes(rng, self.params.message_bytes())?;
        PrivateKey::from_scalar(self.params, role, scalar, random_string)
    }

    /// Image curve and images of the peer's basis under the private isogeny
    pub fn public_key(&self, private: &PrivateKey<'_>) -> Result<PublicKey<'a>> {
        check_parameter_set(self.params, private.params())?;
        let role = private.role();
        let params = self.params;

        let kernel = params.kernel_point(role, private.scalar());
        let image = params.engine(role).evaluate(
            &params.base_curve().to_projective(),
            &kernel,
            &params.basis(role.peer()).points(),
        );
        log_walk("public key", params, role, &image);

        let (curve, points) = normalize(&image).log_on_error("key_exchange", "public_key")?;
        Ok(PublicKey::from_parts(params, role, curve, points))
    }
}

/// Derives shared secrets for one parameter set
#[derive(Debug, Clone, Copy)]
pub struct Sidh<'a> {
    params: &'a ParameterSet,
}

impl<'a> Sidh<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        Self { params }
    }

    /// j-invariant of the curve reached by walking our private isogeny from
    /// the peer's public curve.
    ///
    /// Both keys must belong to this parameter set, and the peer key must
    /// have been produced for the other role.
    pub fn derive_shared_secret(
        &self,
        private: &PrivateKey<'_>,
        peer_public: &PublicKey<'_>,
    ) -> Result<SharedSecret> {
        check_parameter_set(self.params, private.params())?;
        check_parameter_set(self.params, peer_public.params())?;
        let role = private.role();
        if peer_public.role() != role.peer() {
            return Err(SidhError::KeyMismatch {
                reason: format!(
                    "{} private key needs a {} public key, got {}",
                    role,
                    role.peer(),
                    peer_public.role()
                ),
            })
            .log_on_error("key_exchange", "derive_shared_secret");
        }

        let curve = peer_public.curve();
        let [xp, xq, xpq] = peer_public.points();
        let kernel = curve.ladder_three_point(
            xp,
            xq,
            xpq,
            private.scalar(),
            self.params.scalar_bits(role),
        );
        let image = self
            .params
            .engine(role)
            .evaluate(&curve.to_projective(), &kernel, &[]);
        log_walk("shared secret", self.params, role, &image);

        let j_invariant = image
            .curve
            .j_invariant()
            .log_on_error("key_exchange", "derive_shared_secret")?;
        Ok(SharedSecret::new(j_invariant))
    }
}

fn check_parameter_set(expected: &ParameterSet, actual: &ParameterSet) -> Result<()> {
    if expected.name() == actual.name() {
        Ok(())
    } else {
        Err(SidhError::KeyMismatch {
            reason: format!(
                "key for {} used with parameter set {}",
                actual.name(),
                expected.name()
            ),
        })
    }
}

/// Affine curve coefficient and x-coordinates with one shared inversion
fn normalize(image: &IsogenyImage) -> Result<(MontgomeryCurve, [Fp2; 3])> {
    let denominators: Vec<Fp2> = std::iter::once(image.curve.c())
        .chain(image.points.iter().map(ProjectivePoint::z))
        .cloned()
        .collect();
    let inverses = Fp2::batch_invert(&denominators)?;

    let curve = MontgomeryCurve::new(image.curve.a().mul(&inverses[0]))?;
    let affine: Vec<Fp2> = image
        .points
        .iter()
        .zip(&inverses[1..])
        .map(|(point, z_inverse)| point.x().mul(z_inverse))
        .collect();
    let points: [Fp2; 3] = affine.try_into().map_err(|_| SidhError::Malformed {
        context: "public key",
        reason: "walk did not return three image points".to_string(),
    })?;
    Ok((curve, points))
}

fn log_walk(purpose: &str, params: &ParameterSet, role: Role, image: &IsogenyImage) {
    debug!(
        "{} {} for {}: {} isogenies, {} multiplications, {} evaluations",
        params.name(),
        purpose,
        role,
        image.stats.isogenies,
        image.stats.multiplications,
        image.stats.evaluations
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::config_for;
    use proptest::prelude::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use rug::Integer;

    struct FailingSource;

    impl RandomSource for FailingSource {
        fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
            Err(SidhError::RandomnessFailure {
                requested: dest.len(),
                reason: "entropy source closed".to_string(),
            })
        }
    }

    fn key_pair(params: &ParameterSet, role: Role, m: u64) -> (PrivateKey<'_>, PublicKey<'_>) {
        let private =
            PrivateKey::from_scalar(params, role, Integer::from(m), vec![0; params.message_bytes()]).unwrap();
        let public = KeyGenerator::new(params).public_key(&private).unwrap();
        (private, public)
    }

    fn agree(params: &ParameterSet, alice: &(PrivateKey, PublicKey), bob: &(PrivateKey, PublicKey)) {
        let sidh = Sidh::new(params);
        let alice_secret = sidh.derive_shared_secret(&alice.0, &bob.1).unwrap();
        let bob_secret = sidh.derive_shared_secret(&bob.0, &alice.1).unwrap();
        assert_eq!(alice_secret, bob_secret);
    }

    #[test]
    fn test_edge_scalars() {
        for name in ["toy-p431", "toy-p2591", "toy-p62207"] {
            let params = config_for(name).unwrap();
            for m_alice in [0u64, 1] {
                for m_bob in [0u64, 1] {
                    let alice = key_pair(params, Role::Alice, m_alice);
                    let bob = key_pair(params, Role::Bob, m_bob);
                    agree(params, &alice, &bob);
                }
            }
        }
    }

    #[test]
    fn test_largest_scalars() {
        let params = config_for("toy-p62207").unwrap();
        let alice = key_pair(params, Role::Alice, 255);
        let bob = key_pair(params, Role::Bob, 242);
        agree(params, &alice, &bob);
    }

    #[test]
    fn test_public_key_is_consistent() {
        let params = config_for("toy-p2591").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        let (_, public) = KeyGenerator::new(params).generate(Role::Bob, &mut rng).unwrap();
        let [xp, xq, xpq] = public.points();
        for x in public.points() {
            assert!(public.curve().is_on_curve_x(x));
        }
        assert_eq!(&MontgomeryCurve::recover(xp, xq, xpq).unwrap(), public.curve());
    }

    #[test]
    fn test_different_kernels_give_different_curves() {
        let params = config_for("toy-p17915903").unwrap();
        let (_, first) = key_pair(params, Role::Bob, 1);
        let (_, second) = key_pair(params, Role::Bob, 2);
        assert_ne!(
            first.curve().j_invariant().unwrap(),
            second.curve().j_invariant().unwrap()
        );
    }

    #[test]
    fn test_role_mismatch() {
        let params = config_for("toy-p62207").unwrap();
        let (alice_private, _) = key_pair(params, Role::Alice, 3);
        let (_, other_alice_public) = key_pair(params, Role::Alice, 4);
        let err = Sidh::new(params)
            .derive_shared_secret(&alice_private, &other_alice_public)
            .unwrap_err();
        assert!(matches!(err, SidhError::KeyMismatch { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_parameter_set_mismatch() {
        let small = config_for("toy-p431").unwrap();
        let large = config_for("toy-p62207").unwrap();
        let (alice_private, _) = key_pair(small, Role::Alice, 3);
        let (_, bob_public) = key_pair(large, Role::Bob, 4);
        let err = Sidh::new(large)
            .derive_shared_secret(&alice_private, &bob_public)
            .unwrap_err();
        assert!(matches!(err, SidhError::KeyMismatch { .. }));
        assert!(KeyGenerator::new(large).public_key(&alice_private).is_err());
    }

    #[test]
    fn test_randomness_failure_is_fatal() {
        let params = config_for("toy-p62207").unwrap();
        let err = KeyGenerator::new(params)
            .generate(Role::Alice, &mut FailingSource)
            .unwrap_err();
        assert!(matches!(err, SidhError::RandomnessFailure { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let params = config_for("toy-p62207").unwrap();
        let generator = KeyGenerator::new(params);
        let (a, a_public) = generator.generate(Role::Bob, &mut ChaCha20Rng::seed_from_u64(5)).unwrap();
        let (b, b_public) = generator.generate(Role::Bob, &mut ChaCha20Rng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.random_string(), b.random_string());
        assert_eq!(a_public, b_public);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_commutative_square(seed in any::<u64>()) {
            let params = config_for("toy-p17915903").unwrap();
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let generator = KeyGenerator::new(params);
            let alice = generator.generate(Role::Alice, &mut rng).unwrap();
            let bob = generator.generate(Role::Bob, &mut rng).unwrap();

            let sidh = Sidh::new(params);
            let alice_secret = sidh.derive_shared_secret(&alice.0, &bob.1).unwrap();
            let bob_secret = sidh.derive_shared_secret(&bob.0, &alice.1).unwrap();
            prop_assert_eq!(alice_secret, bob_secret);
        }
    }
}
