// tests/integration/key_exchange.rs
//! Full exchanges between two parties on several parameter sets.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use rug::Integer;
use sidh::{
    config_for, KeyGenerator, OsRandom, ParameterSet, PrivateKey, PublicKey, Role, SharedSecret,
    Sidh, SidhError,
};

/// Test fixture holding one parameter set and a seeded generator
struct ExchangeFixture {
    params: &'static ParameterSet,
    generator: KeyGenerator<'static>,
    sidh: Sidh<'static>,
    rng: ChaCha20Rng,
}

impl ExchangeFixture {
    fn new(name: &str, seed: u64) -> Self {
        let params = config_for(name).expect("built-in parameter set");
        Self {
            params,
            generator: KeyGenerator::new(params),
            sidh: Sidh::new(params),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    fn key_pair(&mut self, role: Role) -> (PrivateKey<'static>, PublicKey<'static>) {
        self.generator
            .generate(role, &mut self.rng)
            .expect("key generation with a working random source")
    }

    fn key_pair_from_scalar(&self, role: Role, m: u64) -> (PrivateKey<'static>, PublicKey<'static>) {
        let private = PrivateKey::from_scalar(
            self.params,
            role,
            Integer::from(m),
            vec![0x5a; self.params.message_bytes()],
        )
        .expect("scalar in range");
        let public = self.generator.public_key(&private).expect("public key");
        (private, public)
    }

    fn key_pair_from_integer(&self, role: Role, m: Integer) -> (PrivateKey<'static>, PublicKey<'static>) {
        let private = PrivateKey::from_scalar(self.params, role, m, vec![0xa5; self.params.message_bytes()])
            .expect("scalar in range");
        let public = self.generator.public_key(&private).expect("public key");
        (private, public)
    }

    fn exchange(
        &self,
        alice: &(PrivateKey<'_>, PublicKey<'_>),
        bob: &(PrivateKey<'_>, PublicKey<'_>),
    ) -> (SharedSecret, SharedSecret) {
        let alice_secret = self
            .sidh
            .derive_shared_secret(&alice.0, &bob.1)
            .expect("Alice derives");
        let bob_secret = self
            .sidh
            .derive_shared_secret(&bob.0, &alice.1)
            .expect("Bob derives");
        (alice_secret, bob_secret)
    }
}

#[test]
fn test_commutative_square_on_toy_sets() {
    for (index, name) in ["toy-p431", "toy-p2591", "toy-p62207", "toy-p17915903", "toy-p46"]
        .iter()
        .enumerate()
    {
        let mut fixture = ExchangeFixture::new(name, index as u64);
        for _ in 0..4 {
            let alice = fixture.key_pair(Role::Alice);
            let bob = fixture.key_pair(Role::Bob);
            let (a, b) = fixture.exchange(&alice, &bob);
            assert_eq!(a, b, "shared secrets differ on {}", name);
        }
    }
}

#[test]
fn test_commutative_square_on_p434() {
    let mut fixture = ExchangeFixture::new("SIDHp434", 434);
    let alice = fixture.key_pair(Role::Alice);
    let bob = fixture.key_pair(Role::Bob);
    let (a, b) = fixture.exchange(&alice, &bob);
    assert_eq!(a, b);
    assert_eq!(a.to_bytes().len(), 110);
}

#[test]
fn test_edge_scalars_on_p434() {
    let fixture = ExchangeFixture::new("SIDHp434", 0);
    for (m_alice, m_bob) in [(0, 0), (1, 1), (0, 1), (1, 0)] {
        let alice = fixture.key_pair_from_scalar(Role::Alice, m_alice);
        let bob = fixture.key_pair_from_scalar(Role::Bob, m_bob);
        let (a, b) = fixture.exchange(&alice, &bob);
        assert_eq!(a, b, "m_alice = {}, m_bob = {}", m_alice, m_bob);
    }
}

#[test]
fn test_third_party_does_not_share_the_secret() {
    let mut fixture = ExchangeFixture::new("toy-p46", 99);
    let alice = fixture.key_pair(Role::Alice);
    let bob = fixture.key_pair(Role::Bob);
    let carol = fixture.key_pair(Role::Bob);
    let (alice_with_bob, _) = fixture.exchange(&alice, &bob);
    let (alice_with_carol, _) = fixture.exchange(&alice, &carol);
    assert_ne!(alice_with_bob, alice_with_carol);
}

#[test]
fn test_os_random_generation() {
    let params = config_for("toy-p62207").unwrap();
    let generator = KeyGenerator::new(params);
    let (alice_private, alice_public) = generator.generate(Role::Alice, &mut OsRandom).unwrap();
    let (bob_private, bob_public) = generator.generate(Role::Bob, &mut OsRandom).unwrap();
    assert_eq!(alice_private.random_string().len(), params.message_bytes());

    let sidh = Sidh::new(params);
    assert_eq!(
        sidh.derive_shared_secret(&alice_private, &bob_public).unwrap(),
        sidh.derive_shared_secret(&bob_private, &alice_public).unwrap()
    );
}

#[test]
fn test_mismatched_roles_are_rejected() {
    let mut fixture = ExchangeFixture::new("toy-p2591", 7);
    let (bob_private, bob_public) = fixture.key_pair(Role::Bob);
    let err = fixture
        .sidh
        .derive_shared_secret(&bob_private, &bob_public)
        .unwrap_err();
    assert!(matches!(err, SidhError::KeyMismatch { .. }));
}

#[test]
fn test_commutative_square_on_p610() {
    let mut fixture = ExchangeFixture::new("SIDHp610", 610);
    assert_eq!(fixture.params.exponent(Role::Alice) % 2, 1);
    let alice = fixture.key_pair(Role::Alice);
    let bob = fixture.key_pair(Role::Bob);
    let (a, b) = fixture.exchange(&alice, &bob);
    assert_eq!(a, b);
    assert_eq!(a.to_bytes().len(), 2 * fixture.params.fp_bytes());
}

#[test]
fn test_extreme_scalars_on_p610() {
    let fixture = ExchangeFixture::new("SIDHp610", 0);
    let params = fixture.params;
    let largest = |role: Role| Integer::from(params.order(role) - 1u32);
    let cases = [
        (Integer::new(), Integer::new()),
        (largest(Role::Alice), largest(Role::Bob)),
        (Integer::new(), largest(Role::Bob)),
        (largest(Role::Alice), Integer::new()),
    ];
    for (m_alice, m_bob) in cases {
        let alice = fixture.key_pair_from_integer(Role::Alice, m_alice);
        let bob = fixture.key_pair_from_integer(Role::Bob, m_bob);
        let (a, b) = fixture.exchange(&alice, &bob);
        assert_eq!(a, b);
    }
}
