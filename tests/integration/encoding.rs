// tests/integration/encoding.rs
//! Fixed-width encodings of keys and secrets.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use sidh::{config_for, ErrorClass, KeyGenerator, PrivateKey, PublicKey, Role, SharedSecret, Sidh, SidhError};

#[test]
fn test_encoded_lengths() {
    for (name, n, message) in [("SIDHp434", 55, 16), ("toy-p62207", 2, 16), ("toy-p46", 6, 16)] {
        let params = config_for(name).unwrap();
        assert_eq!(params.fp_bytes(), n);
        assert_eq!(PublicKey::encoded_len(params), 8 * n);
        assert_eq!(PrivateKey::encoded_len(params), n + message);
    }
}

#[test]
fn test_round_trip_keys_still_agree() {
    for name in ["toy-p17915903", "SIDHp434"] {
        let params = config_for(name).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(2024);
        let generator = KeyGenerator::new(params);
        let (alice_private, alice_public) = generator.generate(Role::Alice, &mut rng).unwrap();
        let (bob_private, bob_public) = generator.generate(Role::Bob, &mut rng).unwrap();

        let alice_private = PrivateKey::from_bytes(params, Role::Alice, &alice_private.to_bytes()).unwrap();
        let bob_public_bytes = bob_public.to_bytes();
        let decoded_bob_public = PublicKey::from_bytes(params, Role::Bob, &bob_public_bytes).unwrap();
        assert_eq!(decoded_bob_public, bob_public);
        assert_eq!(decoded_bob_public.to_bytes(), bob_public_bytes);
        let alice_public = PublicKey::from_bytes(params, Role::Alice, &alice_public.to_bytes()).unwrap();

        let sidh = Sidh::new(params);
        let alice_secret = sidh.derive_shared_secret(&alice_private, &decoded_bob_public).unwrap();
        let bob_secret = sidh.derive_shared_secret(&bob_private, &alice_public).unwrap();
        assert_eq!(alice_secret, bob_secret);

        let restored = SharedSecret::from_bytes(&alice_secret.to_bytes(), params.field()).unwrap();
        assert_eq!(restored, bob_secret);
    }
}

#[test]
fn test_tampered_public_key_is_rejected() {
    let params = config_for("toy-p46").unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let (_, public) = KeyGenerator::new(params).generate(Role::Bob, &mut rng).unwrap();
    let bytes = public.to_bytes();
    let n = params.fp_bytes();

    // flip a bit in the curve coefficient and in each point
    for offset in [0, 2 * n, 4 * n, 6 * n] {
        let mut tampered = bytes.clone();
        tampered[offset] ^= 1;
        let err = PublicKey::from_bytes(params, Role::Bob, &tampered).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Format, "offset {}", offset);
    }
}

#[test]
fn test_out_of_range_coordinates_are_rejected() {
    let params = config_for("toy-p62207").unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(9);
    let (_, public) = KeyGenerator::new(params).generate(Role::Alice, &mut rng).unwrap();
    let mut bytes = public.to_bytes();
    // 0xffff = 65535 ≥ p = 62207
    bytes[2] = 0xff;
    bytes[3] = 0xff;
    assert!(matches!(
        PublicKey::from_bytes(params, Role::Alice, &bytes),
        Err(SidhError::OutOfRange { .. })
    ));
    assert!(matches!(
        PublicKey::from_bytes(params, Role::Alice, &bytes[..10]),
        Err(SidhError::InvalidLength { .. })
    ));
}

#[test]
fn test_private_key_from_scalar_bytes() {
    let params = config_for("toy-p62207").unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(10);
    let key = PrivateKey::from_scalar_bytes(params, Role::Bob, &[17, 0], &mut rng).unwrap();
    assert_eq!(*key.scalar(), 17);
    assert_eq!(key.algorithm(), "toy-p62207");

    let err = PrivateKey::from_scalar_bytes(params, Role::Bob, &[0xff, 0xff], &mut rng).unwrap_err();
    assert!(matches!(err, SidhError::OutOfRange { .. }));
}
