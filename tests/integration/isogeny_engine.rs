// tests/integration/isogeny_engine.rs
//! The isogeny engine through parameter sets and alternative strategies.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use rug::Integer;
use sidh::curves::{CostModel, IsogenyDegree, IsogenyEngine, Strategy, WalkStats};
use sidh::{config_for, KeyGenerator, Role, Sidh};

#[test]
fn test_public_keys_independent_of_strategy() {
    let params = config_for("toy-p46").unwrap();
    let n_alice = params.engine(Role::Alice).strategy().leaves();
    let n_bob = params.engine(Role::Bob).strategy().leaves();
    let alternatives = [
        params
            .with_strategies(Strategy::balanced(n_alice), Strategy::balanced(n_bob))
            .unwrap(),
        params
            .with_strategies(
                Strategy::multiplication_only(n_alice),
                Strategy::multiplication_only(n_bob),
            )
            .unwrap(),
    ];

    for role in [Role::Alice, Role::Bob] {
        let m = Integer::from(123_456);
        let kernel = params.kernel_point(role, &m);
        let aux = params.basis(role.peer()).points();
        let curve = params.base_curve().to_projective();
        let reference = params.engine(role).evaluate(&curve, &kernel, &aux);

        for alternative in &alternatives {
            let image = alternative.engine(role).evaluate(&curve, &kernel, &aux);
            assert!(image.curve.equivalent(&reference.curve));
            for (a, b) in image.points.iter().zip(&reference.points) {
                assert!(a.equivalent(b));
            }
            assert_eq!(image.stats.isogenies, reference.stats.isogenies);
        }
    }
}

#[test]
fn test_optimal_strategy_is_cheapest_in_practice() {
    let params = config_for("SIDHp434").unwrap();
    let curve = params.base_curve().to_projective();
    let kernel = params.kernel_point(Role::Bob, &Integer::from(987_654_321u64));
    let aux = params.basis(Role::Alice).points();

    let optimal = params.engine(Role::Bob).evaluate(&curve, &kernel, &aux);
    let balanced = IsogenyEngine::new(IsogenyDegree::Three, 137, Strategy::balanced(137))
        .unwrap()
        .evaluate(&curve, &kernel, &aux);
    assert!(optimal.curve.equivalent(&balanced.curve));
    assert_eq!(optimal.stats.isogenies, 137);
    assert!(optimal.stats.multiplications + optimal.stats.evaluations > 0);
    assert_ne!(optimal.stats, balanced.stats);
}

#[test]
fn test_zero_exponent_is_identity() {
    let params = config_for("toy-p2591").unwrap();
    let curve = params.base_curve().to_projective();
    let points = params.basis(Role::Alice).points();
    let engine = IsogenyEngine::new(IsogenyDegree::Three, 0, Strategy::optimal(0, CostModel::new(1, 1))).unwrap();
    let image = engine.evaluate(&curve, &points[0], &points);
    assert!(image.curve.equivalent(&curve));
    assert_eq!(image.stats, WalkStats::default());
    for (before, after) in points.iter().zip(&image.points) {
        assert!(before.equivalent(after));
    }
}

#[test]
fn test_exchange_with_alternative_strategies() {
    let params = config_for("toy-p17915903").unwrap();
    let swapped = params
        .with_strategies(Strategy::multiplication_only(6), Strategy::balanced(7))
        .unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(77);

    let (alice_private, alice_public) = KeyGenerator::new(params).generate(Role::Alice, &mut rng).unwrap();
    let (bob_private, bob_public) = KeyGenerator::new(&swapped).generate(Role::Bob, &mut rng).unwrap();

    let alice_secret = Sidh::new(params)
        .derive_shared_secret(&alice_private, &bob_public)
        .unwrap();
    let bob_secret = Sidh::new(&swapped)
        .derive_shared_secret(&bob_private, &alice_public)
        .unwrap();
    assert_eq!(alice_secret, bob_secret);
}
