// src/curves/isogeny_chain.rs
//! Isogeny engine: composes a 2^e or 3^e degree isogeny from small steps.
//!
//! Given a curve, a kernel generator of order ℓ^e and a list of auxiliary
//! points, the engine returns the codomain and the images of the auxiliary
//! points. The 2-power walk takes 4-isogeny steps, preceded by a single
//! 2-isogeny when e is odd; the 3-power walk takes 3-isogeny steps. The order
//! in which intermediate multiples of the kernel are computed and pushed is
//! dictated by a [`Strategy`], which affects cost only.
//!
//! The kernel generator is trusted to have the stated order. For the 2-power
//! walk, [2^(e−1)]R must also differ from (0, 0). Both are guaranteed by how
//! torsion bases and kernels are built elsewhere in the crate.

use crate::curves::elliptic_curve::{x_dbl, x_dbl_e, x_tpl, ProjectiveCurve, ProjectivePoint};
use crate::curves::isogeny::{FourIsogeny, Isogeny, ThreeIsogeny, TwoIsogeny};
use crate::curves::strategy::Strategy;
use crate::arithmetic::Fp2;
use crate::errors::{Result, SidhError};
use log::trace;

/// Which prime-power degree the engine walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsogenyDegree {
    /// 2^e, walked in 4-isogeny steps
    Two,
    /// 3^e, walked in 3-isogeny steps
    Three,
}

impl IsogenyDegree {
    /// Number of strategy leaves for exponent e
    pub fn steps(self, exponent: u32) -> usize {
        match self {
            IsogenyDegree::Two => (exponent / 2) as usize,
            IsogenyDegree::Three => exponent as usize,
        }
    }

    pub fn prime(self) -> u32 {
        match self {
            IsogenyDegree::Two => 2,
            IsogenyDegree::Three => 3,
        }
    }
}

/// Operation counts of a single walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Point multiplications by the step degree (4 or 3), plus single
    /// doublings for the leading 2-isogeny of an odd 2-power walk
    pub multiplications: usize,
    /// Small isogenies computed
    pub isogenies: usize,
    /// Points pushed through small isogenies
    pub evaluations: usize,
}

/// Codomain and images produced by a walk
#[derive(Debug, Clone)]
pub struct IsogenyImage {
    pub curve: ProjectiveCurve,
    pub points: Vec<ProjectivePoint>,
    pub stats: WalkStats,
}

/// Curve constants carried through a walk, in the form its multiplication
/// routine consumes.
trait WalkCurve: Sized {
    type Step: Isogeny;

    fn multiply(&self, point: &ProjectivePoint) -> ProjectivePoint;

    /// Isogeny with the given kernel and the constants of its codomain
    fn step(&self, kernel: &ProjectivePoint) -> (Self::Step, Self);

    fn into_curve(self) -> ProjectiveCurve;
}

/// (A + 2C : 4C), stepping by 4-isogenies
struct FourWalk {
    a24_plus: Fp2,
    c24: Fp2,
}

impl WalkCurve for FourWalk {
    type Step = FourIsogeny;

    fn multiply(&self, point: &ProjectivePoint) -> ProjectivePoint {
        x_dbl_e(point, &self.a24_plus, &self.c24, 2)
    }

    fn step(&self, kernel: &ProjectivePoint) -> (FourIsogeny, Self) {
        let phi = FourIsogeny::new(kernel);
        let (a24_plus, c24) = phi.codomain_constants();
        let next = FourWalk {
            a24_plus: a24_plus.clone(),
            c24: c24.clone(),
        };
        (phi, next)
    }

    fn into_curve(self) -> ProjectiveCurve {
        ProjectiveCurve::from_doubling_constants(&self.a24_plus, &self.c24)
    }
}

/// (A − 2C : A + 2C), stepping by 3-isogenies
struct ThreeWalk {
    a24_minus: Fp2,
    a24_plus: Fp2,
}

impl WalkCurve for ThreeWalk {
    type Step = ThreeIsogeny;

    fn multiply(&self, point: &ProjectivePoint) -> ProjectivePoint {
        x_tpl(point, &self.a24_minus, &self.a24_plus)
    }

    fn step(&self, kernel: &ProjectivePoint) -> (ThreeIsogeny, Self) {
        let phi = ThreeIsogeny::new(kernel);
        let (a24_minus, a24_plus) = phi.codomain_constants();
        let next = ThreeWalk {
            a24_minus: a24_minus.clone(),
            a24_plus: a24_plus.clone(),
        };
        (phi, next)
    }

    fn into_curve(self) -> ProjectiveCurve {
        ProjectiveCurve::from_tripling_constants(&self.a24_minus, &self.a24_plus)
    }
}

/// Composes ℓ^e isogenies with a fixed traversal strategy
#[derive(Debug, Clone)]
pub struct IsogenyEngine {
    degree: IsogenyDegree,
    exponent: u32,
    strategy: Strategy,
}

impl IsogenyEngine {
    /// Fails when the strategy does not have one leaf per walk step.
    pub fn new(degree: IsogenyDegree, exponent: u32, strategy: Strategy) -> Result<Self> {
        let steps = degree.steps(exponent);
        if strategy.leaves() != steps {
            return Err(SidhError::InvalidConfiguration {
                parameter: "strategy".to_string(),
                reason: format!(
                    "{}^{} walk takes {} steps but the strategy has {} leaves",
                    degree.prime(),
                    exponent,
                    steps,
                    strategy.leaves()
                ),
            });
        }
        Ok(Self {
            degree,
            exponent,
            strategy,
        })
    }

    pub fn degree(&self) -> IsogenyDegree {
        self.degree
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Walk from `curve` along the isogeny with kernel ⟨kernel⟩ and push `points`.
    pub fn evaluate(
        &self,
        curve: &ProjectiveCurve,
        kernel: &ProjectivePoint,
        points: &[ProjectivePoint],
    ) -> IsogenyImage {
        if self.exponent == 0 {
            return IsogenyImage {
                curve: curve.clone(),
                points: points.to_vec(),
                stats: WalkStats::default(),
            };
        }

        let mut stats = WalkStats::default();
        let mut kernel = kernel.clone();
        let mut points = points.to_vec();

        let result = match self.degree {
            IsogenyDegree::Two => {
                let (mut a24_plus, mut c24) = curve.doubling_constants();
                if self.exponent % 2 == 1 {
                    let order_two = x_dbl_e(&kernel, &a24_plus, &c24, (self.exponent - 1) as usize);
                    stats.multiplications += (self.exponent - 1) as usize;
                    let phi = TwoIsogeny::new(&order_two);
                    kernel = phi.evaluate(&kernel);
                    for point in points.iter_mut() {
                        *point = phi.evaluate(point);
                    }
                    stats.isogenies += 1;
                    stats.evaluations += points.len() + 1;
                    let (a, c) = phi.codomain_constants();
                    a24_plus = a.clone();
                    c24 = c.clone();
                }
                let start = FourWalk { a24_plus, c24 };
                walk(start, kernel, &self.strategy, points, &mut stats)
            }
            IsogenyDegree::Three => {
                let (a24_minus, a24_plus) = curve.tripling_constants();
                let start = ThreeWalk {
                    a24_minus,
                    a24_plus,
                };
                walk(start, kernel, &self.strategy, points, &mut stats)
            }
        };

        trace!(
            "{}^{} walk: {} multiplications, {} isogenies, {} evaluations",
            self.degree.prime(),
            self.exponent,
            stats.multiplications,
            stats.isogenies,
            stats.evaluations
        );

        IsogenyImage {
            curve: result.0,
            points: result.1,
            stats,
        }
    }
}

/// Strategy-driven traversal.
///
/// Each pending entry pairs a point with the number of multiplications
/// already applied to it; the entry on top is the next kernel once the
/// current isogeny has been taken.
fn walk<C: WalkCurve>(
    mut curve: C,
    mut kernel: ProjectivePoint,
    strategy: &Strategy,
    mut points: Vec<ProjectivePoint>,
    stats: &mut WalkStats,
) -> (ProjectiveCurve, Vec<ProjectivePoint>) {
    let leaves = strategy.leaves();
    let splits = strategy.splits();
    let mut pending: Vec<(ProjectivePoint, usize)> = Vec::with_capacity(leaves);
    let mut level = 0usize;
    let mut cursor = 0usize;

    for row in 1..leaves {
        while level < leaves - row {
            pending.push((kernel.clone(), level));
            let m = splits[cursor];
            cursor += 1;
            for _ in 0..m {
                kernel = curve.multiply(&kernel);
            }
            stats.multiplications += m;
            level += m;
        }

        let (phi, next) = curve.step(&kernel);
        curve = next;
        stats.isogenies += 1;
        for (point, _) in pending.iter_mut() {
            *point = phi.evaluate(point);
        }
        for point in points.iter_mut() {
            *point = phi.evaluate(point);
        }
        stats.evaluations += pending.len() + points.len();

        match pending.pop() {
            Some((point, depth)) => {
                kernel = point;
                level = depth;
            }
            None => {
                debug_assert!(false, "strategy exhausted its pending points");
                break;
            }
        }
    }

    if leaves >= 1 {
        let (phi, next) = curve.step(&kernel);
        curve = next;
        stats.isogenies += 1;
        for point in points.iter_mut() {
            *point = phi.evaluate(point);
        }
        stats.evaluations += points.len();
    }

    (curve.into_curve(), points)
}

/// [ℓ^k]P on a curve given as (A : C), for callers outside a walk
pub fn multiply_by_prime_power(
    curve: &ProjectiveCurve,
    point: &ProjectivePoint,
    degree: IsogenyDegree,
    k: u32,
) -> ProjectivePoint {
    match degree {
        IsogenyDegree::Two => {
            let (a24_plus, c24) = curve.doubling_constants();
            let mut q = point.clone();
            for _ in 0..k {
                q = x_dbl(&q, &a24_plus, &c24);
            }
            q
        }
        IsogenyDegree::Three => {
            let (a24_minus, a24_plus) = curve.tripling_constants();
            let mut q = point.clone();
            for _ in 0..k {
                q = x_tpl(&q, &a24_minus, &a24_plus);
            }
            q
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::strategy::CostModel;
    use crate::params::{config_for, Role};
    use rug::Integer;

    fn engines(degree: IsogenyDegree, exponent: u32) -> Vec<IsogenyEngine> {
        let leaves = degree.steps(exponent);
        [
            Strategy::optimal(leaves, CostModel::new(3, 2)),
            Strategy::balanced(leaves),
            Strategy::multiplication_only(leaves),
        ]
        .into_iter()
        .map(|s| IsogenyEngine::new(degree, exponent, s).unwrap())
        .collect()
    }

    #[test]
    fn test_strategy_mismatch_rejected() {
        let result = IsogenyEngine::new(IsogenyDegree::Two, 8, Strategy::balanced(3));
        assert!(matches!(result, Err(SidhError::InvalidConfiguration { .. })));
        assert!(IsogenyEngine::new(IsogenyDegree::Two, 9, Strategy::balanced(4)).is_ok());
        assert!(IsogenyEngine::new(IsogenyDegree::Three, 5, Strategy::balanced(5)).is_ok());
    }

    #[test]
    fn test_identity_walk() {
        let params = config_for("toy-p62207").unwrap();
        let curve = params.base_curve().to_projective();
        let points = params.basis(Role::Bob).points();
        let kernel = params.basis(Role::Alice).points()[0].clone();

        for degree in [IsogenyDegree::Two, IsogenyDegree::Three] {
            let engine = IsogenyEngine::new(degree, 0, Strategy::balanced(0)).unwrap();
            let image = engine.evaluate(&curve, &kernel, &points);
            assert!(image.curve.equivalent(&curve));
            assert_eq!(image.points.len(), points.len());
            for (before, after) in points.iter().zip(&image.points) {
                assert!(before.equivalent(after));
            }
            assert_eq!(image.stats, WalkStats::default());
        }
    }

    #[test]
    fn test_kernel_maps_to_infinity() {
        for name in ["toy-p62207", "toy-p2591"] {
            let params = config_for(name).unwrap();
            let curve = params.base_curve().to_projective();
            for role in [Role::Alice, Role::Bob] {
                let kernel = params.kernel_point(role, &Integer::from(5));
                let other = params.kernel_point(role.peer(), &Integer::from(1));
                let image = params
                    .engine(role)
                    .evaluate(&curve, &kernel, &[kernel.clone(), params.basis(role).points()[1].clone(), other]);
                assert!(image.points[0].is_infinity(), "{} {:?}", name, role);
                assert!(!image.points[1].is_infinity(), "{} {:?}", name, role);
                assert!(!image.points[2].is_infinity(), "{} {:?}", name, role);
            }
        }
    }

    #[test]
    fn test_strategy_independence() {
        for name in ["toy-p62207", "toy-p2591", "toy-p17915903"] {
            let params = config_for(name).unwrap();
            let curve = params.base_curve().to_projective();
            for role in [Role::Alice, Role::Bob] {
                let kernel = params.kernel_point(role, &Integer::from(11));
                let aux = params.basis(role.peer()).points();
                let images: Vec<IsogenyImage> = engines(role.degree(), params.exponent(role))
                    .iter()
                    .map(|engine| engine.evaluate(&curve, &kernel, &aux))
                    .collect();

                for image in &images[1..] {
                    assert!(image.curve.equivalent(&images[0].curve));
                    assert_eq!(
                        image.curve.j_invariant().unwrap(),
                        images[0].curve.j_invariant().unwrap()
                    );
                    for (a, b) in image.points.iter().zip(&images[0].points) {
                        assert!(a.equivalent(b));
                    }
                }
            }
        }
    }

    #[test]
    fn test_stats_follow_strategy() {
        let params = config_for("toy-p17915903").unwrap();
        let curve = params.base_curve().to_projective();
        let kernel = params.kernel_point(Role::Bob, &Integer::from(2));
        let aux = params.basis(Role::Alice).points();
        let cost = CostModel::new(3, 2);

        let cheap = IsogenyEngine::new(IsogenyDegree::Three, 7, Strategy::optimal(7, cost)).unwrap();
        let naive = IsogenyEngine::new(IsogenyDegree::Three, 7, Strategy::multiplication_only(7)).unwrap();
        let cheap_stats = cheap.evaluate(&curve, &kernel, &aux).stats;
        let naive_stats = naive.evaluate(&curve, &kernel, &aux).stats;

        assert_eq!(cheap_stats.isogenies, 7);
        assert_eq!(naive_stats.isogenies, 7);
        assert_eq!(naive_stats.multiplications, 21);
        assert_eq!(
            cheap_stats.multiplications,
            cheap.strategy().splits().iter().sum::<usize>()
        );
        assert!(cheap_stats.multiplications < naive_stats.multiplications);
    }

    #[test]
    fn test_multiply_by_prime_power() {
        let params = config_for("toy-p62207").unwrap();
        let curve = params.base_curve().to_projective();
        let p = params.basis(Role::Bob).points()[0].clone();
        let tripled = multiply_by_prime_power(&curve, &p, IsogenyDegree::Three, 5);
        assert!(tripled.is_infinity());
        let almost = multiply_by_prime_power(&curve, &p, IsogenyDegree::Three, 4);
        assert!(!almost.is_infinity());

        let q = params.basis(Role::Alice).points()[1].clone();
        let half = multiply_by_prime_power(&curve, &q, IsogenyDegree::Two, 7);
        assert!(half.x().is_zero());
        assert!(multiply_by_prime_power(&curve, &q, IsogenyDegree::Two, 8).is_infinity());
    }
}
