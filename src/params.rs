// src/params.rs
//! Named SIDH parameter sets.
//!
//! A parameter set is built from a small [`ParameterDefinition`]: the prime
//! p = 2^eA · 3^eB · f − 1, the base curve coefficient and the cost models
//! used to schedule the isogeny walks. Everything else (field constants, both
//! torsion bases, both strategies) is derived once when the set is built.
//! [`config_for`] caches built sets for the lifetime of the process.

use crate::arithmetic::{Fp, Fp2, PrimeField};
use crate::curves::elliptic_curve::{MontgomeryCurve, ProjectivePoint};
use crate::curves::isogeny_chain::{IsogenyDegree, IsogenyEngine};
use crate::curves::isogeny_kernel::TorsionBasis;
use crate::curves::strategy::{CostModel, Strategy};
use crate::errors::{Result, ResultExt, SidhError};
use log::info;
use rug::Integer;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

/// Which side of the exchange a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Walks 2^eA isogenies
    Alice,
    /// Walks 3^eB isogenies
    Bob,
}

impl Role {
    pub fn peer(self) -> Role {
        match self {
            Role::Alice => Role::Bob,
            Role::Bob => Role::Alice,
        }
    }

    pub fn degree(self) -> IsogenyDegree {
        match self {
            Role::Alice => IsogenyDegree::Two,
            Role::Bob => IsogenyDegree::Three,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Alice => "Alice",
            Role::Bob => "Bob",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Static description of a parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Exponent of 2 in p + 1
    pub e_a: u32,
    /// Exponent of 3 in p + 1
    pub e_b: u32,
    /// Cofactor f, coprime to 6
    pub cofactor: u64,
    /// Montgomery coefficient of the base curve
    pub base_a: u64,
    /// Length of the random string kept in private keys
    pub message_bytes: usize,
    pub alice_cost: CostModel,
    pub bob_cost: CostModel,
}

// Cost of two doublings vs one 4-isogeny evaluation, and of a tripling vs one
// 3-isogeny evaluation, in field multiplications.
const ALICE_COST: CostModel = CostModel::new(8, 6);
const BOB_COST: CostModel = CostModel::new(7, 4);

const fn definition(
    name: &'static str,
    aliases: &'static [&'static str],
    e_a: u32,
    e_b: u32,
    message_bytes: usize,
) -> ParameterDefinition {
    ParameterDefinition {
        name,
        aliases,
        e_a,
        e_b,
        cofactor: 1,
        base_a: 6,
        message_bytes,
        alice_cost: ALICE_COST,
        bob_cost: BOB_COST,
    }
}

/// Built-in parameter sets. The `toy-*` sets are far too small to be secure
/// and exist for testing.
pub const DEFINITIONS: &[ParameterDefinition] = &[
    definition("SIDHp434", &["SIKEp434"], 216, 137, 16),
    definition("SIDHp503", &["SIKEp503"], 250, 159, 24),
    definition("SIDHp610", &["SIKEp610"], 305, 192, 24),
    definition("SIDHp751", &["SIKEp751"], 372, 239, 32),
    definition("toy-p431", &[], 4, 3, 16),
    definition("toy-p2591", &[], 5, 4, 16),
    definition("toy-p62207", &[], 8, 5, 16),
    definition("toy-p17915903", &[], 13, 7, 16),
    definition("toy-p46", &[], 22, 15, 16),
];

impl ParameterDefinition {
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }

    /// p = 2^eA · 3^eB · f − 1
    pub fn prime(&self) -> Integer {
        let power_of_two = Integer::from(Integer::u_pow_u(2, self.e_a));
        let power_of_three = Integer::from(Integer::u_pow_u(3, self.e_b));
        power_of_two * power_of_three * self.cofactor - 1u32
    }
}

/// Per-role data of a parameter set
#[derive(Debug, Clone)]
struct RoleParameters {
    exponent: u32,
    order: Integer,
    scalar_bits: u32,
    basis: TorsionBasis,
    engine: IsogenyEngine,
}

impl RoleParameters {
    fn new(role: Role, exponent: u32, basis: TorsionBasis, cost: CostModel) -> Result<Self> {
        let degree = role.degree();
        let order = Integer::from(Integer::u_pow_u(degree.prime(), exponent));
        let scalar_bits = Integer::from(&order - 1u32).significant_bits();
        let strategy = Strategy::optimal(degree.steps(exponent), cost);
        let engine = IsogenyEngine::new(degree, exponent, strategy)?;
        Ok(Self {
            exponent,
            order,
            scalar_bits,
            basis,
            engine,
        })
    }
}

/// Fully derived parameter set
#[derive(Debug, Clone)]
pub struct ParameterSet {
    name: &'static str,
    field: &'static PrimeField,
    base_curve: MontgomeryCurve,
    message_bytes: usize,
    alice: RoleParameters,
    bob: RoleParameters,
}

impl ParameterSet {
    /// Validate a definition and derive the field, bases and strategies.
    ///
    /// Field descriptors are shared process-wide, one per distinct prime, so
    /// rebuilding a set or failing halfway reuses the descriptor already held.
    pub fn new(definition: &ParameterDefinition) -> Result<Self> {
        let started = Instant::now();
        check_definition(definition)?;

        let prime = definition.prime();
        if !prime.is_congruent_u(3, 4) {
            return Err(invalid(definition, "p must be congruent to 3 mod 4"));
        }
        let field = field_for(prime)?;

        let base_curve = MontgomeryCurve::from_u64(definition.base_a, field)?;
        check_supersingular(&base_curve, &Integer::from(&field.p + 1u32))
            .map_err(|_| invalid(definition, "base curve is not supersingular"))?;

        let power_of_two = Integer::from(Integer::u_pow_u(2, definition.e_a));
        let power_of_three = Integer::from(Integer::u_pow_u(3, definition.e_b));
        let alice_cofactor = Integer::from(&power_of_three * definition.cofactor);
        let bob_cofactor = Integer::from(&power_of_two * definition.cofactor);

        let alice_basis = TorsionBasis::derive_two_power(&base_curve, definition.e_a, &alice_cofactor)?;
        let bob_basis = TorsionBasis::derive_three_power(&base_curve, definition.e_b, &bob_cofactor)?;

        let alice = RoleParameters::new(Role::Alice, definition.e_a, alice_basis, definition.alice_cost)?;
        let bob = RoleParameters::new(Role::Bob, definition.e_b, bob_basis, definition.bob_cost)?;

        info!(
            "Parameter set {} ready: {}-bit prime, eA = {}, eB = {}, built in {:?}",
            definition.name,
            field.bit_len,
            definition.e_a,
            definition.e_b,
            started.elapsed()
        );

        Ok(Self {
            name: definition.name,
            field,
            base_curve,
            message_bytes: definition.message_bytes,
            alice,
            bob,
        })
    }

    /// Same set walked with different strategies. Results are unchanged; only
    /// the cost of the walks differs.
    pub fn with_strategies(&self, alice: Strategy, bob: Strategy) -> Result<Self> {
        let mut set = self.clone();
        set.alice.engine = IsogenyEngine::new(IsogenyDegree::Two, self.alice.exponent, alice)?;
        set.bob.engine = IsogenyEngine::new(IsogenyDegree::Three, self.bob.exponent, bob)?;
        Ok(set)
    }

    fn role(&self, role: Role) -> &RoleParameters {
        match role {
            Role::Alice => &self.alice,
            Role::Bob => &self.bob,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field(&self) -> &'static PrimeField {
        self.field
    }

    pub fn message_bytes(&self) -> usize {
        self.message_bytes
    }

    pub fn base_curve(&self) -> &MontgomeryCurve {
        &self.base_curve
    }

    pub fn exponent(&self, role: Role) -> u32 {
        self.role(role).exponent
    }

    /// ℓ^e for the role: the private scalar lies in [0, order)
    pub fn order(&self, role: Role) -> &Integer {
        &self.role(role).order
    }

    /// Ladder length for private scalars of the role
    pub fn scalar_bits(&self, role: Role) -> u32 {
        self.role(role).scalar_bits
    }

    pub fn basis(&self, role: Role) -> &TorsionBasis {
        &self.role(role).basis
    }

    pub fn engine(&self, role: Role) -> &IsogenyEngine {
        &self.role(role).engine
    }

    /// P + [m]Q on the base curve for the role's own basis
    pub fn kernel_point(&self, role: Role, m: &Integer) -> ProjectivePoint {
        self.basis(role)
            .kernel(&self.base_curve, m, self.scalar_bits(role))
    }

    /// Width of one encoded Fp element
    pub fn fp_bytes(&self) -> usize {
        self.field.byte_len
    }
}

fn check_definition(definition: &ParameterDefinition) -> Result<()> {
    if definition.e_a < 2 {
        return Err(invalid(definition, "eA must be at least 2"));
    }
    if definition.e_b < 1 {
        return Err(invalid(definition, "eB must be at least 1"));
    }
    if definition.cofactor == 0 || definition.cofactor % 2 == 0 || definition.cofactor % 3 == 0 {
        return Err(invalid(definition, "cofactor must be positive and coprime to 6"));
    }
    if definition.message_bytes == 0 {
        return Err(invalid(definition, "message length must be positive"));
    }
    Ok(())
}

/// [p + 1]P = O for the first point x = c + i on the curve
fn check_supersingular(curve: &MontgomeryCurve, group_exponent: &Integer) -> Result<()> {
    let field = curve.field();
    let x = (1u64..=1000)
        .map(|c| Fp2::new(Fp::from_u64(c, field), Fp::one(field)))
        .find(|x| curve.is_on_curve_x(x))
        .ok_or_else(|| SidhError::Malformed {
            context: "base curve",
            reason: "no point found".to_string(),
        })?;
    let point = ProjectivePoint::from_affine(x);
    if curve
        .ladder(&point, group_exponent, group_exponent.significant_bits())
        .is_infinity()
    {
        Ok(())
    } else {
        Err(SidhError::Malformed {
            context: "base curve",
            reason: "point order does not divide p + 1".to_string(),
        })
    }
}

fn invalid(definition: &ParameterDefinition, reason: &str) -> SidhError {
    SidhError::InvalidConfiguration {
        parameter: definition.name.to_string(),
        reason: reason.to_string(),
    }
}

type Registry = Mutex<HashMap<&'static str, &'static ParameterSet>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

type FieldRegistry = Mutex<HashMap<Integer, &'static PrimeField>>;

/// Field descriptor for `prime`, built and leaked on first request only.
fn field_for(prime: Integer) -> Result<&'static PrimeField> {
    static FIELDS: OnceLock<FieldRegistry> = OnceLock::new();
    let fields = FIELDS.get_or_init(|| Mutex::new(HashMap::new()));

    if let Some(&field) = fields.lock().unwrap_or_else(PoisonError::into_inner).get(&prime) {
        return Ok(field);
    }
    let built = PrimeField::new(prime.clone())?;
    let mut fields = fields.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(*fields
        .entry(prime)
        .or_insert_with(|| &*Box::leak(Box::new(built))))
}

/// Look up a parameter set by name or alias, building it on first use.
///
/// The registry lock is not held while a set is being built, so lookups of
/// sets already cached never wait on a derivation. Two threads racing on the
/// same set both build it and the first one stored wins.
pub fn config_for(name: &str) -> Result<&'static ParameterSet> {
    let definition = DEFINITIONS
        .iter()
        .find(|definition| definition.matches(name))
        .ok_or_else(|| SidhError::UnknownParameterSet {
            name: name.to_string(),
        })
        .log_on_error("params", "config_for")?;

    if let Some(&set) = registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(definition.name)
    {
        return Ok(set);
    }
    let built = ParameterSet::new(definition).log_on_error("params", "config_for")?;
    let mut sets = registry().lock().unwrap_or_else(PoisonError::into_inner);
    Ok(*sets
        .entry(definition.name)
        .or_insert_with(|| &*Box::leak(Box::new(built))))
}
