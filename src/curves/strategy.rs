// src/curves/strategy.rs
//! Traversal strategies for the isogeny walk.
//!
//! A walk of n small isogenies is a triangle of points: the kernel generator is
//! repeatedly multiplied by ℓ until it has order ℓ, an isogeny is taken, and
//! the points saved along the way are pushed through it. A strategy fixes
//! where those points are saved. It is stored as a sequence of splits: for n
//! leaves, S(n) = [m] ++ S(n − m) ++ S(m) with 1 ≤ m < n, and S(1) is empty,
//! so a strategy for n leaves holds exactly n − 1 entries.
//!
//! Every valid strategy yields the same walk result; they only differ in cost.

use crate::errors::{Result, SidhError};

/// Relative cost of one ℓ-multiplication and of one point evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    pub multiplication: u64,
    pub evaluation: u64,
}

impl CostModel {
    pub const fn new(multiplication: u64, evaluation: u64) -> Self {
        Self {
            multiplication,
            evaluation,
        }
    }
}

/// Validated split sequence for a walk of `leaves` isogeny steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    leaves: usize,
    splits: Vec<usize>,
}

impl Strategy {
    /// Wrap an explicit split sequence, checking that it describes a complete
    /// traversal of `leaves` steps.
    pub fn new(leaves: usize, splits: Vec<usize>) -> Result<Self> {
        if !is_well_formed(leaves, &splits) {
            return Err(SidhError::InvalidConfiguration {
                parameter: "strategy".to_string(),
                reason: format!(
                    "{} splits do not describe a traversal of {} steps",
                    splits.len(),
                    leaves
                ),
            });
        }
        Ok(Self { leaves, splits })
    }

    /// Cheapest strategy under `cost`, by dynamic programming over the
    /// number of leaves. Ties go to the smallest split.
    pub fn optimal(leaves: usize, cost: CostModel) -> Self {
        let mut strategies: Vec<Vec<usize>> = vec![Vec::new(), Vec::new()];
        let mut costs: Vec<u64> = vec![0, 0];

        for n in 2..=leaves {
            let mut best_cost = u64::MAX;
            let mut best_split = 1;
            for b in 1..n {
                let candidate = costs[n - b]
                    + costs[b]
                    + b as u64 * cost.multiplication
                    + (n - b) as u64 * cost.evaluation;
                if candidate < best_cost {
                    best_cost = candidate;
                    best_split = b;
                }
            }
            let mut splits = Vec::with_capacity(n - 1);
            splits.push(best_split);
            splits.extend_from_slice(&strategies[n - best_split]);
            splits.extend_from_slice(&strategies[best_split]);
            strategies.push(splits);
            costs.push(best_cost);
        }

        let splits = strategies.swap_remove(leaves.min(strategies.len() - 1));
        Self { leaves, splits }
    }

    /// Split every subtree in half
    pub fn balanced(leaves: usize) -> Self {
        let mut splits = Vec::with_capacity(leaves.saturating_sub(1));
        build_balanced(leaves, &mut splits);
        Self { leaves, splits }
    }

    /// Multiply all the way down before every isogeny, saving no
    /// intermediate points.
    pub fn multiplication_only(leaves: usize) -> Self {
        let splits = (1..leaves).rev().collect();
        Self { leaves, splits }
    }

    pub fn leaves(&self) -> usize {
        self.leaves
    }

    pub fn splits(&self) -> &[usize] {
        &self.splits
    }

    /// Total cost of the traversal under `cost`
    pub fn cost(&self, cost: CostModel) -> u64 {
        traversal_cost(self.leaves, &self.splits, cost)
    }
}

fn is_well_formed(leaves: usize, splits: &[usize]) -> bool {
    if leaves <= 1 {
        return splits.is_empty();
    }
    if splits.len() != leaves - 1 {
        return false;
    }
    let m = splits[0];
    if m == 0 || m >= leaves {
        return false;
    }
    is_well_formed(leaves - m, &splits[1..leaves - m])
        && is_well_formed(m, &splits[leaves - m..])
}

fn build_balanced(leaves: usize, splits: &mut Vec<usize>) {
    if leaves <= 1 {
        return;
    }
    let m = leaves / 2;
    splits.push(m);
    build_balanced(leaves - m, splits);
    build_balanced(m, splits);
}

fn traversal_cost(leaves: usize, splits: &[usize], cost: CostModel) -> u64 {
    if leaves <= 1 {
        return 0;
    }
    let m = splits[0];
    m as u64 * cost.multiplication
        + (leaves - m) as u64 * cost.evaluation
        + traversal_cost(leaves - m, &splits[1..leaves - m], cost)
        + traversal_cost(m, &splits[leaves - m..], cost)
}
