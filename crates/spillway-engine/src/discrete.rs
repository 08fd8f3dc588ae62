//! Discrete distribution engine implementing the [`Distributor`] trait.
//!
//! A run has two phases:
//!
//! 1. **Initial allocation** ([`allocate_funding`]). If the lump sum cannot
//!    cover every shortfall it is split in proportion to each account's
//!    shortfall, so no account reaches its minimum. Otherwise every
//!    shortfall is filled exactly and the remainder is split in proportion
//!    to remaining capacity, or evenly when no capacity is left.
//! 2. **Overflow redistribution**. Each round measures every account's
//!    overflow, clamps the balance to its maximum, and, unless the total
//!    overflow is below epsilon, forwards each overflow along the account's
//!    weights normalized by their own sum. An account with no outgoing
//!    weight loses its overflow.
//!
//! The caller's network is only borrowed. Balances are worked on in a
//! private vector and every round is recorded as an [`IterationRecord`].

use spillway_core::config::SolverConfig;
use spillway_core::error::SolveError;
use spillway_core::network::AccountNetwork;
use spillway_core::trace::{DistributionResult, FlowEdge, IterationRecord, Snapshot};
use spillway_core::traits::{Distributor, Participant};
use spillway_core::types::AccountId;
use spillway_core::validation::validate;
use tracing::{debug, warn};

/// Lump-sum distribution with iterative overflow redistribution.
#[derive(Debug, Clone)]
pub struct DistributionEngine {
    config: SolverConfig,
}

impl Default for DistributionEngine {
    fn default() -> Self {
        Self::new(SolverConfig::discrete())
    }
}

impl DistributionEngine {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run exactly one redistribution round on `network` and return the
    /// resulting network together with the round's record.
    ///
    /// The round is numbered `iteration` in the record. `network` is left
    /// untouched.
    pub fn redistribute_round(
        &self,
        network: &AccountNetwork,
        iteration: usize,
    ) -> Result<(AccountNetwork, IterationRecord), SolveError> {
        self.config.validate()?;
        validate(network).into_result()?;

        let plan = RoundPlan::new(network);
        let mut balances = network.balances().values();
        let record = plan.run_round(iteration, &mut balances, self.config.epsilon);
        Ok((network.with_balances(&balances), record))
    }
}

impl Distributor for DistributionEngine {
    fn distribute(
        &self,
        network: &AccountNetwork,
        funding: f64,
    ) -> Result<DistributionResult, SolveError> {
        self.config.validate()?;
        check_funding(funding)?;
        let warnings = validate(network).into_result()?;

        let initial_balances = network.balances();
        let mut balances = initial_balances.values();
        apply_funding(network, &mut balances, funding);

        let plan = RoundPlan::new(network);
        let mut iterations = Vec::new();
        let mut converged = false;

        for iteration in 1..=self.config.max_iterations {
            let record = plan.run_round(iteration, &mut balances, self.config.epsilon);
            if self.config.verbose {
                debug!(
                    iteration,
                    total_overflow = record.total_overflow,
                    transfers = record.flows.len(),
                    "distribute: round"
                );
            }
            converged = record.converged;
            iterations.push(record);
            if converged {
                break;
            }
        }

        let final_network = network.with_balances(&balances);
        if converged {
            debug!(funding, iterations = iterations.len(), "distribute: converged");
        } else {
            warn!(
                funding,
                max_iterations = self.config.max_iterations,
                "distribute: round cap reached without convergence"
            );
        }

        Ok(DistributionResult {
            initial_balances,
            final_balances: final_network.balances(),
            final_states: final_network.states(),
            iteration_count: iterations.len(),
            iterations,
            converged,
            total_funding: funding,
            warnings,
        })
    }
}

/// Apply the initial allocation of `funding` and return the funded network.
///
/// This is the first phase of [`DistributionEngine::distribute`] on its own.
/// No overflow is redistributed.
pub fn allocate_funding(
    network: &AccountNetwork,
    funding: f64,
) -> Result<AccountNetwork, SolveError> {
    check_funding(funding)?;
    validate(network).into_result()?;
    let mut balances = network.balances().values();
    apply_funding(network, &mut balances, funding);
    Ok(network.with_balances(&balances))
}

fn check_funding(funding: f64) -> Result<(), SolveError> {
    if funding.is_finite() && funding >= 0.0 {
        Ok(())
    } else {
        Err(SolveError::InvalidFunding(funding))
    }
}

fn apply_funding(network: &AccountNetwork, balances: &mut [f64], funding: f64) {
    let accounts = network.participants();
    let shortfalls: Vec<f64> = accounts
        .iter()
        .zip(balances.iter())
        .map(|(a, b)| (a.min_threshold - b).max(0.0))
        .collect();
    let total_shortfall: f64 = shortfalls.iter().sum();

    // Scarce funds go to need, weighted by how far below minimum each account is.
    if funding < total_shortfall {
        for (balance, shortfall) in balances.iter_mut().zip(&shortfalls) {
            *balance += funding * shortfall / total_shortfall;
        }
        debug!(funding, total_shortfall, "distribute: partial shortfall coverage");
        return;
    }

    for ((balance, shortfall), account) in balances.iter_mut().zip(&shortfalls).zip(accounts) {
        if *shortfall > 0.0 {
            *balance = account.min_threshold;
        }
    }

    let remainder = funding - total_shortfall;
    let capacities: Vec<f64> = accounts
        .iter()
        .zip(balances.iter())
        .map(|(a, b)| (a.max_threshold - b).max(0.0))
        .collect();
    let total_capacity: f64 = capacities.iter().sum();

    if total_capacity > 0.0 {
        for (balance, capacity) in balances.iter_mut().zip(&capacities) {
            *balance += remainder * capacity / total_capacity;
        }
    } else if !balances.is_empty() {
        // Every account is full: split evenly and let redistribution sort it out.
        let share = remainder / balances.len() as f64;
        for balance in balances.iter_mut() {
            *balance += share;
        }
    }

    debug!(
        funding,
        total_shortfall,
        total_capacity,
        remainder,
        "distribute: shortfalls covered"
    );
}

/// Per-run lookup tables for redistribution: maxima and normalized edges by
/// input position.
struct RoundPlan {
    ids: Vec<AccountId>,
    max_thresholds: Vec<f64>,
    /// `(target index, weight / total weight)` per source, zero weights dropped.
    edges: Vec<Vec<(usize, f64)>>,
}

impl RoundPlan {
    fn new(network: &AccountNetwork) -> Self {
        let edges = network
            .iter()
            .map(|account| {
                let total = account.allocation_total();
                if total <= 0.0 {
                    return Vec::new();
                }
                account
                    .allocations
                    .iter()
                    .filter(|(_, w)| **w > 0.0)
                    .filter_map(|(target, w)| network.index_of(target).map(|j| (j, w / total)))
                    .collect()
            })
            .collect();

        Self {
            ids: network.ids().cloned().collect(),
            max_thresholds: network.iter().map(|a| a.max_threshold).collect(),
            edges,
        }
    }

    fn run_round(&self, iteration: usize, balances: &mut [f64], epsilon: f64) -> IterationRecord {
        let mut overflow = vec![0.0; balances.len()];
        for (i, balance) in balances.iter_mut().enumerate() {
            let excess = *balance - self.max_thresholds[i];
            if excess > 0.0 {
                overflow[i] = excess;
                *balance = self.max_thresholds[i];
            }
        }
        let total_overflow: f64 = overflow.iter().sum();
        let overflow_snapshot = Snapshot::from_parts(&self.ids, &overflow);

        if total_overflow < epsilon {
            return IterationRecord {
                iteration,
                balances: Snapshot::from_parts(&self.ids, balances),
                overflow: overflow_snapshot,
                total_overflow,
                flows: Vec::new(),
                converged: true,
            };
        }

        let mut flows = Vec::new();
        for (i, &amount) in overflow.iter().enumerate() {
            if amount <= 0.0 {
                continue;
            }
            for &(j, share) in &self.edges[i] {
                let transfer = amount * share;
                if transfer > 0.0 {
                    balances[j] += transfer;
                    flows.push(FlowEdge {
                        source: self.ids[i].clone(),
                        target: self.ids[j].clone(),
                        amount: transfer,
                    });
                }
            }
        }

        IterationRecord {
            iteration,
            balances: Snapshot::from_parts(&self.ids, balances),
            overflow: overflow_snapshot,
            total_overflow,
            flows,
            converged: false,
        }
    }
}
