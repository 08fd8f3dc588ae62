//! Result and trace records produced by the engines.
//!
//! Everything here is plain data: snapshots of per-account values, explicit
//! flow edges, per-round records, and the assembled results. A test can
//! replay any round from these alone.

use serde::{Deserialize, Serialize};

use crate::error::ValidationWarning;
use crate::types::{AccountId, AccountState, Zone};

/// One value per account, in network input order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnapshotEntry {
    pub id: AccountId,
    pub value: f64,
}

impl Snapshot {
    pub fn new(entries: impl IntoIterator<Item = (AccountId, f64)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, value)| SnapshotEntry { id, value })
                .collect(),
        }
    }

    /// Pair `ids` with `values` positionally.
    pub fn from_parts<'a>(ids: impl IntoIterator<Item = &'a AccountId>, values: &[f64]) -> Self {
        Self::new(ids.into_iter().cloned().zip(values.iter().copied()))
    }

    pub fn get(&self, id: &AccountId) -> Option<f64> {
        self.entries.iter().find(|e| &e.id == id).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, f64)> {
        self.entries.iter().map(|e| (&e.id, e.value))
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.value).sum()
    }

    /// Largest absolute per-position difference against `other`.
    pub fn max_abs_difference(&self, other: &Snapshot) -> f64 {
        max_abs_change(
            self.entries.iter().map(|e| e.value),
            other.entries.iter().map(|e| e.value),
        )
    }
}

/// Largest `|a[i] - b[i]|` over paired values.
///
/// NaN is kept rather than skipped, so a pair of diverged values never reads
/// as zero change.
pub fn max_abs_change(
    a: impl IntoIterator<Item = f64>,
    b: impl IntoIterator<Item = f64>,
) -> f64 {
    a.into_iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, |max, d| if d.is_nan() || d > max { d } else { max })
}

/// A transfer (discrete) or rate (continuous) along one allocation edge.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FlowEdge {
    pub source: AccountId,
    pub target: AccountId,
    pub amount: f64,
}

/// One round of discrete overflow redistribution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IterationRecord {
    /// 1-based round number.
    pub iteration: usize,
    /// Balances after this round's redistribution.
    pub balances: Snapshot,
    /// Overflow measured at the start of the round, before clamping.
    pub overflow: Snapshot,
    pub total_overflow: f64,
    /// Non-zero transfers made this round, in source then target order.
    pub flows: Vec<FlowEdge>,
    /// Set on the round that detected convergence. Such a round moves nothing.
    pub converged: bool,
}

impl IterationRecord {
    pub fn flow(&self, source: &AccountId, target: &AccountId) -> Option<f64> {
        self.flows
            .iter()
            .find(|f| &f.source == source && &f.target == target)
            .map(|f| f.amount)
    }

    pub fn total_transferred(&self) -> f64 {
        self.flows.iter().map(|f| f.amount).sum()
    }
}

/// Outcome of a discrete distribution run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DistributionResult {
    /// Balances before the lump sum was applied.
    pub initial_balances: Snapshot,
    pub final_balances: Snapshot,
    /// Final balances with derived fields.
    pub final_states: Vec<AccountState>,
    pub iterations: Vec<IterationRecord>,
    pub converged: bool,
    pub total_funding: f64,
    pub iteration_count: usize,
    pub warnings: Vec<ValidationWarning>,
}

impl DistributionResult {
    /// Funds that left the system through accounts with no allocations.
    pub fn lost_overflow(&self) -> f64 {
        self.initial_balances.total() + self.total_funding - self.final_balances.total()
    }

    pub fn last_iteration(&self) -> Option<&IterationRecord> {
        self.iterations.last()
    }
}

/// Equilibrium rates for one flow node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FlowNodeState {
    pub id: AccountId,
    pub name: String,
    pub external_inflow: f64,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub zone: Zone,
    /// Display-only accumulated balance.
    pub balance: f64,
}

impl FlowNodeState {
    /// Rate the node keeps for itself.
    pub fn retained(&self) -> f64 {
        self.total_inflow - self.total_outflow
    }
}

/// One Jacobi round of the equilibrium solver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EquilibriumRound {
    /// 1-based round number.
    pub iteration: usize,
    /// Outflows computed from the previous round's inflows.
    pub outflows: Snapshot,
    /// Inflows produced by this round.
    pub inflows: Snapshot,
    pub max_change: f64,
}

/// Virtual collector for outflow not covered by any allocation weight.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OverflowSink {
    pub total_inflow: f64,
    /// Per-node contributions, in input order, zero entries omitted.
    pub sources: Snapshot,
}

/// Outcome of a continuous equilibrium run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EquilibriumResult {
    pub nodes: Vec<FlowNodeState>,
    /// Per-edge rates at equilibrium.
    pub flows: Vec<FlowEdge>,
    /// Present only when the unallocated outflow exceeds epsilon.
    pub overflow_sink: Option<OverflowSink>,
    pub rounds: Vec<EquilibriumRound>,
    pub converged: bool,
    pub iteration_count: usize,
    pub warnings: Vec<ValidationWarning>,
}

impl EquilibriumResult {
    pub fn node(&self, id: &AccountId) -> Option<&FlowNodeState> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn flow(&self, source: &AccountId, target: &AccountId) -> Option<f64> {
        self.flows
            .iter()
            .find(|f| &f.source == source && &f.target == target)
            .map(|f| f.amount)
    }

    pub fn total_inflows(&self) -> Snapshot {
        Snapshot::new(self.nodes.iter().map(|n| (n.id.clone(), n.total_inflow)))
    }

    /// Advance every display balance by `net rate * dt`. Rates are untouched.
    pub fn integrate_balances(&mut self, dt: f64) {
        for node in &mut self.nodes {
            node.balance += node.retained() * dt;
        }
    }
}
