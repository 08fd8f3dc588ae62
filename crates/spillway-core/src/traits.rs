//! Trait interfaces shared by both funding modes.
//!
//! - [`Participant`]: identity, thresholds and allocation edges; what the
//!   validator and the generic [`Network`](crate::network::Network) need
//! - [`Distributor`]: lump-sum distribution (spillway-engine implements)
//! - [`EquilibriumSolver`]: steady-state rates (spillway-engine implements)

use crate::error::SolveError;
use crate::network::{AccountNetwork, FlowNetwork};
use crate::trace::{DistributionResult, EquilibriumResult};
use crate::types::{Account, AccountId, Allocations, FlowNode};

/// A thresholded participant with outgoing allocation weights.
pub trait Participant {
    fn id(&self) -> &AccountId;

    fn min_threshold(&self) -> f64;

    fn max_threshold(&self) -> f64;

    /// Starting funds: the balance in discrete mode, the external inflow rate
    /// in continuous mode.
    fn principal(&self) -> f64;

    /// Field name of [`principal`](Self::principal), used in diagnostics.
    fn principal_name(&self) -> &'static str;

    fn allocations(&self) -> &Allocations;

    /// Sum of outgoing weights, in target id order.
    fn allocation_total(&self) -> f64 {
        self.allocations().values().sum()
    }
}

/// Distributes a one-time injection of funds across an account network.
///
/// Implementations validate the network before touching anything and never
/// mutate the caller's input.
pub trait Distributor {
    /// Inject `funding` and redistribute overflow until convergence or the
    /// round cap. Non-convergence is reported in the result, not as an error.
    fn distribute(
        &self,
        network: &AccountNetwork,
        funding: f64,
    ) -> Result<DistributionResult, SolveError>;
}

/// Computes the steady-state flow rates of a flow network.
pub trait EquilibriumSolver {
    fn solve(&self, network: &FlowNetwork) -> Result<EquilibriumResult, SolveError>;
}

impl Participant for Account {
    fn id(&self) -> &AccountId {
        &self.id
    }

    fn min_threshold(&self) -> f64 {
        self.min_threshold
    }

    fn max_threshold(&self) -> f64 {
        self.max_threshold
    }

    fn principal(&self) -> f64 {
        self.balance
    }

    fn principal_name(&self) -> &'static str {
        "balance"
    }

    fn allocations(&self) -> &Allocations {
        &self.allocations
    }
}

impl Participant for FlowNode {
    fn id(&self) -> &AccountId {
        &self.id
    }

    fn min_threshold(&self) -> f64 {
        self.min_threshold
    }

    fn max_threshold(&self) -> f64 {
        self.max_threshold
    }

    fn principal(&self) -> f64 {
        self.external_inflow
    }

    fn principal_name(&self) -> &'static str {
        "external inflow"
    }

    fn allocations(&self) -> &Allocations {
        &self.allocations
    }
}
