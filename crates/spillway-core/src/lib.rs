//! # spillway-core
//! Foundation types for threshold-based flow funding: accounts and flow
//! nodes, the network that holds them, structural validation, solver
//! configuration, and the result/trace records both engines produce.

pub mod config;
pub mod constants;
pub mod error;
pub mod network;
pub mod trace;
pub mod traits;
pub mod types;
pub mod validation;

pub use config::SolverConfig;
pub use network::{AccountNetwork, FlowNetwork, Network, NetworkSummary};
pub use traits::{Distributor, EquilibriumSolver, Participant};
pub use types::{Account, AccountId, AccountState, AccountStatus, FlowNode, Zone};
pub use validation::{validate, ValidationReport};
