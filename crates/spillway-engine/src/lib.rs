//! # spillway-engine: threshold-based flow funding solvers.
//!
//! Two engines share the network model from `spillway-core`:
//! - **Discrete** ([`DistributionEngine`]): a lump sum first covers
//!   shortfalls (proportionally to need when scarce), then fills remaining
//!   capacity; overflow above each maximum is redistributed along
//!   normalized allocation weights, round by round, until it falls below
//!   epsilon or the round cap is hit.
//! - **Continuous** ([`EquilibriumEngine`]): per-period rates settle to a
//!   fixed point under the progressive [`zone`] outflow function, updated
//!   Jacobi-style so every node reads the previous round's outflows.
//!
//! Both are pure functions of `(network, config)`: inputs are borrowed,
//! results are fresh values, and identical inputs give identical traces.

pub mod continuous;
pub mod discrete;
pub mod zone;

pub use continuous::EquilibriumEngine;
pub use discrete::{allocate_funding, DistributionEngine};
pub use zone::{calculate_outflow, outflow_for};
