//! Error types for Spillway.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::AccountId;

/// Fatal structural problems found by the validator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{id}: duplicate account id")] DuplicateId { id: AccountId },
    #[error("{id}: {field} is not a finite number")] NonFinite { id: AccountId, field: &'static str },
    #[error("{id}: negative {field} ({value})")] NegativeThreshold { id: AccountId, field: &'static str, value: f64 },
    #[error("{id}: min threshold {min} exceeds max threshold {max}")] MinExceedsMax { id: AccountId, min: f64, max: f64 },
    #[error("{id}: negative {field} ({value})")] NegativePrincipal { id: AccountId, field: &'static str, value: f64 },
    #[error("{id}: allocates to itself")] SelfAllocation { id: AccountId },
    #[error("{id}: allocates to unknown account {target}")] UnknownTarget { id: AccountId, target: AccountId },
    #[error("{id}: negative weight {weight} towards {target}")] NegativeWeight { id: AccountId, target: AccountId, weight: f64 },
    #[error("{id}: allocation weights sum to {total}, above full scale")] AllocationOverflow { id: AccountId, total: f64 },
}

/// Non-fatal findings. A network with warnings still runs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    #[error("{id}: no outgoing allocations, overflow will be lost")] NoAllocations { id: AccountId },
    #[error("{id}: no incoming allocations and no starting funds")] Unreachable { id: AccountId },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_iterations must be at least 1")] ZeroIterations,
    #[error("epsilon must be positive and finite, got {0}")] InvalidEpsilon(f64),
}

/// Failures raised at an engine's entry point, before any state is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("network failed validation: {}", join_errors(.0))] InvalidNetwork(Vec<ValidationError>),
    #[error("funding must be non-negative and finite, got {0}")] InvalidFunding(f64),
    #[error(transparent)] Config(#[from] ConfigError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_network_aggregates_every_error() {
        let err = SolveError::InvalidNetwork(vec![
            ValidationError::SelfAllocation { id: "a".into() },
            ValidationError::UnknownTarget { id: "b".into(), target: "zz".into() },
        ]);
        assert_eq!(
            err.to_string(),
            "network failed validation: a: allocates to itself; b: allocates to unknown account zz"
        );
    }

    #[test]
    fn config_error_is_transparent() {
        let err: SolveError = ConfigError::ZeroIterations.into();
        assert_eq!(err.to_string(), "max_iterations must be at least 1");
    }
}
