//! Structural validation of a network, run before either engine touches it.
//!
//! [`validate`] never fails: it collects every fatal [`ValidationError`] and
//! every informational [`ValidationWarning`] into a [`ValidationReport`].
//! Engines call [`ValidationReport::into_result`] at their entry point and
//! refuse to run on any error.
//!
//! Fatal checks, per participant:
//! - thresholds, principal and weights are finite
//! - thresholds and principal are non-negative, `min <= max`
//! - no self-allocation, no allocation to an unknown id, no negative weight
//! - outgoing weights sum to at most [`FULL_SCALE`] + [`ALLOCATION_TOLERANCE`]
//! - ids are unique
//!
//! Warnings:
//! - no outgoing weight in a network of more than one participant
//! - no incoming weight and no principal

use std::collections::HashSet;

use crate::constants::{ALLOCATION_TOLERANCE, FULL_SCALE};
use crate::error::{SolveError, ValidationError, ValidationWarning};
use crate::network::Network;
use crate::traits::Participant;

/// Everything the validator found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Warnings on success, all errors as one [`SolveError`] otherwise.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, SolveError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(SolveError::InvalidNetwork(self.errors))
        }
    }
}

/// Check a network for structural correctness.
pub fn validate<P: Participant>(network: &Network<P>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen = HashSet::with_capacity(network.len());

    for p in network {
        if !seen.insert(p.id()) {
            report
                .errors
                .push(ValidationError::DuplicateId { id: p.id().clone() });
        }
        check_values(p, &mut report.errors);
        check_allocations(p, network, &mut report.errors);
    }

    for p in network {
        if network.len() > 1 && p.allocation_total() <= 0.0 {
            report
                .warnings
                .push(ValidationWarning::NoAllocations { id: p.id().clone() });
        }
        if p.principal() <= 0.0 && !network.has_incoming(p.id()) {
            report
                .warnings
                .push(ValidationWarning::Unreachable { id: p.id().clone() });
        }
    }

    report
}

fn check_values<P: Participant>(p: &P, errors: &mut Vec<ValidationError>) {
    let id = p.id();
    let values = [
        ("min threshold", p.min_threshold()),
        ("max threshold", p.max_threshold()),
        (p.principal_name(), p.principal()),
    ];
    let mut finite = true;
    for (field, value) in values {
        if !value.is_finite() {
            errors.push(ValidationError::NonFinite { id: id.clone(), field });
            finite = false;
        }
    }
    if !finite {
        return;
    }

    let thresholds = [
        ("min threshold", p.min_threshold()),
        ("max threshold", p.max_threshold()),
    ];
    for (field, value) in thresholds {
        if value < 0.0 {
            errors.push(ValidationError::NegativeThreshold { id: id.clone(), field, value });
        }
    }
    if p.min_threshold() > p.max_threshold() {
        errors.push(ValidationError::MinExceedsMax {
            id: id.clone(),
            min: p.min_threshold(),
            max: p.max_threshold(),
        });
    }
    if p.principal() < 0.0 {
        errors.push(ValidationError::NegativePrincipal {
            id: id.clone(),
            field: p.principal_name(),
            value: p.principal(),
        });
    }
}

fn check_allocations<P: Participant>(
    p: &P,
    network: &Network<P>,
    errors: &mut Vec<ValidationError>,
) {
    let id = p.id();
    let mut finite = true;

    for (target, &weight) in p.allocations() {
        if target == id {
            errors.push(ValidationError::SelfAllocation { id: id.clone() });
        } else if !network.contains(target) {
            errors.push(ValidationError::UnknownTarget {
                id: id.clone(),
                target: target.clone(),
            });
        }

        if !weight.is_finite() {
            errors.push(ValidationError::NonFinite {
                id: id.clone(),
                field: "allocation weight",
            });
            finite = false;
        } else if weight < 0.0 {
            errors.push(ValidationError::NegativeWeight {
                id: id.clone(),
                target: target.clone(),
                weight,
            });
        }
    }

    let total = p.allocation_total();
    if finite && total > FULL_SCALE + ALLOCATION_TOLERANCE {
        errors.push(ValidationError::AllocationOverflow { id: id.clone(), total });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::AccountNetwork;
    use crate::types::{Account, FlowNode};

    fn pair() -> Vec<Account> {
        vec![
            Account::new("a", 10.0, 20.0).with_balance(5.0).allocate("b", 100.0),
            Account::new("b", 10.0, 20.0).with_balance(5.0).allocate("a", 100.0),
        ]
    }

    #[test]
    fn clean_network_is_valid() {
        let report = validate(&Network::new(pair()));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn negative_threshold_is_fatal() {
        let mut accounts = pair();
        accounts[0].min_threshold = -1.0;
        let report = validate(&Network::new(accounts));
        assert!(!report.is_valid());
        assert!(matches!(
            report.errors[0],
            ValidationError::NegativeThreshold { field: "min threshold", .. }
        ));
    }

    #[test]
    fn min_above_max_is_fatal() {
        let mut accounts = pair();
        accounts[1].min_threshold = 30.0;
        let report = validate(&Network::new(accounts));
        assert_eq!(
            report.errors,
            vec![ValidationError::MinExceedsMax { id: "b".into(), min: 30.0, max: 20.0 }]
        );
    }

    #[test]
    fn negative_balance_is_fatal() {
        let mut accounts = pair();
        accounts[0].balance = -0.5;
        let report = validate(&Network::new(accounts));
        assert_eq!(report.error_messages(), vec!["a: negative balance (-0.5)"]);
    }

    #[test]
    fn negative_inflow_is_fatal() {
        let net = Network::new(vec![FlowNode::new("n", 0.0, 1.0).with_inflow(-2.0)]);
        let report = validate(&net);
        assert_eq!(report.error_messages(), vec!["n: negative external inflow (-2)"]);
    }

    #[test]
    fn self_and_unknown_targets_are_fatal() {
        let net = Network::new(vec![
            Account::new("a", 0.0, 10.0)
                .with_balance(1.0)
                .allocate("a", 50.0)
                .allocate("ghost", 50.0),
        ]);
        let report = validate(&net);
        assert_eq!(
            report.errors,
            vec![
                ValidationError::SelfAllocation { id: "a".into() },
                ValidationError::UnknownTarget { id: "a".into(), target: "ghost".into() },
            ]
        );
    }

    #[test]
    fn weight_sum_tolerance() {
        let within = Network::new(vec![
            Account::new("a", 0.0, 10.0)
                .with_balance(1.0)
                .allocate("b", 60.0)
                .allocate("c", 40.005),
            Account::new("b", 0.0, 10.0).with_balance(1.0).allocate("a", 100.0),
            Account::new("c", 0.0, 10.0).with_balance(1.0).allocate("a", 100.0),
        ]);
        assert!(validate(&within).is_valid());

        let over: AccountNetwork = Network::new(vec![
            Account::new("a", 0.0, 10.0).with_balance(1.0).allocate("b", 60.0).allocate("c", 40.02),
            Account::new("b", 0.0, 10.0).with_balance(1.0).allocate("a", 100.0),
            Account::new("c", 0.0, 10.0).with_balance(1.0).allocate("a", 100.0),
        ]);
        let report = validate(&over);
        assert!(matches!(report.errors[..], [ValidationError::AllocationOverflow { .. }]));
    }

    #[test]
    fn under_full_weights_are_allowed() {
        let net = Network::new(vec![
            Account::new("a", 0.0, 10.0).with_balance(1.0).allocate("b", 30.0),
            Account::new("b", 0.0, 10.0).with_balance(1.0).allocate("a", 10.0),
        ]);
        assert!(validate(&net).is_valid());
    }

    #[test]
    fn duplicate_id_is_fatal() {
        let net = Network::new(vec![Account::new("a", 0.0, 1.0), Account::new("a", 0.0, 1.0)]);
        let report = validate(&net);
        assert!(report.errors.contains(&ValidationError::DuplicateId { id: "a".into() }));
    }

    #[test]
    fn non_finite_values_are_fatal() {
        let net = Network::new(vec![
            Account::new("a", f64::NAN, 1.0).allocate("b", f64::INFINITY),
            Account::new("b", 0.0, 1.0).with_balance(1.0),
        ]);
        let report = validate(&net);
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, ValidationError::NonFinite { .. })));
    }

    #[test]
    fn missing_allocations_warn_but_pass() {
        let net = Network::new(vec![
            Account::new("a", 0.0, 10.0).with_balance(1.0).allocate("b", 100.0),
            Account::new("b", 0.0, 10.0).with_balance(1.0),
        ]);
        let report = validate(&net);
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec![ValidationWarning::NoAllocations { id: "b".into() }]);
    }

    #[test]
    fn single_account_without_allocations_does_not_warn() {
        let net = Network::new(vec![Account::new("a", 0.0, 10.0).with_balance(1.0)]);
        assert!(validate(&net).warnings.is_empty());
    }

    #[test]
    fn unreachable_account_warns() {
        let net = Network::new(vec![
            Account::new("a", 0.0, 10.0).with_balance(1.0).allocate("b", 100.0),
            Account::new("b", 0.0, 10.0).with_balance(1.0).allocate("a", 100.0),
            Account::new("c", 0.0, 10.0).allocate("a", 100.0),
        ]);
        let report = validate(&net);
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec![ValidationWarning::Unreachable { id: "c".into() }]);
    }

    #[test]
    fn into_result_aggregates() {
        let net = Network::new(vec![Account::new("a", 5.0, 1.0).allocate("a", 10.0)]);
        let err = validate(&net).into_result().unwrap_err();
        assert!(matches!(err, SolveError::InvalidNetwork(ref errors) if errors.len() == 2));
    }
}
