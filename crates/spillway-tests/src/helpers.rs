//! Shared fixtures for integration tests.

use spillway_core::network::{AccountNetwork, FlowNetwork};
use spillway_core::types::{Account, FlowNode};

/// Tolerance used for floating-point comparisons in tests.
pub const TOL: f64 = 1e-6;

pub fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < TOL,
        "{what}: expected {expected}, got {actual}"
    );
}

/// Accounts `n0..n{len}` in a ring, each sending 100% of its overflow to the next.
pub fn account_ring(len: usize, min: f64, max: f64, balance: f64) -> AccountNetwork {
    (0..len)
        .map(|i| {
            Account::new(format!("n{i}"), min, max)
                .with_balance(balance)
                .allocate(format!("n{}", (i + 1) % len), 100.0)
        })
        .collect()
}

/// Flow nodes `n0..n{len}` in a ring with identical thresholds and inflow.
pub fn flow_ring(len: usize, min: f64, max: f64, inflow: f64) -> FlowNetwork {
    (0..len)
        .map(|i| {
            FlowNode::new(format!("n{i}"), min, max)
                .with_inflow(inflow)
                .allocate(format!("n{}", (i + 1) % len), 100.0)
        })
        .collect()
}

/// Per-account parameters for generated networks: `(min, span, balance, weights)`.
///
/// `weights[k]` is the weight towards account `(i + k + 1) % len`.
pub type AccountParams = (f64, f64, f64, Vec<f64>);

/// Build a network from generated params. Weights are rescaled so each account
/// sums to `scale` (or zero if all raw weights are zero). Weights beyond the
/// `len - 1` other accounts are ignored.
pub fn network_from_params(params: &[AccountParams], scale: f64) -> AccountNetwork {
    let len = params.len();
    params
        .iter()
        .enumerate()
        .map(|(i, (min, span, balance, weights))| {
            let mut account =
                Account::new(format!("n{i}"), *min, min + span).with_balance(*balance);
            let usable = &weights[..weights.len().min(len.saturating_sub(1))];
            let raw: f64 = usable.iter().sum();
            if raw > 0.0 {
                for (k, w) in usable.iter().enumerate() {
                    if *w > 0.0 {
                        let target = format!("n{}", (i + k + 1) % len);
                        account = account.allocate(target, w / raw * scale);
                    }
                }
            }
            account
        })
        .collect()
}
