//! Continuous equilibrium engine implementing the [`EquilibriumSolver`] trait.
//!
//! Rates settle by fixed-point iteration. Every node starts at
//! `total_inflow = external_inflow`; each round then
//!
//! 1. computes every outflow from the previous round's inflows via
//!    [`calculate_outflow`],
//! 2. rebuilds every inflow as `external + Σ source_outflow * share`,
//! 3. stops once the largest inflow change is below epsilon.
//!
//! A non-finite change (rates overflowing `f64`) ends the run unconverged.
//!
//! Updates are Jacobi-style: the whole outflow vector is computed before any
//! inflow is rebuilt, so no node sees another's same-round value.
//!
//! An edge's share is `weight / max(100, Σ weights)`. Whatever an
//! under-allocated node cannot place goes to the virtual overflow sink,
//! which is reported only when its total exceeds epsilon.

use spillway_core::config::SolverConfig;
use spillway_core::constants::FULL_SCALE;
use spillway_core::error::SolveError;
use spillway_core::network::FlowNetwork;
use spillway_core::trace::{
    max_abs_change, EquilibriumResult, EquilibriumRound, FlowEdge, FlowNodeState, OverflowSink,
    Snapshot,
};
use spillway_core::traits::{EquilibriumSolver, Participant};
use spillway_core::types::{AccountId, Zone};
use spillway_core::validation::validate;
use tracing::{debug, warn};

use crate::zone::calculate_outflow;

/// Steady-state solver for per-period flow rates.
#[derive(Debug, Clone)]
pub struct EquilibriumEngine {
    config: SolverConfig,
}

impl Default for EquilibriumEngine {
    fn default() -> Self {
        Self::new(SolverConfig::continuous())
    }
}

impl EquilibriumEngine {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl EquilibriumSolver for EquilibriumEngine {
    fn solve(&self, network: &FlowNetwork) -> Result<EquilibriumResult, SolveError> {
        self.config.validate()?;
        let warnings = validate(network).into_result()?;

        let ids: Vec<AccountId> = network.ids().cloned().collect();
        let external: Vec<f64> = network.iter().map(|n| n.external_inflow).collect();
        let edges = shares(network);
        let outflows_of = |inflow: &[f64]| -> Vec<f64> {
            network
                .iter()
                .zip(inflow)
                .map(|(n, i)| calculate_outflow(*i, n.min_threshold, n.max_threshold))
                .collect()
        };

        let mut inflow = external.clone();
        let mut rounds = Vec::new();
        let mut converged = false;
        let mut diverged = false;

        for iteration in 1..=self.config.max_iterations {
            let outflow = outflows_of(&inflow);

            let mut next = external.clone();
            for (i, targets) in edges.iter().enumerate() {
                for &(j, share) in targets {
                    next[j] += outflow[i] * share;
                }
            }

            let max_change = max_abs_change(next.iter().copied(), inflow.iter().copied());
            inflow = next;

            if self.config.verbose {
                debug!(iteration, max_change, "equilibrium: round");
            }
            rounds.push(EquilibriumRound {
                iteration,
                outflows: Snapshot::from_parts(&ids, &outflow),
                inflows: Snapshot::from_parts(&ids, &inflow),
                max_change,
            });

            if !max_change.is_finite() {
                diverged = true;
                break;
            }
            if max_change < self.config.epsilon {
                converged = true;
                break;
            }
        }

        if converged {
            debug!(iterations = rounds.len(), "equilibrium: converged");
        } else if diverged {
            warn!(iterations = rounds.len(), "equilibrium: rates diverged to non-finite values");
        } else {
            warn!(
                max_iterations = self.config.max_iterations,
                "equilibrium: round cap reached without convergence"
            );
        }

        let outflow = outflows_of(&inflow);

        let mut flows = Vec::new();
        for (i, targets) in edges.iter().enumerate() {
            for &(j, share) in targets {
                let rate = outflow[i] * share;
                if rate > 0.0 {
                    flows.push(FlowEdge {
                        source: ids[i].clone(),
                        target: ids[j].clone(),
                        amount: rate,
                    });
                }
            }
        }

        let overflow_sink = overflow_sink(network, &ids, &outflow, self.config.epsilon);

        let nodes = network
            .iter()
            .zip(inflow.iter().zip(&outflow))
            .map(|(node, (&total_inflow, &total_outflow))| FlowNodeState {
                id: node.id.clone(),
                name: node.name.clone(),
                external_inflow: node.external_inflow,
                total_inflow,
                total_outflow,
                zone: Zone::classify(total_inflow, node.min_threshold, node.max_threshold),
                balance: node.balance,
            })
            .collect();

        Ok(EquilibriumResult {
            nodes,
            flows,
            overflow_sink,
            iteration_count: rounds.len(),
            rounds,
            converged,
            warnings,
        })
    }
}

/// `(target index, share of outflow)` per source node, zero weights dropped.
fn shares(network: &FlowNetwork) -> Vec<Vec<(usize, f64)>> {
    network
        .iter()
        .map(|node| {
            let scale = node.allocation_total().max(FULL_SCALE);
            node.allocations
                .iter()
                .filter(|(_, w)| **w > 0.0)
                .filter_map(|(target, w)| network.index_of(target).map(|j| (j, w / scale)))
                .collect()
        })
        .collect()
}

fn overflow_sink(
    network: &FlowNetwork,
    ids: &[AccountId],
    outflow: &[f64],
    epsilon: f64,
) -> Option<OverflowSink> {
    let contributions: Vec<(AccountId, f64)> = network
        .iter()
        .zip(outflow)
        .enumerate()
        .filter_map(|(i, (node, &out))| {
            let unallocated = (FULL_SCALE - node.allocation_total()).max(0.0) / FULL_SCALE;
            let amount = out * unallocated;
            (amount > 0.0).then(|| (ids[i].clone(), amount))
        })
        .collect();

    let total_inflow: f64 = contributions.iter().map(|(_, a)| a).sum();
    (total_inflow > epsilon).then(|| OverflowSink {
        total_inflow,
        sources: Snapshot::new(contributions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spillway_core::network::Network;
    use spillway_core::types::FlowNode;

    fn engine() -> EquilibriumEngine {
        EquilibriumEngine::default()
    }

    fn ring(inflow: f64) -> FlowNetwork {
        Network::new(vec![
            FlowNode::new("a", 100.0, 300.0).with_inflow(inflow).allocate("b", 100.0),
            FlowNode::new("b", 100.0, 300.0).with_inflow(inflow).allocate("c", 100.0),
            FlowNode::new("c", 100.0, 300.0).with_inflow(inflow).allocate("a", 100.0),
        ])
    }

    #[test]
    fn ring_converges_to_equal_inflows() {
        // Fixed point of I = 200 + (I - 100) * 150 / 350 is I = 275.
        let result = engine().solve(&ring(200.0)).unwrap();
        assert!(result.converged);
        let eps = engine().config().epsilon;
        for node in &result.nodes {
            assert!((node.total_inflow - 275.0).abs() < 0.01, "{node:?}");
            assert_eq!(node.zone, Zone::Building);
        }
        let a = result.node(&"a".into()).unwrap().total_inflow;
        let b = result.node(&"b".into()).unwrap().total_inflow;
        let c = result.node(&"c".into()).unwrap().total_inflow;
        assert!((a - b).abs() < eps && (b - c).abs() < eps);
        assert!(result.overflow_sink.is_none());
    }

    #[test]
    fn deficit_nodes_pass_nothing_on() {
        let result = engine().solve(&ring(50.0)).unwrap();
        assert!(result.converged);
        assert_eq!(result.iteration_count, 1);
        assert!(result.flows.is_empty());
        assert!(result.nodes.iter().all(|n| n.zone == Zone::Deficit));
    }

    #[test]
    fn under_allocation_feeds_sink() {
        let net = Network::new(vec![
            FlowNode::new("src", 0.0, 100.0).with_inflow(400.0).allocate("dst", 40.0),
            FlowNode::new("dst", 0.0, 1000.0),
        ]);
        let result = engine().solve(&net).unwrap();
        assert!(result.converged);
        // src is in capacity zone: outflow 300, 40% to dst, 60% unallocated.
        // dst (inflow 120, building zone) passes on 40 and allocates none of it.
        let src = result.node(&"src".into()).unwrap();
        assert!((src.total_outflow - 300.0).abs() < 1e-9);
        assert!((result.flow(&"src".into(), &"dst".into()).unwrap() - 120.0).abs() < 1e-9);
        let sink = result.overflow_sink.as_ref().unwrap();
        assert!((sink.sources.get(&"src".into()).unwrap() - 180.0).abs() < 1e-9);
        assert!((sink.sources.get(&"dst".into()).unwrap() - 40.0).abs() < 1e-9);
        assert!((sink.total_inflow - 220.0).abs() < 1e-9);
    }

    #[test]
    fn jacobi_rounds_read_previous_outflows() {
        // a -> b -> c chain: c only sees a's contribution after two rounds.
        let net = Network::new(vec![
            FlowNode::new("a", 0.0, 100.0).with_inflow(300.0).allocate("b", 100.0),
            FlowNode::new("b", 0.0, 100.0).allocate("c", 100.0),
            FlowNode::new("c", 0.0, 1000.0),
        ]);
        let result = engine().solve(&net).unwrap();
        let first = &result.rounds[0];
        assert_eq!(first.inflows.get(&"b".into()), Some(200.0));
        assert_eq!(first.inflows.get(&"c".into()), Some(0.0));
        let second = &result.rounds[1];
        assert!(second.inflows.get(&"c".into()).unwrap() > 0.0);
    }

    #[test]
    fn round_cap_reports_non_convergence() {
        // Capacity-zone ring with external inflow above max grows forever.
        let net = Network::new(vec![
            FlowNode::new("a", 0.0, 10.0).with_inflow(50.0).allocate("b", 100.0),
            FlowNode::new("b", 0.0, 10.0).with_inflow(50.0).allocate("a", 100.0),
        ]);
        let engine = EquilibriumEngine::new(SolverConfig::continuous().with_max_iterations(25));
        let result = engine.solve(&net).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iteration_count, 25);
        assert_eq!(result.rounds.len(), 25);
    }

    #[test]
    fn overflowing_rates_are_not_converged() {
        // Finite inputs whose first rebuilt inflows exceed the f64 range.
        let net = Network::new(vec![
            FlowNode::new("a", 0.0, 10.0).with_inflow(1e308).allocate("b", 100.0),
            FlowNode::new("b", 0.0, 10.0).with_inflow(1e308).allocate("a", 100.0),
        ]);
        let result = engine().solve(&net).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iteration_count, 1);
        assert_eq!(result.rounds[0].max_change, f64::INFINITY);
        assert!(result.nodes.iter().all(|n| n.total_inflow.is_infinite()));
    }

    #[test]
    fn display_balance_does_not_feed_back() {
        let mut with_balance = ring(200.0).into_participants();
        for node in &mut with_balance {
            node.balance = 1_000.0;
        }
        let plain = engine().solve(&ring(200.0)).unwrap();
        let seeded = engine().solve(&Network::new(with_balance)).unwrap();
        assert_eq!(plain.total_inflows(), seeded.total_inflows());
        assert_eq!(seeded.nodes[0].balance, 1_000.0);
    }

    #[test]
    fn invalid_network_is_rejected() {
        let net = Network::new(vec![FlowNode::new("a", 5.0, 1.0)]);
        assert!(matches!(engine().solve(&net), Err(SolveError::InvalidNetwork(_))));
    }
}
