//! Criterion benchmarks for spillway-engine.
//!
//! Covers: zone outflow evaluation, a discrete distribution run, and a
//! continuous equilibrium run on seeded random ring networks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spillway_core::network::{AccountNetwork, FlowNetwork, Network};
use spillway_core::traits::{Distributor, EquilibriumSolver};
use spillway_core::types::{Account, FlowNode};
use spillway_engine::zone::calculate_outflow;
use spillway_engine::{DistributionEngine, EquilibriumEngine};

const NODES: usize = 200;

/// Ring with two outgoing edges per account: next neighbour and one random peer.
fn random_accounts(seed: u64) -> AccountNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..NODES)
        .map(|i| {
            let min = rng.gen_range(0.0..100.0);
            let max = min + rng.gen_range(1.0..200.0);
            let next = (i + 1) % NODES;
            let peer = (i + rng.gen_range(2..NODES)) % NODES;
            let split = rng.gen_range(10.0..90.0);
            let mut account = Account::new(format!("acct-{i}"), min, max)
                .allocate(format!("acct-{next}"), split);
            if peer != next {
                account = account.allocate(format!("acct-{peer}"), 100.0 - split);
            }
            account
        })
        .collect()
}

fn random_flow_nodes(seed: u64) -> FlowNetwork {
    let accounts = random_accounts(seed);
    let mut rng = StdRng::seed_from_u64(seed ^ 0xF10E);
    Network::new(
        accounts
            .into_participants()
            .into_iter()
            .map(|a| {
                let mut node = FlowNode::new(a.id, a.min_threshold, a.max_threshold)
                    .with_inflow(rng.gen_range(0.0..a.max_threshold));
                node.allocations = a.allocations;
                node
            })
            .collect(),
    )
}

fn bench_zone(c: &mut Criterion) {
    c.bench_function("zone_outflow", |b| {
        b.iter(|| calculate_outflow(black_box(275.0), black_box(100.0), black_box(300.0)))
    });
}

fn bench_distribute(c: &mut Criterion) {
    let engine = DistributionEngine::default();
    let network = random_accounts(7);
    let funding = network.iter().map(|a| a.max_threshold).sum::<f64>() * 0.8;

    c.bench_function("distribute_200", |b| {
        b.iter(|| engine.distribute(black_box(&network), black_box(funding)))
    });
}

fn bench_equilibrium(c: &mut Criterion) {
    let engine = EquilibriumEngine::default();
    let network = random_flow_nodes(7);

    c.bench_function("equilibrium_200", |b| {
        b.iter(|| engine.solve(black_box(&network)))
    });
}

criterion_group!(benches, bench_zone, bench_distribute, bench_equilibrium);
criterion_main!(benches);
