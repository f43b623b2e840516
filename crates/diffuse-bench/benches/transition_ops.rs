//! Criterion benchmarks for single transitions and full runs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use diffuse_bench::{flood_profile, gossip_profile, scale_free_network};
use diffuse_core::SimulationState;

fn bench_flood_transition_1k(c: &mut Criterion) {
    let data = scale_free_network(1_000, 4, 42).unwrap();
    let (mut protocol, _) = flood_profile(42, 10).build().unwrap();
    let mut state = SimulationState::initialize(&data).unwrap();

    // Advance a few iterations so inboxes are populated.
    for _ in 0..3 {
        let t = protocol.transition(&data, &state).unwrap();
        state = t.state;
    }

    c.bench_function("flood_transition_1k", |b| {
        b.iter(|| {
            let t = protocol.transition(&data, &state).unwrap();
            black_box(&t);
        });
    });
}

fn bench_gossip_transition_1k(c: &mut Criterion) {
    let data = scale_free_network(1_000, 4, 42).unwrap();
    let (mut protocol, _) = gossip_profile(42, 10).build().unwrap();
    let mut state = SimulationState::initialize(&data).unwrap();
    for _ in 0..3 {
        let t = protocol.transition(&data, &state).unwrap();
        state = t.state;
    }

    c.bench_function("gossip_transition_1k", |b| {
        b.iter(|| {
            let t = protocol.transition(&data, &state).unwrap();
            black_box(&t);
        });
    });
}

fn bench_gossip_run_10k(c: &mut Criterion) {
    let data = scale_free_network(10_000, 3, 7).unwrap();
    let config = gossip_profile(7, 20);

    let mut group = c.benchmark_group("gossip_run");
    group.sample_size(10);
    group.bench_function("10k_users_20_iterations", |b| {
        b.iter(|| {
            let mut sim = config.simulator().unwrap();
            sim.initialize(&data).unwrap();
            sim.run().unwrap();
            black_box(sim.into_simulation());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_flood_transition_1k,
    bench_gossip_transition_1k,
    bench_gossip_run_10k
);
criterion_main!(benches);
