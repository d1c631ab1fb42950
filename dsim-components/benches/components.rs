// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

/// Benchmark models built from the standard components.
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use dsim_components::call::Call;
use dsim_components::db_node::DbNode;
use dsim_components::generator::Generator;
use dsim_engine::simulator::Simulator;
use dsim_engine::system::Queue;
use dsim_engine::time::secs;
use dsim_engine::tree::{ActorId, Tree};
use dsim_track::tracker::dev_null_tracker;

fn create_tree() -> Tree {
    // Create a tree without the tracker system opening files for logging
    let tracker = dev_null_tracker();
    Tree::new(&tracker)
}

fn start(mut sim: Simulator, generator: ActorId) -> Simulator {
    sim.invoke::<Generator, _>(generator, |g, ctx| g.start(ctx))
        .unwrap();
    sim
}

fn run_ten_seconds(mut sim: Simulator) {
    sim.run_for(secs(10.0)).unwrap();
}

fn generator_db(target_qps: f64) -> Simulator {
    let mut tree = create_tree();
    let net = tree.new_network("net");
    let mut generator = Generator::new();
    generator.add("db", "get", 3).add("db", "put", 1);
    let generator = tree.new_leaf("load", generator);
    let db = tree.new_leaf("db", DbNode::default());
    tree.add(net, generator).unwrap();
    tree.add(net, db).unwrap();

    let mut sim = Simulator::new(tree);
    sim.set_property(generator, "target_qps", target_qps)
        .unwrap();
    // Skip the ramp
    sim.tree_mut()
        .processor_mut::<Generator>(generator)
        .unwrap()
        .set_current_qps(target_qps);
    start(sim, generator)
}

fn generator_queue_series(target_qps: f64) -> Simulator {
    let mut tree = create_tree();
    let net = tree.new_network("net");
    let mut generator = Generator::new();
    generator.add("service", "create", 1);
    let generator = tree.new_leaf("load", generator);

    let service = tree.new_queue("service", Queue::new(4, 0));
    let steps = tree.new_series("steps");
    tree.set_target(service, steps).unwrap();
    for i in 0..3 {
        let call = tree.new_leaf(&format!("call{i}"), Call::new("db", "put"));
        tree.push(steps, call).unwrap();
    }
    let db = tree.new_leaf("db", DbNode::default());
    for child in [generator, service, db] {
        tree.add(net, child).unwrap();
    }

    let mut sim = Simulator::new(tree);
    sim.set_property(generator, "target_qps", target_qps)
        .unwrap();
    start(sim, generator)
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("models");

    group.bench_function("generator_db_1k_qps", |b| {
        b.iter_batched(|| generator_db(1000.0), run_ten_seconds, BatchSize::SmallInput);
    });

    group.bench_function("generator_queue_series_ramp", |b| {
        b.iter_batched(
            || generator_queue_series(500.0),
            run_ten_seconds,
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_models
}
criterion_main!(benches);
