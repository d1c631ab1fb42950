// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use dsim_components::client::Client;
use dsim_components::echo::Echo;
use dsim_components::load_balancer::LoadBalancer;
use dsim_components::test_helpers::{call, replies};
use dsim_engine::simulator::Simulator;
use dsim_engine::test_helpers::start_test;
use dsim_engine::time::millis;

#[test]
fn spreads_over_targets() {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let client = tree.new_leaf("client", Client::new());
    let mut balancer = LoadBalancer::default();
    balancer.add("a").add("b");
    let balancer = tree.new_leaf("lb", balancer);
    let a = tree.new_leaf("a", Echo::new(10.0));
    let b = tree.new_leaf("b", Echo::new(10.0));
    for child in [client, balancer, a, b] {
        tree.add(net, child).unwrap();
    }
    let mut sim = Simulator::new(tree);

    // Alternate between the two targets
    let mut next = 0;
    sim.set_random_source(move |max: u64| {
        next += 1;
        next % max
    });

    for i in 0..4 {
        call(&mut sim, client, 100.0 * f64::from(i), "lb", "get");
    }
    sim.run_until_idle(100).unwrap();

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 4);
    assert!(replies.iter().all(|r| !r.is_error()));
    assert_eq!(replies[0].time, millis(1.0) + 10.0);
    assert_eq!(sim.processor::<Echo>(a).unwrap().num_echoed(), 2);
    assert_eq!(sim.processor::<Echo>(b).unwrap().num_echoed(), 2);
}

#[test]
fn no_targets() {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let client = tree.new_leaf("client", Client::new());
    let balancer = tree.new_leaf("lb", LoadBalancer::default());
    tree.add(net, client).unwrap();
    tree.add(net, balancer).unwrap();
    let mut sim = Simulator::new(tree);

    call(&mut sim, client, 0.0, "lb", "get");
    sim.run_until_idle(100).unwrap();
    let replies = replies(&sim, client);
    assert_eq!(replies[0].error_reason(), Some("No destination found."));
}
