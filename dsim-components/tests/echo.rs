// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use dsim_components::echo::Echo;
use dsim_components::test_helpers::{call, client_and, replies};
use dsim_engine::test_helpers::start_test;

#[test]
fn echo_and_reset() {
    let tree = start_test(file!());
    let (mut sim, client, echo) = client_and(tree, "echo", Echo::default());

    call(&mut sim, client, 1.0, "echo", "ping");
    call(&mut sim, client, 2.0, "echo", "ping");
    sim.run_until_idle(100).unwrap();

    let times: Vec<f64> = replies(&sim, client).iter().map(|r| r.time).collect();
    assert_eq!(times, vec![11.0, 12.0]);
    assert_eq!(sim.processor::<Echo>(echo).unwrap().num_echoed(), 2);

    sim.reset();
    assert_eq!(sim.now(), 0.0);
    assert_eq!(sim.processor::<Echo>(echo).unwrap().num_echoed(), 0);
    assert!(replies(&sim, client).is_empty());
    assert_eq!(sim.tree().property(echo, "latency"), Some(10.0));
}
