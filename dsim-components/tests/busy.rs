// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use dsim_components::busy::{Busy, UNAVAILABLE};
use dsim_components::test_helpers::{call, client_and, replies};
use dsim_engine::test_helpers::start_test;

#[test]
fn replies_after_wait() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "cpu", Busy::new(25.0));

    call(&mut sim, client, 5.0, "cpu", "anything");
    sim.run_until_idle(100).unwrap();

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].time, 30.0);
    assert!(!replies[0].is_error());
}

#[test]
fn unavailable() {
    let tree = start_test(file!());
    let (mut sim, client, cpu) = client_and(tree, "cpu", Busy::default());
    sim.set_property(cpu, "availability", 0.25).unwrap();
    assert!(sim.set_property(cpu, "availability", 1.5).is_err());

    let mut draws = vec![100_000, 900_000].into_iter();
    sim.set_random_source(move |_max: u64| draws.next().unwrap_or(0));

    call(&mut sim, client, 5.0, "cpu", "work");
    call(&mut sim, client, 6.0, "cpu", "work");
    sim.run_until_idle(100).unwrap();

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].time, 6.0);
    assert_eq!(replies[0].error_reason(), Some(UNAVAILABLE));
    assert_eq!(replies[1].time, 15.0);
    assert!(!replies[1].is_error());
}
