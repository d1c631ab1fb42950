// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use dsim_components::client::Client;
use dsim_components::echo::Echo;
use dsim_components::test_helpers::{call, replies};
use dsim_engine::simulator::Simulator;
use dsim_engine::system::{Queue, QueueDiagnostics};
use dsim_engine::test_helpers::start_test;
use dsim_engine::tree::ActorId;

/// A client calling an echo through a queue called `q`.
fn queued_echo(queue: Queue) -> (Simulator, ActorId, ActorId) {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let client = tree.new_leaf("client", Client::new());
    let q = tree.new_queue("q", queue);
    let echo = tree.new_leaf("echo", Echo::new(10.0));
    tree.set_target(q, echo).unwrap();
    tree.add(net, client).unwrap();
    tree.add(net, q).unwrap();
    (Simulator::new(tree), client, q)
}

#[test]
fn serves_queues_and_rejects() {
    let (mut sim, client, q) = queued_echo(Queue::new(1, 1));
    let sends: Vec<_> = (0..3).map(|_| call(&mut sim, client, 0.0, "q", "ping")).collect();

    assert_eq!(sim.step(0.0, 3).unwrap(), 3);
    assert_eq!(
        sim.queue_diagnostics(q).unwrap(),
        QueueDiagnostics {
            num_active_servers: 1,
            queue_size: 1
        }
    );
    sim.run_until_idle(100).unwrap();
    assert_eq!(sim.queue_diagnostics(q).unwrap(), QueueDiagnostics::default());

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0].response_to().id, sends[2].id);
    assert_eq!(replies[0].time, 0.0);
    assert_eq!(replies[0].error_reason(), Some("Queue Full"));
    assert_eq!(replies[1].response_to().id, sends[0].id);
    assert_eq!(replies[1].time, 10.0);
    assert_eq!(replies[2].response_to().id, sends[1].id);
    assert_eq!(replies[2].time, 20.0);
}

#[test]
fn servers_never_exceed_limit() {
    let (mut sim, client, q) = queued_echo(Queue::new(2, 0));
    for i in 0..10 {
        call(&mut sim, client, f64::from(i), "q", "ping");
    }
    while sim.step_next().unwrap().is_some() {
        let diagnostics = sim.queue_diagnostics(q).unwrap();
        assert!(diagnostics.num_active_servers <= 2);
    }

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 10);
    assert!(replies.iter().all(|r| !r.is_error()));
    // Two servers staggered by 1ns, 10ns per call
    assert_eq!(replies.last().unwrap().time, 51.0);
}

#[test]
fn more_servers_drain_immediately() {
    let (mut sim, client, q) = queued_echo(Queue::new(1, 0));
    for _ in 0..3 {
        call(&mut sim, client, 0.0, "q", "ping");
    }
    sim.step(0.0, 3).unwrap();
    assert_eq!(sim.queue_diagnostics(q).unwrap().queue_size, 2);

    sim.set_property(q, "max_servers", 3.0).unwrap();
    assert!(sim.set_property(q, "max_servers", 0.0).is_err());
    sim.run_until_idle(100).unwrap();

    let times: Vec<f64> = replies(&sim, client).iter().map(|r| r.time).collect();
    assert_eq!(times, vec![10.0, 10.0, 10.0]);
}

#[test]
fn no_target() {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let client = tree.new_leaf("client", Client::new());
    let q = tree.new_queue("q", Queue::default());
    tree.add(net, client).unwrap();
    tree.add(net, q).unwrap();
    let mut sim = Simulator::new(tree);

    call(&mut sim, client, 0.0, "q", "ping");
    sim.run_until_idle(10).unwrap();
    assert_eq!(
        replies(&sim, client)[0].error_reason(),
        Some("No destination found.")
    );
    assert_eq!(sim.queue_diagnostics(q).unwrap(), QueueDiagnostics::default());
}

#[test]
fn capacities_are_whole_numbers() {
    let (mut sim, _, q) = queued_echo(Queue::new(2, 5));

    assert_eq!(
        sim.set_property(q, "max_servers", 1.5)
            .unwrap_err()
            .to_string(),
        "Error: max_servers must be a whole number, got 1.5"
    );
    assert!(sim.set_property(q, "max_queue_size", 0.5).is_err());
    assert!(sim.set_property(q, "max_queue_size", -1.0).is_err());
    assert_eq!(sim.tree().property(q, "max_servers"), Some(2.0));
    assert_eq!(sim.tree().property(q, "max_queue_size"), Some(5.0));

    sim.set_property(q, "max_queue_size", 0.0).unwrap();
    assert_eq!(sim.tree().property(q, "max_queue_size"), Some(0.0));

    let spec = sim.tree().property_specs(q)[0];
    assert_eq!(spec.name, "max_servers");
    assert!(spec.integer);
}
