// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::rc::Rc;

use dsim_components::client::Client;
use dsim_components::echo::Echo;
use dsim_components::test_helpers::{call, client_and, replies};
use dsim_engine::message::{Address, Event};
use dsim_engine::simulator::Simulator;
use dsim_engine::test_helpers::start_test;
use dsim_engine::time::INFINITY;

#[test]
fn same_time_is_fifo_and_interrupts_first() {
    let tree = start_test(file!());
    let (mut sim, client, echo) = client_and(tree, "echo", Echo::new(10.0));

    let first = call(&mut sim, client, 5.0, "echo", "a");
    let second = call(&mut sim, client, 5.0, "echo", "b");
    let interrupt = sim.request_interrupt_in(echo, 5.0).unwrap();

    let mut order = Vec::new();
    while let Some(event) = sim.step_next().unwrap() {
        order.push(event.id());
    }
    let replies = replies(&sim, client);
    assert_eq!(
        order,
        vec![
            interrupt.id,
            first.id,
            second.id,
            replies[0].id,
            replies[1].id
        ]
    );
    assert_eq!(replies[0].response_to().id, first.id);
    assert_eq!(sim.now(), 15.0);
}

#[test]
fn interrupts_collapse_within_a_moment() {
    let tree = start_test(file!());
    let (mut sim, _, echo) = client_and(tree, "echo", Echo::default());

    sim.request_interrupt_in(echo, 5.0).unwrap();
    sim.request_interrupt_in(echo, 5.0).unwrap();
    sim.request_interrupt_in(echo, 6.0).unwrap();
    assert_eq!(sim.num_pending(), 2);
    assert_eq!(sim.next_event_time(), 5.0);
    assert_eq!(sim.run_until_idle(10).unwrap(), 2);
    assert_eq!(sim.next_event_time(), INFINITY);
}

#[test]
fn hooks_see_every_event_once() {
    let tree = start_test(file!());
    let (mut sim, client, echo) = client_and(tree, "echo", Echo::default());

    let log = Rc::new(RefCell::new(Vec::new()));
    let sends = log.clone();
    sim.on_send_processed(move |send| sends.borrow_mut().push(format!("send {}", send.id)));
    let replies_seen = log.clone();
    sim.on_reply_processed(move |reply| {
        replies_seen.borrow_mut().push(format!("reply {}", reply.id));
    });
    let interrupts = log.clone();
    sim.on_interrupt_processed(move |i| interrupts.borrow_mut().push(format!("interrupt {}", i.id)));
    let injected = Rc::new(RefCell::new(0));
    let count = injected.clone();
    sim.on_injected(move |_| *count.borrow_mut() += 1);

    let send = call(&mut sim, client, 1.0, "echo", "ping");
    let interrupt = sim.request_interrupt_in(echo, 3.0).unwrap();
    sim.run_until_idle(10).unwrap();

    let replies = replies(&sim, client);
    let reply = &replies[0];
    assert_eq!(
        *log.borrow(),
        vec![
            format!("send {}", send.id),
            format!("interrupt {}", interrupt.id),
            format!("reply {}", reply.id),
        ]
    );
    assert_eq!(*injected.borrow(), 3);
}

#[test]
fn step_limits() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "echo", Echo::new(100.0));
    for t in [0.0, 10.0, 20.0, 30.0] {
        call(&mut sim, client, t, "echo", "ping");
    }

    // Both limits zero delivers exactly one event
    assert_eq!(sim.step(0.0, 0).unwrap(), 1);
    assert_eq!(sim.now(), 0.0);

    // Up to two events
    assert_eq!(sim.step(0.0, 2).unwrap(), 2);
    assert_eq!(sim.now(), 20.0);

    // Everything within 75ns of the next event (30): the send at 30 and the
    // reply at 100
    assert_eq!(sim.step(75.0, 0).unwrap(), 2);
    assert_eq!(sim.now(), 100.0);

    assert_eq!(sim.run_until_idle(100).unwrap(), 3);
    assert_eq!(sim.step(0.0, 0).unwrap(), 0);
    assert_eq!(replies(&sim, client).len(), 4);
}

#[test]
fn run_for_advances_time() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "echo", Echo::new(10.0));
    call(&mut sim, client, 5.0, "echo", "ping");

    assert_eq!(sim.run_for(12.0).unwrap(), 1);
    assert_eq!(sim.now(), 12.0);
    assert_eq!(sim.run_for(100.0).unwrap(), 1);
    assert_eq!(sim.now(), 112.0);
    assert!(sim.is_idle());
}

#[test]
fn past_events_are_rejected() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "echo", Echo::new(10.0));
    call(&mut sim, client, 50.0, "echo", "ping");
    sim.run_until_idle(10).unwrap();

    let err = sim
        .send_at(client, 10.0, Address::new("echo", "ping"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Error: New message time in the past");
    assert!(sim.send_at(client, 60.0, Address::new("echo", "ping")).is_ok());
}

#[test]
fn reset_clears_everything() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "echo", Echo::new(10.0));
    call(&mut sim, client, 50.0, "echo", "ping");
    call(&mut sim, client, 500.0, "echo", "ping");
    sim.step(0.0, 2).unwrap();
    assert_eq!(sim.now(), 60.0);

    sim.reset();
    assert_eq!(sim.now(), 0.0);
    assert!(sim.is_idle());
    assert!(replies(&sim, client).is_empty());

    // Early times can be used again
    call(&mut sim, client, 1.0, "echo", "ping");
    sim.run_until_idle(10).unwrap();
    assert_eq!(replies(&sim, client)[0].time, 11.0);
}

#[test]
fn unresolvable_send_stops_the_run() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "echo", Echo::default());
    call(&mut sim, client, 1.0, "nobody", "ping");

    let err = sim.step_next().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error: Cannot find nextActor by name () or by address (nobody, ping)"
    );
}

#[test]
fn leaves_reject_unexpected_messages() {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let a = tree.new_leaf("a", Client::new());
    let b = tree.new_leaf("b", Client::new());
    tree.add(net, a).unwrap();
    tree.add(net, b).unwrap();
    let mut sim = Simulator::new(tree);

    call(&mut sim, a, 1.0, "b", "ping");
    let err = sim.step_next().unwrap_err();
    assert_eq!(err.to_string(), "Error: Sends not allowed for this actor");
}

#[test]
fn sends_are_owned_by_their_source() {
    let tree = start_test(file!());
    let (mut sim, client, echo) = client_and(tree, "echo", Echo::default());
    let send = dsim_engine::message::Send::new(echo, 1.0, Address::new("echo", "x"));
    let err = sim.forward_send(client, send).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error: Cannot send messages whose source is not this."
    );

    let err = sim
        .inject(Event::Interrupt(dsim_engine::message::Interrupt::new(
            echo,
            f64::NAN,
        )))
        .unwrap_err();
    assert_eq!(err.to_string(), "Error: New message time in the past");
}
