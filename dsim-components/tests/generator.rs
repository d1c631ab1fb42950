// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::rc::Rc;

use dsim_components::echo::Echo;
use dsim_components::generator::Generator;
use dsim_engine::simulator::Simulator;
use dsim_engine::test_helpers::start_test;
use dsim_engine::time::{ONE_SEC, secs};
use dsim_engine::tree::ActorId;

fn generator_and_echo(dest: &str) -> (Simulator, ActorId, ActorId) {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let mut generator = Generator::new();
    generator.add(dest, "get", 1);
    let generator = tree.new_leaf("load", generator);
    let echo = tree.new_leaf("echo", Echo::new(10.0));
    tree.add(net, generator).unwrap();
    tree.add(net, echo).unwrap();

    let mut sim = Simulator::new(tree);
    sim.set_random_source(|max: u64| max / 2);
    (sim, generator, echo)
}

#[test]
fn rounds_ramp_up() {
    let (mut sim, generator, echo) = generator_and_echo("echo");
    sim.set_property(generator, "target_qps", 3.0).unwrap();

    let labels = Rc::new(RefCell::new(Vec::new()));
    let hook_labels = labels.clone();
    sim.on_send_processed(move |send| hook_labels.borrow_mut().push(send.label()));

    sim.invoke::<Generator, _>(generator, |g, ctx| g.start(ctx))
        .unwrap();
    sim.run_for(secs(2.0) + ONE_SEC / 2.0 + 100.0).unwrap();

    let g = sim.processor::<Generator>(generator).unwrap();
    assert_eq!(g.round(), 3);
    assert_eq!(g.current_qps(), 3.0);
    assert_eq!(g.num_replies(), 6);
    assert_eq!(g.num_errors(), 0);
    assert_eq!(sim.processor::<Echo>(echo).unwrap().num_echoed(), 6);
    assert_eq!(
        *labels.borrow(),
        vec![
            "Round: 1, Message: 0",
            "Round: 2, Message: 0",
            "Round: 2, Message: 1",
            "Round: 3, Message: 0",
            "Round: 3, Message: 1",
            "Round: 3, Message: 2",
        ]
    );
}

#[test]
fn start_is_idempotent_and_stop_ends_rounds() {
    let (mut sim, generator, _) = generator_and_echo("echo");

    for _ in 0..2 {
        sim.invoke::<Generator, _>(generator, |g, ctx| g.start(ctx))
            .unwrap();
    }
    assert_eq!(sim.num_pending(), 1);

    sim.run_for(ONE_SEC / 2.0 + 100.0).unwrap();
    assert_eq!(sim.processor::<Generator>(generator).unwrap().round(), 1);

    sim.invoke::<Generator, _>(generator, |g, _| {
        g.stop();
        Ok(())
    })
    .unwrap();
    sim.run_until_idle(100).unwrap();
    assert!(sim.is_idle());
    assert_eq!(sim.processor::<Generator>(generator).unwrap().round(), 1);
}

#[test]
fn unknown_destination_is_fatal() {
    let (mut sim, generator, _) = generator_and_echo("missing");
    sim.invoke::<Generator, _>(generator, |g, ctx| g.start(ctx))
        .unwrap();
    let err = sim.run_until_idle(100).unwrap_err();
    assert_eq!(err.to_string(), "Error: Cannot find destination: missing");
}

#[test]
fn cloned_generator_calls_its_own_destinations() {
    let mut tree = start_test(file!());
    let system = tree.new_network("system");
    let net = tree.new_network("net");
    let mut generator = Generator::new();
    generator.add("echo", "get", 1);
    let generator = tree.new_leaf("load", generator);
    let echo = tree.new_leaf("echo", Echo::new(10.0));
    tree.add(net, generator).unwrap();
    tree.add(net, echo).unwrap();
    tree.add(system, net).unwrap();

    let mut sim = Simulator::new(tree);
    sim.set_random_source(|max: u64| max / 2);

    // Resolve the destination in the original subtree first
    sim.invoke::<Generator, _>(generator, |g, ctx| g.start(ctx))
        .unwrap();
    sim.run_for(ONE_SEC / 2.0 + 100.0).unwrap();
    sim.invoke::<Generator, _>(generator, |g, _| {
        g.stop();
        Ok(())
    })
    .unwrap();
    sim.run_until_idle(100).unwrap();
    assert_eq!(sim.processor::<Echo>(echo).unwrap().num_echoed(), 1);

    let copy = sim.tree_mut().clone_subtree(net, "net2").unwrap();
    sim.tree_mut().add(system, copy).unwrap();
    let generator_copy = sim.tree().child_named(copy, "load").unwrap();
    let echo_copy = sim.tree().child_named(copy, "echo").unwrap();
    assert!(!sim.processor::<Generator>(generator_copy).unwrap().started());

    sim.invoke::<Generator, _>(generator_copy, |g, ctx| g.start(ctx))
        .unwrap();
    sim.run_for(ONE_SEC / 2.0 + 100.0).unwrap();

    assert_eq!(sim.processor::<Echo>(echo_copy).unwrap().num_echoed(), 1);
    assert_eq!(sim.processor::<Echo>(echo).unwrap().num_echoed(), 1);
    assert_eq!(
        sim.processor::<Generator>(generator_copy)
            .unwrap()
            .num_replies(),
        1
    );
}
