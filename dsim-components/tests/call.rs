// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::rc::Rc;

use dsim_components::call::Call;
use dsim_components::client::Client;
use dsim_components::echo::Echo;
use dsim_components::test_helpers::{call, client_and, replies};
use dsim_engine::simulator::Simulator;
use dsim_engine::test_helpers::start_test;

#[test]
fn relays_to_its_address() {
    let mut tree = start_test(file!());
    let net = tree.new_network("net");
    let client = tree.new_leaf("client", Client::new());
    let mut proxy = Call::new("backend", "lookup");
    proxy.call_latency = 3.0;
    proxy.reply_latency = 4.0;
    let proxy = tree.new_leaf("proxy", proxy);
    let backend = tree.new_leaf("backend", Echo::new(10.0));
    for child in [client, proxy, backend] {
        tree.add(net, child).unwrap();
    }
    let mut sim = Simulator::new(tree);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let hook_seen = seen.clone();
    sim.on_send_processed(move |send| hook_seen.borrow_mut().push(send.address.to_string()));

    let send = call(&mut sim, client, 20.0, "proxy", "get");
    sim.run_until_idle(100).unwrap();
    assert_eq!(*seen.borrow(), vec!["proxy.get", "backend.lookup"]);

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].response_to().id, send.id);
    assert_eq!(replies[0].time, 20.0 + 3.0 + 10.0 + 4.0);
    assert_eq!(sim.processor::<Echo>(backend).unwrap().num_echoed(), 1);
}

#[test]
fn missing_destination() {
    let tree = start_test(file!());
    let (mut sim, client, _) = client_and(tree, "proxy", Call::new("nowhere", "get"));

    call(&mut sim, client, 20.0, "proxy", "get");
    sim.run_until_idle(100).unwrap();

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].time, 20.0);
    assert_eq!(
        replies[0].error_reason(),
        Some("Cannot find destination: nowhere")
    );
}
