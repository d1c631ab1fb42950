// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Scaffolding shared by the component tests and benchmarks.

use std::rc::Rc;

use dsim_engine::message::{Address, Reply, Send};
use dsim_engine::processor::Processor;
use dsim_engine::simulator::Simulator;
use dsim_engine::time::SimTime;
use dsim_engine::tree::{ActorId, Tree};

use crate::client::Client;

/// Put a [`Client`] and `leaf` side by side in a network called `net` and
/// build a simulator for them.
///
/// Returns the simulator, the client and the leaf.
pub fn client_and<P>(mut tree: Tree, name: &str, leaf: P) -> (Simulator, ActorId, ActorId)
where
    P: Processor + 'static,
{
    let net = tree.new_network("net");
    let client = tree.new_leaf("client", Client::new());
    let leaf = tree.new_leaf(name, leaf);
    tree.add(net, client).unwrap();
    tree.add(net, leaf).unwrap();
    (Simulator::new(tree), client, leaf)
}

/// Have `client` call `dest.method` at `time`.
pub fn call(
    sim: &mut Simulator,
    client: ActorId,
    time: SimTime,
    dest: &str,
    method: &str,
) -> Rc<Send> {
    sim.invoke::<Client, _>(client, |c, ctx| {
        c.call(ctx, time, Address::new(dest, method))
    })
    .unwrap()
}

/// The replies `client` has received so far.
#[must_use]
pub fn replies(sim: &Simulator, client: ActorId) -> Vec<Rc<Reply>> {
    sim.processor::<Client>(client).unwrap().replies().to_vec()
}
