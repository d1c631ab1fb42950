// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

// TODO: enable this warning to ensure all public interfaces are documented.
// Enable warnings for missing documentation
// #![warn(missing_docs)]

#![doc(test(attr(warn(unused))))]

//! `DSim` - a discrete-event simulator for distributed-system designs
//!
//! This library provides the simulation kernel: a [tree](crate::tree) of
//! components that exchange [messages](crate::message), a time-ordered
//! [event list](crate::event_list) and the [simulator](crate::simulator)
//! that drives them. The leaf components used to build models live in the
//! [dsim-components](../dsim_components/index.html) crate.
//!
//! # Model
//!
//! A model is a tree of components. Leaves implement the
//! [`Processor`](crate::processor::Processor) trait; containers pick one of
//! a fixed set of routing [policies](crate::system):
//!
//!  - **series**: pass a request through each child in turn.
//!  - **parallel**: fan a request out to every child.
//!  - **network** / **router**: route requests to named children.
//!  - **decorator**: wrap one child, optionally with a
//!    [queue](crate::system::queue) or a [timeout](crate::system::timeout).
//!
//! Requests are [`Send`](crate::message::Send)s addressed by component name
//! and method. They are resolved late, walking up the tree from the caller,
//! and every hop spawns a new send linked to the one it came from. Each send
//! is answered by exactly one [`Reply`](crate::message::Reply), which
//! unwinds back along the same path.
//!
//! Simulated failures (full queues, timeouts, unroutable requests, injected
//! faults) are error replies. A [`SimError`](crate::types::SimError) means
//! the model itself is broken and stops the run.
//!
//! # Simple Application
//!
//! ```rust
//! use dsim_engine::message::{Address, Send};
//! use dsim_engine::simulator::Simulator;
//! use dsim_engine::test_helpers::start_test;
//! use dsim_engine::tree::ActorId;
//!
//! let mut tree = start_test(file!());
//! let net = tree.new_network("net");
//! let series = tree.new_series("steps");
//! tree.add(net, series).unwrap();
//! tree.forward_input_by_name(net, "*", "steps", None).unwrap();
//!
//! let mut sim = Simulator::new(tree);
//! let caller = ActorId::next();
//! let send = Send::new(caller, 0.0, Address::new("net", "run"))
//!     .with_next_actor(net)
//!     .unwrap();
//! sim.forward_send(caller, send.clone()).unwrap();
//! assert_eq!(sim.step(0.0, 3).unwrap(), 3);
//!
//! // The empty series could not route the request
//! let reply = send.reply().unwrap();
//! assert_eq!(reply.error_reason(), Some("No destination found."));
//! ```

extern crate self as dsim_engine;

pub mod event_list;
pub mod message;
pub mod processor;
pub mod property;
pub mod random;
pub mod simulator;
pub mod system;
pub mod test_helpers;
pub mod time;
pub mod tree;
pub mod types;
pub mod world;
