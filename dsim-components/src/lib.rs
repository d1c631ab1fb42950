// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A library of leaf components for DSim models.
//!
//! Each component implements the
//! [`Processor`](dsim_engine::processor::Processor) trait and declares its
//! configurable values as properties so that they can be read and written by
//! name once the component is in a [`Tree`](dsim_engine::tree::Tree).
//!
//! | Component | Handles |
//! |-----------|---------|
//! | [`busy::Busy`] | any method, replies after a fixed wait |
//! | [`call::Call`] | any method, calls a fixed address and relays the reply |
//! | [`client::Client`] | replies only, records what comes back |
//! | [`db_index`] | `insert`, `deleteByOffset`, `scan`, `findEquals`, `rangeSearch` |
//! | [`db_node::DbNode`] | `get`, `put` |
//! | [`echo::Echo`] | any method, replies after a latency |
//! | [`generator::Generator`] | replies only, generates load on interrupts |
//! | [`load_balancer::LoadBalancer`] | any method, forwards to a random target |
//! | [`storage::Storage`] | `read`, `write` |

pub mod busy;
pub mod call;
pub mod client;
pub mod db_index;
pub mod db_node;
pub mod echo;
pub mod generator;
pub mod load_balancer;
pub mod sizes;
pub mod storage;
pub mod test_helpers;

/// Reason given by leaves for a method they do not implement.
#[must_use]
pub fn invalid_method(method: &str) -> String {
    format!("Invalid method: {method}")
}
