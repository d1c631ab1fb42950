// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A key-value database node.
//!
//! Serves `get` and `put` after their configured latencies. A percentage of
//! calls, chosen at random, fail straight away with `Random Failure`.

use std::rc::Rc;

use dsim_engine::message::Send;
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;

use crate::invalid_method;

/// Reason given for an injected failure.
pub const RANDOM_FAILURE: &str = "Random Failure";

#[derive(Clone, Properties)]
pub struct DbNode {
    #[property(default = 50, min = 0, units = "ns")]
    pub put_latency: SimTime,

    #[property(default = 10, min = 0, units = "ns")]
    pub get_latency: SimTime,

    /// Percentage of calls that fail.
    #[property(default = 0, min = 0, max = 100, units = "%")]
    pub failure_rate: f64,
}

impl DbNode {
    #[must_use]
    pub fn new(put_latency: SimTime, get_latency: SimTime) -> Self {
        Self {
            put_latency,
            get_latency,
            ..Default::default()
        }
    }
}

impl Processor for DbNode {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        let method = send.address.method.as_str();
        if (ctx.random(1_000_000) as f64) < self.failure_rate * 10_000.0 {
            ctx.reply_to_send(&send, 0.0, Some(RANDOM_FAILURE))?;
            return Ok(());
        }
        match method {
            "get" => ctx.reply_to_send(&send, self.get_latency, None)?,
            "put" => ctx.reply_to_send(&send, self.put_latency, None)?,
            _ => ctx.reply_to_send(&send, 0.0, Some(&invalid_method(method)))?,
        };
        Ok(())
    }
}
