// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A disk.
//!
//! Serves `read` and `write` after their latencies. Each call fails with
//! probability `failure_rate`.

use std::rc::Rc;

use dsim_engine::message::Send;
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;

use crate::db_node::RANDOM_FAILURE;
use crate::invalid_method;

#[derive(Clone, Properties)]
pub struct Storage {
    /// Bytes the disk can hold.
    #[property(default = 0, min = 0, units = "bytes")]
    pub capacity: f64,

    #[property(default = 10e6, min = 0, units = "ns")]
    pub read_latency: SimTime,

    #[property(default = 30e6, min = 0, units = "ns")]
    pub write_latency: SimTime,

    #[property(default = 0.01, min = 0, max = 1)]
    pub failure_rate: f64,
}

impl Processor for Storage {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        let method = send.address.method.as_str();
        let latency = match method {
            "read" => self.read_latency,
            "write" => self.write_latency,
            _ => {
                ctx.reply_to_send(&send, 0.0, Some(&invalid_method(method)))?;
                return Ok(());
            }
        };
        if (ctx.random(1_000_000) as f64) < self.failure_rate * 1e6 {
            ctx.reply_to_send(&send, latency, Some(RANDOM_FAILURE))?;
        } else {
            ctx.reply_to_send(&send, latency, None)?;
        }
        Ok(())
    }
}
