// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Opaque work that takes some time.
//!
//! A `Busy` stands in for a leaf call that has no further dependencies, such
//! as a burst of CPU time. It only responds when called.

use std::rc::Rc;

use dsim_engine::message::Send;
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;

/// Reason given when a call lands while the component is unavailable.
pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Clone, Properties)]
pub struct Busy {
    #[property(default = 10, min = 0, units = "ns")]
    pub wait_time: SimTime,

    /// Fraction of calls that are served.
    #[property(default = 1, min = 0, max = 1)]
    pub availability: f64,
}

impl Busy {
    #[must_use]
    pub fn new(wait_time: SimTime) -> Self {
        Self {
            wait_time,
            ..Default::default()
        }
    }
}

impl Processor for Busy {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        if self.availability < 1.0 && (ctx.random(1_000_000) as f64) >= self.availability * 1e6 {
            ctx.reply_to_send(&send, 0.0, Some(UNAVAILABLE))?;
        } else {
            ctx.reply_to_send(&send, self.wait_time, None)?;
        }
        Ok(())
    }
}
