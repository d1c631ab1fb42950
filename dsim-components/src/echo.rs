// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Replies to every call after a fixed latency.

use std::rc::Rc;

use dsim_engine::message::Send;
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;

#[derive(Clone, Properties)]
pub struct Echo {
    #[property(default = 10, min = 0, units = "ns")]
    pub latency: SimTime,

    num_echoed: usize,
}

impl Echo {
    #[must_use]
    pub fn new(latency: SimTime) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn num_echoed(&self) -> usize {
        self.num_echoed
    }
}

impl Processor for Echo {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        ctx.reply_to_send(&send, self.latency, None)?;
        self.num_echoed += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.num_echoed = 0;
    }
}
