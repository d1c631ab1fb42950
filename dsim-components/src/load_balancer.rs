// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Spreads calls over a set of named targets.
//!
//! Each call is passed on, unchanged, to a target picked uniformly at random.
//! Targets are named and resolved from the load balancer's position in the
//! tree, so they are normally its siblings.

use std::rc::Rc;

use dsim_engine::message::{Reply, Send};
use dsim_engine::processor::Processor;
use dsim_engine::system::NO_DESTINATION;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;
use dsim_track::trace;

#[derive(Clone, Properties)]
pub struct LoadBalancer {
    #[property(default = 1e6, min = 0, units = "ns")]
    pub forwarding_latency: SimTime,

    targets: Vec<String>,
}

impl LoadBalancer {
    pub fn add(&mut self, target: &str) -> &mut Self {
        self.targets.push(target.to_string());
        self
    }

    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

impl Processor for LoadBalancer {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        if self.targets.is_empty() {
            ctx.reply_to_send(&send, 0.0, Some(NO_DESTINATION))?;
            return Ok(());
        }
        let index = ctx.random(self.targets.len() as u64) as usize;
        let target = &self.targets[index];
        trace!(ctx.entity() ; "{} to {target}", send.id);
        let out = send.spawn(ctx.me(), ctx.now() + self.forwarding_latency, None)?;
        out.set_next_actor_name(target);
        ctx.forward_send(out)
    }

    fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        ctx.forward_reply(&reply, 0.0)?;
        Ok(())
    }
}
