// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A component that calls another one.
//!
//! Whatever method a `Call` is invoked with, it calls its own fixed
//! [`Address`] and relays the reply back to its caller. The address is
//! resolved from the call's position in the tree each time it is used, so
//! the same `Call` can be cloned into different parts of a model.

use std::rc::Rc;

use dsim_engine::message::{Address, Reply, Send};
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;
use dsim_track::trace;

#[derive(Clone, Properties)]
pub struct Call {
    /// Time taken to pass the call downstream.
    #[property(default = 0, min = 0, units = "ns")]
    pub call_latency: SimTime,

    /// Time taken to pass the reply back upstream.
    #[property(default = 0, min = 0, units = "ns")]
    pub reply_latency: SimTime,

    address: Address,
}

impl Call {
    #[must_use]
    pub fn new(dest: &str, method: &str) -> Self {
        Self {
            address: Address::new(dest, method),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl Processor for Call {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        let Some(next) = ctx.resolve_address(&self.address) else {
            let reason = format!("Cannot find destination: {}", self.address.dest);
            ctx.reply_to_send(&send, 0.0, Some(&reason))?;
            return Ok(());
        };
        trace!(ctx.entity() ; "{} calls {}", send.id, self.address);
        let out = send
            .spawn(
                ctx.me(),
                ctx.now() + self.call_latency,
                Some(self.address.clone()),
            )?
            .with_next_actor(next)?;
        ctx.forward_send(out)
    }

    fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        ctx.forward_reply(&reply, self.reply_latency)?;
        Ok(())
    }
}
