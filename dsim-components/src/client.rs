// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The outside world.
//!
//! A `Client` makes root sends into a model and records everything it sent
//! and every reply that came back. It is normally placed next to the system
//! under test in a network so that its addresses resolve.

use std::rc::Rc;

use dsim_engine::message::{Address, Reply, Send};
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::{SimError, SimResult};
use dsim_engine::world::Context;
use dsim_model_builder::Properties;
use dsim_track::debug;

#[derive(Clone, Properties)]
pub struct Client {
    sent: Vec<Rc<Send>>,
    replies: Vec<Rc<Reply>>,
}

impl Client {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send to `address` at `time`. The address is resolved when the send
    /// is delivered.
    pub fn call(
        &mut self,
        ctx: &mut Context,
        time: SimTime,
        address: Address,
    ) -> Result<Rc<Send>, SimError> {
        let send = Send::new(ctx.me(), time, address);
        ctx.forward_send(send.clone())?;
        self.sent.push(send.clone());
        Ok(send)
    }

    #[must_use]
    pub fn sent(&self) -> &[Rc<Send>] {
        &self.sent
    }

    #[must_use]
    pub fn replies(&self) -> &[Rc<Reply>] {
        &self.replies
    }

    #[must_use]
    pub fn num_errors(&self) -> usize {
        self.replies.iter().filter(|reply| reply.is_error()).count()
    }
}

impl Processor for Client {
    fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        if let Some(reason) = reply.error_reason() {
            debug!(ctx.entity() ; "{} failed: {reason}", reply.response_to().id);
        }
        self.replies.push(reply);
        Ok(())
    }

    fn reset(&mut self) {
        self.sent.clear();
        self.replies.clear();
    }
}
