// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Admission control in front of a target.
//!
//! A queue lets up to `max_servers` sends be in progress at its target at
//! once. Further sends wait in FIFO order, up to `max_queue_size` of them
//! (0 means no limit); beyond that a send is rejected straight away with a
//! `Queue Full` error reply. Each reply from the target frees a server and
//! the queue is drained as far as the servers allow.
//!
//! An interrupt also drains the queue, so raising `max_servers` takes effect
//! without waiting for the next reply.

use std::collections::VecDeque;
use std::rc::Rc;

use dsim_model_builder::Properties;
use dsim_track::{debug, trace};

use super::decorator;
use crate::message::{Reply, Send};
use crate::sim_error;
use crate::types::{SimError, SimResult};
use crate::world::Context;

/// Reason given when a send is rejected.
pub const QUEUE_FULL: &str = "Queue Full";

#[derive(Properties)]
pub struct Queue {
    /// How many sends may be in progress at the target at once.
    #[property(default = 1, min = 1, units = "servers")]
    pub max_servers: usize,

    /// How many sends may wait. 0 means unbounded.
    #[property(default = 100, min = 0, units = "sends")]
    pub max_queue_size: usize,

    pending: VecDeque<Rc<Send>>,
    num_active_servers: usize,
}

/// A snapshot of the state of a [`Queue`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDiagnostics {
    pub num_active_servers: usize,
    pub queue_size: usize,
}

impl Queue {
    #[must_use]
    pub fn new(max_servers: usize, max_queue_size: usize) -> Self {
        Self {
            max_servers,
            max_queue_size,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> QueueDiagnostics {
        QueueDiagnostics {
            num_active_servers: self.num_active_servers,
            queue_size: self.pending.len(),
        }
    }

    fn is_full(&self) -> bool {
        self.max_queue_size > 0 && self.pending.len() >= self.max_queue_size
    }

    pub(crate) fn route_send_to_child(
        &mut self,
        send: &Rc<Send>,
        ctx: &mut Context,
    ) -> Result<bool, SimError> {
        self.drain(ctx)?;
        if self.num_active_servers < self.max_servers {
            self.serve(send, ctx)?;
        } else if self.is_full() {
            debug!(ctx.entity() ; "rejecting {}, {} waiting", send.id, self.pending.len());
            ctx.reply_to_send(send, 0.0, Some(QUEUE_FULL))?;
        } else {
            trace!(ctx.entity() ; "queueing {}", send.id);
            self.pending.push_back(send.clone());
        }
        Ok(true)
    }

    pub(crate) fn process_reply_from_child(
        &mut self,
        reply: &Rc<Reply>,
        ctx: &mut Context,
    ) -> SimResult {
        ctx.forward_reply(reply, 0.0)?;
        self.release()?;
        self.drain(ctx)
    }

    /// Serve waiting sends while there are free servers.
    pub(crate) fn drain(&mut self, ctx: &mut Context) -> SimResult {
        while self.num_active_servers < self.max_servers {
            let Some(send) = self.pending.pop_front() else {
                break;
            };
            self.serve(&send, ctx)?;
        }
        Ok(())
    }

    fn serve(&mut self, send: &Rc<Send>, ctx: &mut Context) -> SimResult {
        self.num_active_servers += 1;
        if !decorator::route_send_to_child(send, ctx)? {
            self.num_active_servers -= 1;
            ctx.reply_to_send(send, 0.0, Some(super::NO_DESTINATION))?;
        }
        Ok(())
    }

    fn release(&mut self) -> SimResult {
        if self.num_active_servers == 0 {
            return sim_error!("Num active servers must be +ve");
        }
        self.num_active_servers -= 1;
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.pending.clear();
        self.num_active_servers = 0;
    }

    pub(crate) fn clone_fresh(&self) -> Self {
        Self::new(self.max_servers, self.max_queue_size)
    }
}
