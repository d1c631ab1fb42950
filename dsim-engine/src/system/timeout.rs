// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Deadlines on the calls a target makes.
//!
//! A timeout wraps a target and intercepts the sends the target makes to
//! the rest of the system. Each one is given a deadline from the first
//! matching [`TimeoutRule`] (or `default_timeout`) and tracked until either
//! its reply comes back or the deadline passes. When a deadline passes the
//! target gets a `Timed out` error reply and the late reply, if it ever
//! arrives, is dropped.

use std::collections::BTreeMap;
use std::rc::Rc;

use dsim_model_builder::Properties;
use dsim_track::debug;

use super::network::WILDCARD;
use crate::message::{MsgId, Reply, Send};
use crate::sim_error;
use crate::time::{SimTime, TimeKey};
use crate::types::{SimError, SimResult};
use crate::world::Context;

/// Reason given when a call is not answered in time.
pub const TIMED_OUT: &str = "Timed out";

/// The deadline applied to calls matching a destination and method.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeoutRule {
    pub dest: String,
    pub method: String,
    pub value: SimTime,
}

impl TimeoutRule {
    fn matches(&self, dest: &str, method: &str) -> bool {
        (self.dest == WILDCARD || self.dest == dest)
            && (self.method == WILDCARD || self.method == method)
    }
}

#[derive(Properties)]
pub struct Timeout {
    /// Deadline for calls no rule matches.
    #[property(default = 1e9, min = 0, units = "ns")]
    pub default_timeout: SimTime,

    rules: Vec<TimeoutRule>,

    /// Forwarded sends awaiting a reply, in deadline order.
    in_flight: BTreeMap<(TimeKey, MsgId), Rc<Send>>,
}

impl Timeout {
    /// Add a rule. Rules are tried in the order they were added.
    pub fn add_rule(&mut self, dest: &str, method: &str, value: SimTime) {
        self.rules.push(TimeoutRule {
            dest: dest.to_string(),
            method: method.to_string(),
            value,
        });
    }

    #[must_use]
    pub fn rules(&self) -> &[TimeoutRule] {
        &self.rules
    }

    /// The deadline that applies to a call.
    #[must_use]
    pub fn timeout_for(&self, dest: &str, method: &str) -> SimTime {
        self.rules
            .iter()
            .find(|rule| rule.matches(dest, method))
            .map_or(self.default_timeout, |rule| rule.value)
    }

    /// The number of calls awaiting a reply.
    #[must_use]
    pub fn num_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn process_send_from_child(
        &mut self,
        send: &Rc<Send>,
        ctx: &mut Context,
    ) -> Result<bool, SimError> {
        let timeout = self.timeout_for(&send.address.dest, &send.address.method);
        let interrupt = ctx.request_interrupt_in(timeout)?;

        let forward = send.spawn(ctx.me(), send.time, None)?;
        forward.set_expires_at(interrupt.time);
        self.in_flight
            .insert((TimeKey(interrupt.time), forward.id), forward.clone());
        ctx.forward_send(forward)?;
        Ok(true)
    }

    pub(crate) fn route_reply_to_child(&mut self, reply: &Rc<Reply>, ctx: &mut Context) -> SimResult {
        let forward = reply.response_to();
        if let Some(expires_at) = forward.expires_at() {
            self.in_flight.remove(&(TimeKey(expires_at), forward.id));
        }
        let cancelled = forward.is_cancelled()
            || forward.spawned_from().is_some_and(|origin| origin.is_cancelled());
        if cancelled {
            debug!(ctx.entity() ; "dropping late {}", reply.id);
            return Ok(());
        }
        ctx.forward_reply(reply, 0.0)?;
        Ok(())
    }

    /// Time out every call whose deadline has passed.
    pub(crate) fn sweep(&mut self, ctx: &mut Context) -> SimResult {
        let now = ctx.now();
        while let Some(entry) = self.in_flight.first_entry() {
            if entry.key().0.0 > now {
                break;
            }
            let forward = entry.remove();
            let Some(origin) = forward.spawned_from().cloned() else {
                return sim_error!("Forwarded send has no origin");
            };
            debug!(ctx.entity() ; "{} timed out", origin.id);
            origin.cancel(now);
            ctx.reply_to_send(&origin, 0.0, Some(TIMED_OUT))?;
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.in_flight.clear();
    }

    pub(crate) fn clone_fresh(&self) -> Self {
        Self {
            default_timeout: self.default_timeout,
            rules: self.rules.clone(),
            in_flight: BTreeMap::new(),
        }
    }
}
