// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A load generator.
//!
//! A `Generator` calls a weighted set of destinations in rounds, one round
//! per simulated second. Each round makes `current_qps` calls, each to a
//! destination sampled by weight and sent at a random offset within the
//! second. Above 20 QPS the count is jittered by up to 10%.
//!
//! The rate moves towards `target_qps` by `delta_qps` after every round.
//! Setting `target_qps` or `ramp_rate` recomputes the step:
//!
//! ```text
//! delta_qps = max(1, (target_qps - current_qps) * ramp_rate / 100)    when rising
//! delta_qps = min(-1, (target_qps - current_qps) * ramp_rate / 100)   when falling
//! ```
//!
//! and the rate is clamped at the target once it gets there.
//!
//! # Examples
//!
//! ```rust
//! use dsim_components::generator::Generator;
//! use dsim_engine::property::Properties;
//!
//! let mut generator = Generator::new();
//! generator.set_property("target_qps", 100.0).unwrap();
//! assert_eq!(generator.delta_qps(), 9.9);
//! ```

use std::rc::Rc;

use dsim_engine::message::{Address, Reply, Send};
use dsim_engine::processor::Processor;
use dsim_engine::sim_error;
use dsim_engine::time::{ONE_SEC, SimTime};
use dsim_engine::tree::ActorId;
use dsim_engine::types::{SimError, SimResult};
use dsim_engine::world::Context;
use dsim_model_builder::Properties;
use dsim_track::{debug, trace};

/// A destination and its share of the traffic.
#[derive(Clone, Debug, PartialEq)]
pub struct Destination {
    pub address: Address,
    pub weight: u64,
}

/// The rate the generator is currently producing, which starts at 1.
#[derive(Clone, Copy, Debug)]
struct Rate(f64);

impl Default for Rate {
    fn default() -> Self {
        Rate(1.0)
    }
}

/// Destinations resolved so far, one slot per destination.
///
/// The ids belong to the tree the generator was resolved in, so a clone
/// starts with every slot empty.
#[derive(Debug, Default)]
struct ResolvedActors(Vec<Option<ActorId>>);

impl Clone for ResolvedActors {
    fn clone(&self) -> Self {
        ResolvedActors(vec![None; self.0.len()])
    }
}

#[derive(Clone, Properties)]
pub struct Generator {
    /// Speed of the ramp as a percentage of the gap to `target_qps`.
    #[property(default = 10, units = "% per sec", on_change = "ramp")]
    pub ramp_rate: f64,

    #[property(default = 1, min = 0, units = "QPS", on_change = "ramp")]
    pub target_qps: f64,

    destinations: Vec<Destination>,
    cumulative_weights: Vec<u64>,
    next_actors: ResolvedActors,
    total_weight: u64,

    current_qps: Rate,
    delta_qps: f64,
    started: bool,
    round: u64,
    last_sent_at: Option<SimTime>,

    num_replies: usize,
    num_errors: usize,
}

impl Generator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a destination. Negative weights count as positive.
    pub fn add(&mut self, dest: &str, method: &str, weight: i64) -> &mut Self {
        let weight = weight.unsigned_abs();
        self.total_weight += weight;
        self.cumulative_weights.push(self.total_weight);
        self.destinations.push(Destination {
            address: Address::new(dest, method),
            weight,
        });
        self.next_actors.0.push(None);
        self
    }

    #[must_use]
    pub fn dest_at(&self, index: usize) -> Option<&Destination> {
        self.destinations.get(index)
    }

    #[must_use]
    pub fn dest_count(&self) -> usize {
        self.destinations.len()
    }

    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    #[must_use]
    pub fn round(&self) -> u64 {
        self.round
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn current_qps(&self) -> f64 {
        self.current_qps.0
    }

    #[must_use]
    pub fn delta_qps(&self) -> f64 {
        self.delta_qps
    }

    #[must_use]
    pub fn num_replies(&self) -> usize {
        self.num_replies
    }

    #[must_use]
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// Move the current rate, but only to a value between where it is now
    /// and the target.
    pub fn set_current_qps(&mut self, qps: f64) {
        let current = self.current_qps.0;
        let target = self.target_qps;
        if (qps >= current && qps <= target) || (qps >= target && qps <= current) {
            self.current_qps = Rate(qps);
        }
    }

    fn ramp(&mut self) {
        let step = (self.target_qps - self.current_qps.0) * self.ramp_rate / 100.0;
        self.delta_qps = if step < 0.0 {
            step.min(-1.0)
        } else {
            step.max(1.0)
        };
    }

    fn ramp_qps(&mut self) {
        let next = self.current_qps.0 + self.delta_qps;
        if (self.delta_qps > 0.0 && next > self.target_qps)
            || (self.delta_qps < 0.0 && next < self.target_qps)
        {
            self.current_qps = Rate(self.target_qps);
            self.delta_qps = 0.0;
        } else {
            self.current_qps = Rate(next);
        }
    }

    /// Start generating. Does nothing if already started.
    pub fn start(&mut self, ctx: &mut Context) -> SimResult {
        if !self.started {
            self.started = true;
            ctx.request_interrupt_in(0.0)?;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    fn random_index(&self, ctx: &mut Context) -> Result<usize, SimError> {
        let r = ctx.random(self.total_weight);
        match self.cumulative_weights.iter().position(|w| *w > r) {
            Some(index) => Ok(index),
            None => sim_error!("Generator has no destinations with a weight"),
        }
    }

    fn next_actor(&mut self, index: usize, ctx: &Context) -> Result<ActorId, SimError> {
        if let Some(next) = self.next_actors.0[index] {
            return Ok(next);
        }
        let address = &self.destinations[index].address;
        match ctx.resolve_address(address) {
            Some(next) => {
                self.next_actors.0[index] = Some(next);
                Ok(next)
            }
            None => sim_error!(format!("Cannot find destination: {}", address.dest)),
        }
    }

    fn send_one_round(&mut self, ctx: &mut Context) -> SimResult {
        let mut qps = self.current_qps.0;
        if qps > 20.0 {
            let jitter = (0.1 * qps).floor() as u64;
            qps += ctx.random(2 * jitter) as f64 - jitter as f64;
        }
        let count = qps.max(0.0).ceil() as u64;
        debug!(ctx.entity() ; "round {} sending {count}", self.round);

        for i in 0..count {
            let index = self.random_index(ctx)?;
            let next = self.next_actor(index, ctx)?;
            let time = ctx.now() + ctx.random(ONE_SEC as u64) as SimTime;
            let address = self.destinations[index].address.clone();
            let send = Send::new(ctx.me(), time, address).with_next_actor(next)?;
            send.set_label(&format!("Round: {}, Message: {i}", self.round));
            ctx.forward_send(send)?;
        }
        self.last_sent_at = Some(ctx.now());
        Ok(())
    }
}

impl Processor for Generator {
    fn process_interrupt(&mut self, ctx: &mut Context) -> SimResult {
        if !self.started {
            return Ok(());
        }
        let elapsed = self.last_sent_at.map(|at| ctx.now() - at);
        match elapsed {
            Some(elapsed) if elapsed < ONE_SEC => {
                ctx.request_interrupt_in(ONE_SEC - elapsed)?;
            }
            _ => {
                self.round += 1;
                self.send_one_round(ctx)?;
                ctx.request_interrupt_in(ONE_SEC)?;
                self.ramp_qps();
            }
        }
        Ok(())
    }

    fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        self.num_replies += 1;
        if reply.is_error() {
            self.num_errors += 1;
            trace!(ctx.entity() ; "{} error: {}", reply.id, reply.error_reason().unwrap_or_default());
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.started = false;
        self.last_sent_at = None;
        self.num_replies = 0;
        self.num_errors = 0;
    }
}
