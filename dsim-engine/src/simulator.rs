// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The simulation driver.
//!
//! The [`Simulator`] owns the component [`Tree`], the event list and the
//! current time. Each call to [`Simulator::step_next`] pops the next event,
//! advances time to it and hands it to the component it is for:
//!
//!  - an interrupt goes to the component that requested it,
//!  - a send goes to its next hop, which is resolved from its address (or
//!    next-hop name) the first time it is delivered,
//!  - a reply goes to the component that made the send it answers.
//!
//! Errors returned while handling an event mean the model is broken; they
//! stop the run and are returned from the stepping functions.
//!
//! # Examples
//!
//! ```rust
//! use dsim_engine::message::{Address, Send};
//! use dsim_engine::simulator::Simulator;
//! use dsim_engine::tree::{ActorId, Tree};
//! use dsim_engine::system::Queue;
//! use dsim_track::tracker::dev_null_tracker;
//!
//! let mut tree = Tree::new(&dev_null_tracker());
//! let queue = tree.new_queue("queue", Queue::default());
//! let mut sim = Simulator::new(tree);
//!
//! // A send with nowhere to go gets an error reply
//! let caller = ActorId::next();
//! let send = Send::new(caller, 5.0, Address::new("queue", "get"))
//!     .with_next_actor(queue)
//!     .unwrap();
//! sim.forward_send(caller, send.clone()).unwrap();
//! assert_eq!(sim.step(0.0, 0).unwrap(), 1);
//! assert_eq!(sim.now(), 5.0);
//! assert!(send.reply().unwrap().is_error());
//! ```

use std::rc::Rc;

use dsim_model_builder::EntityDisplay;
use dsim_track::entity::Entity;
use dsim_track::{Id, debug, enter, set_time, trace};

use crate::message::{Address, Event, Interrupt, Reply, Send};
use crate::processor::Processor;
use crate::random::{DEFAULT_SEED, RandomSource, SeededRandom};
use crate::sim_error;
use crate::system::{Behaviour, QueueDiagnostics};
use crate::time::{INFINITY, SimTime};
use crate::tree::{ActorId, NodeKind, Tree};
use crate::types::{SimError, SimResult};
use crate::world::{Context, World};

type SendHook = Box<dyn FnMut(&Rc<Send>)>;
type ReplyHook = Box<dyn FnMut(&Rc<Reply>)>;
type InterruptHook = Box<dyn FnMut(&Interrupt)>;

#[derive(EntityDisplay)]
pub struct Simulator {
    pub entity: Rc<Entity>,
    world: World,
    on_send_processed: Vec<SendHook>,
    on_reply_processed: Vec<ReplyHook>,
    on_interrupt_processed: Vec<InterruptHook>,
}

impl Simulator {
    /// Create a simulator for a tree, seeded with [`DEFAULT_SEED`].
    #[must_use]
    pub fn new(tree: Tree) -> Self {
        Self::new_with_seed(tree, DEFAULT_SEED)
    }

    #[must_use]
    pub fn new_with_seed(tree: Tree, seed: u64) -> Self {
        let entity = Rc::new(Entity::new(tree.top(), "sim"));
        let rng = Box::new(SeededRandom::new(seed));
        Self {
            entity: entity.clone(),
            world: World::new(entity, tree, rng),
            on_send_processed: Vec::new(),
            on_reply_processed: Vec::new(),
            on_interrupt_processed: Vec::new(),
        }
    }

    /// Replace the source of random numbers.
    pub fn set_random_source(&mut self, source: impl RandomSource + 'static) {
        self.world.rng = Box::new(source);
    }

    /// Called after each send has been handled.
    pub fn on_send_processed(&mut self, hook: impl FnMut(&Rc<Send>) + 'static) {
        self.on_send_processed.push(Box::new(hook));
    }

    /// Called after each reply has been handled.
    pub fn on_reply_processed(&mut self, hook: impl FnMut(&Rc<Reply>) + 'static) {
        self.on_reply_processed.push(Box::new(hook));
    }

    /// Called after each interrupt has been handled.
    pub fn on_interrupt_processed(&mut self, hook: impl FnMut(&Interrupt) + 'static) {
        self.on_interrupt_processed.push(Box::new(hook));
    }

    /// Called for every event scheduled, before it is placed in the event
    /// list.
    pub fn on_injected(&mut self, hook: impl FnMut(&Event) + 'static) {
        self.world.on_injected.push(Box::new(hook));
    }

    #[must_use]
    pub fn now(&self) -> SimTime {
        self.world.now
    }

    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.world.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.world.tree
    }

    /// The time of the next pending event or [`INFINITY`].
    #[must_use]
    pub fn next_event_time(&self) -> SimTime {
        self.world.events.next_event_time()
    }

    #[must_use]
    pub fn num_pending(&self) -> usize {
        self.world.events.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.world.events.is_empty()
    }

    pub fn random(&mut self, max: u64) -> u64 {
        self.world.random(max)
    }

    /// Schedule an event.
    pub fn inject(&mut self, event: Event) -> SimResult {
        self.world.inject(event)
    }

    /// Schedule a send on behalf of `source`.
    pub fn forward_send(&mut self, source: ActorId, send: Rc<Send>) -> SimResult {
        if send.source != source {
            return sim_error!("Cannot send messages whose source is not this.");
        }
        self.world.inject(Event::Send(send))
    }

    /// Create and schedule a root send from `source` at `time`.
    pub fn send_at(
        &mut self,
        source: ActorId,
        time: SimTime,
        address: Address,
    ) -> Result<Rc<Send>, SimError> {
        let send = Send::new(source, time, address);
        self.forward_send(source, send.clone())?;
        Ok(send)
    }

    /// Schedule an interrupt for `source` at `delta` from now.
    pub fn request_interrupt_in(
        &mut self,
        source: ActorId,
        delta: SimTime,
    ) -> Result<Interrupt, SimError> {
        self.world.request_interrupt_in(source, delta)
    }

    fn next_actor_for(&self, send: &Rc<Send>) -> Result<ActorId, SimError> {
        if let Some(next) = send.next_actor() {
            return Ok(next);
        }
        let name = send.next_actor_name();
        let found = match &name {
            Some(name) => self.world.tree.resolve_name(send.source, name),
            None => self.world.tree.resolve_address(send.source, &send.address),
        };
        let Some(next) = found else {
            return sim_error!(format!(
                "Cannot find nextActor by name ({}) or by address ({}, {})",
                name.unwrap_or_default(),
                send.address.dest,
                send.address.method
            ));
        };
        send.set_next_actor(next)?;
        Ok(next)
    }

    /// Deliver the next event.
    ///
    /// Returns the event delivered or `None` if there were none left.
    pub fn step_next(&mut self) -> Result<Option<Event>, SimError> {
        let Some(event) = self.world.events.pop() else {
            return Ok(None);
        };
        self.world.now = event.time();
        set_time!(self.entity ; self.world.now);
        trace!(self.entity ; "deliver {event}");

        match &event {
            Event::Interrupt(interrupt) => {
                self.world
                    .dispatch(interrupt.source, |b, ctx| b.process_interrupt(ctx))?;
                for hook in &mut self.on_interrupt_processed {
                    hook(interrupt);
                }
            }
            Event::Send(send) => {
                let next = self.next_actor_for(send)?;
                let send = send.clone();
                self.world.dispatch(next, |b, ctx| {
                    enter!(ctx.entity() ; Id::from(send.id));
                    b.process_send(send.clone(), ctx)
                })?;
                for hook in &mut self.on_send_processed {
                    hook(&send);
                }
            }
            Event::Reply(reply) => {
                let next = reply.next_actor();
                let reply = reply.clone();
                self.world.dispatch(next, |b, ctx| {
                    enter!(ctx.entity() ; Id::from(reply.id));
                    b.process_reply(reply.clone(), ctx)
                })?;
                for hook in &mut self.on_reply_processed {
                    hook(&reply);
                }
            }
        }
        Ok(Some(event))
    }

    /// Deliver events until none are left, `max_steps` have been delivered
    /// or the next event is more than `time_delta` after the first one.
    ///
    /// A `time_delta` of 0 means no time limit and a `max_steps` of 0 means
    /// no step limit, unless both are 0 in which case exactly one event is
    /// delivered. Returns the number of events delivered.
    pub fn step(&mut self, time_delta: SimTime, max_steps: usize) -> Result<usize, SimError> {
        let start = self.world.events.next_event_time();
        let end = start + time_delta.max(0.0);
        let mut count = 0;
        while self.step_next()?.is_some() {
            count += 1;
            if time_delta <= 0.0 && max_steps == 0 {
                break;
            }
            if time_delta > 0.0 && self.world.events.next_event_time() > end {
                break;
            }
            if max_steps > 0 && count >= max_steps {
                break;
            }
        }
        Ok(count)
    }

    /// Deliver events until there are none left, or `limit` have been
    /// delivered.
    pub fn run_until_idle(&mut self, limit: usize) -> Result<usize, SimError> {
        let mut count = 0;
        while count < limit && self.step_next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Deliver every event up to `duration` from now and then move time on
    /// to the end of that window.
    pub fn run_for(&mut self, duration: SimTime) -> Result<usize, SimError> {
        let end = self.world.now + duration;
        let mut count = 0;
        while self.world.events.next_event_time() <= end {
            if self.step_next()?.is_none() {
                break;
            }
            count += 1;
        }
        if end < INFINITY {
            self.world.now = self.world.now.max(end);
        }
        debug!(self.entity ; "ran {count} events up to {}", self.world.now);
        Ok(count)
    }

    /// Go back to time zero with no pending events and every component
    /// reset.
    pub fn reset(&mut self) {
        self.world.now = 0.0;
        self.world.events.clear();
        self.world.tree.reset_all();
    }

    /// Call `f` with a leaf's processor and a context acting for it, as if
    /// it were handling an event at the current time.
    pub fn invoke<P, R>(
        &mut self,
        id: ActorId,
        f: impl FnOnce(&mut P, &mut Context) -> Result<R, SimError>,
    ) -> Result<R, SimError>
    where
        P: Processor + 'static,
    {
        self.world.dispatch(id, |behaviour, ctx| match behaviour {
            Behaviour::Leaf(processor) => match processor.as_any_mut().downcast_mut::<P>() {
                Some(p) => f(p, ctx),
                None => sim_error!(format!(
                    "{} is not a {}",
                    ctx.entity().name,
                    std::any::type_name::<P>()
                )),
            },
            Behaviour::System(_) => sim_error!(format!("{} is not a leaf", ctx.entity().name)),
        })
    }

    /// Typed access to a leaf's processor.
    pub fn processor<P: Processor + 'static>(&self, id: ActorId) -> Result<&P, SimError> {
        self.world.tree.processor(id)
    }

    /// Set a property of a component.
    ///
    /// A queue is woken up straight away so that a change to its capacity
    /// applies to sends already waiting.
    pub fn set_property(&mut self, id: ActorId, name: &str, value: f64) -> SimResult {
        self.world.tree.set_property(id, name, value)?;
        if self.world.tree.node(id)?.kind() == NodeKind::Queue {
            self.world.request_interrupt_in(id, 0.0)?;
        }
        Ok(())
    }

    pub fn queue_diagnostics(&self, id: ActorId) -> Result<QueueDiagnostics, SimError> {
        Ok(self.world.tree.queue(id)?.diagnostics())
    }

    /// The number of calls a timeout is still waiting on.
    pub fn timeout_in_flight(&self, id: ActorId) -> Result<usize, SimError> {
        Ok(self.world.tree.timeout(id)?.num_in_flight())
    }
}
