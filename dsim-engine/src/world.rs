// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The state shared by every component during a simulation.
//!
//! The [`World`] is owned by the [`Simulator`](crate::simulator::Simulator).
//! While an event is being dispatched the component handling it sees the
//! world through a [`Context`], which knows which component it is acting
//! for and enforces the message ownership rules.

use std::rc::Rc;

use dsim_track::entity::Entity;
use dsim_track::{Id, debug, exit, trace};

use crate::event_list::NextEventList;
use crate::message::{Address, Event, Interrupt, Reply, Send};
use crate::random::RandomSource;
use crate::sim_error;
use crate::system::Behaviour;
use crate::time::SimTime;
use crate::tree::{ActorId, Tree};
use crate::types::{SimError, SimResult};

/// Called for every event injected into the event list.
pub type InjectHook = Box<dyn FnMut(&Event)>;

pub struct World {
    pub(crate) entity: Rc<Entity>,
    pub(crate) now: SimTime,
    pub(crate) tree: Tree,
    pub(crate) events: NextEventList,
    pub(crate) rng: Box<dyn RandomSource>,
    pub(crate) on_injected: Vec<InjectHook>,
}

impl World {
    pub(crate) fn new(entity: Rc<Entity>, tree: Tree, rng: Box<dyn RandomSource>) -> Self {
        Self {
            entity,
            now: 0.0,
            tree,
            events: NextEventList::new(),
            rng,
            on_injected: Vec::new(),
        }
    }

    pub(crate) fn inject(&mut self, event: Event) -> SimResult {
        trace!(self.entity ; "inject {event}");
        for hook in &mut self.on_injected {
            hook(&event);
        }
        self.events.inject(event)?;
        Ok(())
    }

    pub(crate) fn request_interrupt_in(
        &mut self,
        source: ActorId,
        delta: SimTime,
    ) -> Result<Interrupt, SimError> {
        let interrupt = Interrupt::new(source, self.now + delta);
        self.inject(Event::Interrupt(interrupt.clone()))?;
        Ok(interrupt)
    }

    pub(crate) fn random(&mut self, max: u64) -> u64 {
        self.rng.random(max)
    }

    /// Run `f` against the behaviour of component `id`.
    ///
    /// The behaviour is lifted out of the tree for the duration of the call
    /// so that the rest of the tree can still be queried.
    pub(crate) fn dispatch<R>(
        &mut self,
        id: ActorId,
        f: impl FnOnce(&mut Behaviour, &mut Context) -> Result<R, SimError>,
    ) -> Result<R, SimError> {
        let (mut behaviour, entity) = self.tree.take_behaviour(id)?;
        let result = {
            let mut ctx = Context::new(self, id, entity);
            f(&mut behaviour, &mut ctx)
        };
        self.tree.restore_behaviour(id, behaviour);
        result
    }
}

/// The view of the [`World`] a component gets while handling an event.
pub struct Context<'a> {
    world: &'a mut World,
    me: ActorId,
    entity: Rc<Entity>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(world: &'a mut World, me: ActorId, entity: Rc<Entity>) -> Self {
        Self { world, me, entity }
    }

    /// The component this context acts for.
    #[must_use]
    pub fn me(&self) -> ActorId {
        self.me
    }

    #[must_use]
    pub fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }

    #[must_use]
    pub fn now(&self) -> SimTime {
        self.world.now
    }

    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.world.tree
    }

    /// Draw from the simulation's random source.
    pub fn random(&mut self, max: u64) -> u64 {
        self.world.random(max)
    }

    /// Schedule an interrupt for this component `delta` from now.
    pub fn request_interrupt_in(&mut self, delta: SimTime) -> Result<Interrupt, SimError> {
        self.world.request_interrupt_in(self.me, delta)
    }

    /// Schedule a send originating from this component.
    pub fn forward_send(&mut self, send: Rc<Send>) -> SimResult {
        if send.source != self.me {
            return sim_error!("Cannot send messages whose source is not this.");
        }
        exit!(self.entity ; Id::from(send.id));
        self.world.inject(Event::Send(send))
    }

    /// Answer a send delivered to this component after `delay`, optionally
    /// with an error.
    pub fn reply_to_send(
        &mut self,
        send: &Rc<Send>,
        delay: SimTime,
        error: Option<&str>,
    ) -> Result<Rc<Reply>, SimError> {
        if send.next_actor() != Some(self.me) {
            return sim_error!("Cannot reply to sends whose nextActor is not this.");
        }
        let reply = Reply::new(send, self.world.now + delay, error.map(str::to_string))?;
        if let Some(reason) = error {
            debug!(self.entity ; "error reply to {}: {reason}", send.id);
        }
        self.world.inject(Event::Reply(reply.clone()))?;
        Ok(reply)
    }

    /// Pass a reply delivered to this component back towards whoever sent
    /// the send it was spawned from, after `delay`.
    ///
    /// If that send already has a reply (for example because it timed out)
    /// the reply is dropped and `None` is returned.
    pub fn forward_reply(
        &mut self,
        reply: &Rc<Reply>,
        delay: SimTime,
    ) -> Result<Option<Rc<Reply>>, SimError> {
        if reply.next_actor() != self.me {
            return sim_error!("Cannot forward replies whose nextActor is not this.");
        }
        let Some(parent) = reply.response_to().spawned_from().cloned() else {
            return sim_error!(
                "Cannot spawn a reply for a send that itself was not spawned from another send"
            );
        };
        if parent.has_reply() {
            debug!(self.entity ; "dropping {} as {} already has a reply", reply.id, parent.id);
            return Ok(None);
        }
        let out = reply.spawn(&parent, self.world.now + delay)?;
        self.world.inject(Event::Reply(out.clone()))?;
        Ok(Some(out))
    }

    /// Find the component an address refers to, as seen from this
    /// component.
    #[must_use]
    pub fn resolve_address(&self, address: &Address) -> Option<ActorId> {
        self.world.tree.resolve_address(self.me, address)
    }

    /// Find the component with the given name, as seen from this component.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> Option<ActorId> {
        self.world.tree.resolve_name(self.me, name)
    }

    /// Whether `id` is a direct child of this component.
    #[must_use]
    pub fn is_child(&self, id: ActorId) -> bool {
        self.world.tree.parent(id) == Some(self.me)
    }
}
