// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The messages exchanged between components.
//!
//! A [`Send`] is a request travelling towards an [`Address`]. Whenever a
//! component passes a send on it *spawns* a new send from it, so every send
//! knows the send it was spawned from and the chain can be walked back to
//! the root. A [`Reply`] answers exactly one send and unwinds the spawn chain
//! hop by hop. An [`Interrupt`] is a payload-free wake-up a component
//! schedules for itself.
//!
//! Messages are reference counted. A spawned send keeps the send it came from
//! alive while parents only hold weak links to their children and replies,
//! so a whole spawn tree is released once nothing refers to any part of it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use dsim_track::Id;

use crate::sim_error;
use crate::time::SimTime;
use crate::tree::ActorId;
use crate::types::{SimError, SimResult};

static NEXT_MSG_ID: AtomicU64 = AtomicU64::new(1);

/// Globally increasing message identifier.
///
/// Messages created later always have a larger id which makes it usable as a
/// deterministic tie-break.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MsgId(pub u64);

impl MsgId {
    fn next() -> Self {
        MsgId(NEXT_MSG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

impl From<MsgId> for Id {
    fn from(id: MsgId) -> Self {
        Id(id.0)
    }
}

/// A late-bound route: the name of the destination and the method to call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address {
    pub dest: String,
    pub method: String,
}

impl Address {
    #[must_use]
    pub fn new(dest: &str, method: &str) -> Self {
        Self {
            dest: dest.to_string(),
            method: method.to_string(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.dest, self.method)
    }
}

/// A request travelling towards an [`Address`].
pub struct Send {
    pub id: MsgId,
    pub time: SimTime,
    pub source: ActorId,
    pub address: Address,
    label: RefCell<String>,
    next_actor: Cell<Option<ActorId>>,
    next_actor_name: RefCell<Option<String>>,
    spawned_from: Option<Rc<Send>>,
    children: RefCell<Vec<Weak<Send>>>,
    reply: RefCell<Option<Weak<Reply>>>,
    reply_id: Cell<Option<MsgId>>,
    cancelled_at: Cell<Option<SimTime>>,
    expires_at: Cell<Option<SimTime>>,
}

impl Send {
    /// Create a root send (one not spawned from any other).
    #[must_use]
    pub fn new(source: ActorId, time: SimTime, address: Address) -> Rc<Self> {
        Rc::new(Self::build(source, time, address, None))
    }

    fn build(
        source: ActorId,
        time: SimTime,
        address: Address,
        spawned_from: Option<Rc<Send>>,
    ) -> Self {
        Self {
            id: MsgId::next(),
            time,
            source,
            address,
            label: RefCell::new(String::new()),
            next_actor: Cell::new(None),
            next_actor_name: RefCell::new(None),
            spawned_from,
            children: RefCell::new(Vec::new()),
            reply: RefCell::new(None),
            reply_id: Cell::new(None),
            cancelled_at: Cell::new(None),
            expires_at: Cell::new(None),
        }
    }

    /// Spawn a new send from this one.
    ///
    /// Only the component this send was delivered to may spawn from it. The
    /// new send keeps this send's address unless one is given.
    pub fn spawn(
        self: &Rc<Self>,
        source: ActorId,
        time: SimTime,
        address: Option<Address>,
    ) -> Result<Rc<Send>, SimError> {
        if self.next_actor.get() != Some(source) {
            return sim_error!("Next actor must be set before spawning");
        }
        let address = address.unwrap_or_else(|| self.address.clone());
        let child = Rc::new(Self::build(source, time, address, Some(self.clone())));
        self.children.borrow_mut().push(Rc::downgrade(&child));
        Ok(child)
    }

    /// Set the next hop and return the send, for use when building.
    pub fn with_next_actor(self: Rc<Self>, next: ActorId) -> Result<Rc<Self>, SimError> {
        self.set_next_actor(next)?;
        Ok(self)
    }

    /// Set the resolved next hop. This can only be done once.
    pub fn set_next_actor(&self, next: ActorId) -> SimResult {
        if self.next_actor.get().is_some() {
            return sim_error!("nextActor has already been set.  Cannot be replaced");
        }
        self.next_actor.set(Some(next));
        Ok(())
    }

    #[must_use]
    pub fn next_actor(&self) -> Option<ActorId> {
        self.next_actor.get()
    }

    /// Route this send to the component with the given name rather than by
    /// its address.
    pub fn set_next_actor_name(&self, name: &str) {
        *self.next_actor_name.borrow_mut() = Some(name.to_string());
    }

    #[must_use]
    pub fn next_actor_name(&self) -> Option<String> {
        self.next_actor_name.borrow().clone()
    }

    #[must_use]
    pub fn spawned_from(&self) -> Option<&Rc<Send>> {
        self.spawned_from.as_ref()
    }

    /// Walk the spawn chain back to the send that started it.
    #[must_use]
    pub fn root_message(self: &Rc<Self>) -> Rc<Send> {
        let mut curr = self.clone();
        while let Some(parent) = curr.spawned_from.clone() {
            curr = parent;
        }
        curr
    }

    /// The number of sends spawned from this one so far.
    #[must_use]
    pub fn num_children(&self) -> usize {
        self.children.borrow().len()
    }

    /// The spawned sends that are still alive.
    #[must_use]
    pub fn children(&self) -> Vec<Rc<Send>> {
        self.children
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    #[must_use]
    pub fn has_reply(&self) -> bool {
        self.reply_id.get().is_some()
    }

    #[must_use]
    pub fn reply_id(&self) -> Option<MsgId> {
        self.reply_id.get()
    }

    /// The reply to this send, if it has one and it is still alive.
    #[must_use]
    pub fn reply(&self) -> Option<Rc<Reply>> {
        self.reply.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn set_reply(&self, reply: &Rc<Reply>) -> SimResult {
        if self.reply_id.get().is_some() {
            return sim_error!("Send's reply has already been set");
        }
        self.reply_id.set(Some(reply.id));
        *self.reply.borrow_mut() = Some(Rc::downgrade(reply));
        Ok(())
    }

    pub fn cancel(&self, at: SimTime) {
        self.cancelled_at.set(Some(at));
    }

    #[must_use]
    pub fn cancelled_at(&self) -> Option<SimTime> {
        self.cancelled_at.get()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.get().is_some()
    }

    pub fn set_expires_at(&self, at: SimTime) {
        self.expires_at.set(Some(at));
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<SimTime> {
        self.expires_at.get()
    }

    pub fn set_label(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.label.borrow().clone()
    }
}

impl fmt::Display for Send {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "send {} {} from {} @{}", self.id, self.address, self.source, self.time)
    }
}

impl fmt::Debug for Send {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Send")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("source", &self.source)
            .field("address", &self.address)
            .field("next_actor", &self.next_actor.get())
            .field("spawned_from", &self.spawned_from.as_ref().map(|s| s.id))
            .field("reply", &self.reply_id.get())
            .field("cancelled_at", &self.cancelled_at.get())
            .finish()
    }
}

/// The answer to exactly one [`Send`].
pub struct Reply {
    pub id: MsgId,
    pub time: SimTime,
    pub source: ActorId,
    next_actor: ActorId,
    response_to: Rc<Send>,
    spawned_from: Option<Rc<Reply>>,
    error: Option<String>,
}

impl Reply {
    /// Create the reply to `response_to`, optionally marked as an error.
    ///
    /// The reply comes from the component the send was delivered to and goes
    /// back to the send's source. A send can only ever be replied to once.
    pub fn new(
        response_to: &Rc<Send>,
        time: SimTime,
        error: Option<String>,
    ) -> Result<Rc<Reply>, SimError> {
        Self::build(response_to, time, error, None)
    }

    fn build(
        response_to: &Rc<Send>,
        time: SimTime,
        error: Option<String>,
        spawned_from: Option<Rc<Reply>>,
    ) -> Result<Rc<Reply>, SimError> {
        let Some(source) = response_to.next_actor() else {
            return sim_error!(format!("Cannot reply to {response_to}: it has no next actor"));
        };
        if response_to.has_reply() {
            return sim_error!("Send's reply has already been set");
        }
        let reply = Rc::new(Self {
            id: MsgId::next(),
            time,
            source,
            next_actor: response_to.source,
            response_to: response_to.clone(),
            spawned_from,
            error,
        });
        response_to.set_reply(&reply)?;
        Ok(reply)
    }

    /// Spawn the reply to `response_to` from this one, carrying the error
    /// state forward.
    pub fn spawn(
        self: &Rc<Self>,
        response_to: &Rc<Send>,
        time: SimTime,
    ) -> Result<Rc<Reply>, SimError> {
        Self::build(response_to, time, self.error.clone(), Some(self.clone()))
    }

    /// The component this reply is delivered to.
    #[must_use]
    pub fn next_actor(&self) -> ActorId {
        self.next_actor
    }

    #[must_use]
    pub fn response_to(&self) -> &Rc<Send> {
        &self.response_to
    }

    #[must_use]
    pub fn spawned_from(&self) -> Option<&Rc<Reply>> {
        self.spawned_from.as_ref()
    }

    /// Walk the reply chain back to the first reply.
    #[must_use]
    pub fn root_message(self: &Rc<Self>) -> Rc<Reply> {
        let mut curr = self.clone();
        while let Some(parent) = curr.spawned_from.clone() {
            curr = parent;
        }
        curr
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn error_reason(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "reply {} to {} from {} @{}",
            self.id, self.response_to.id, self.source, self.time
        )?;
        if let Some(reason) = &self.error {
            write!(f, " error: {reason}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("source", &self.source)
            .field("next_actor", &self.next_actor)
            .field("response_to", &self.response_to.id)
            .field("error", &self.error)
            .finish()
    }
}

/// A wake-up a component schedules for itself.
#[derive(Clone, Debug)]
pub struct Interrupt {
    pub id: MsgId,
    pub time: SimTime,
    pub source: ActorId,
}

impl Interrupt {
    #[must_use]
    pub fn new(source: ActorId, time: SimTime) -> Self {
        Self {
            id: MsgId::next(),
            time,
            source,
        }
    }
}

/// Anything that can be scheduled.
#[derive(Clone, Debug)]
pub enum Event {
    Interrupt(Interrupt),
    Send(Rc<Send>),
    Reply(Rc<Reply>),
}

impl Event {
    #[must_use]
    pub fn time(&self) -> SimTime {
        match self {
            Event::Interrupt(i) => i.time,
            Event::Send(s) => s.time,
            Event::Reply(r) => r.time,
        }
    }

    #[must_use]
    pub fn id(&self) -> MsgId {
        match self {
            Event::Interrupt(i) => i.id,
            Event::Send(s) => s.id,
            Event::Reply(r) => r.id,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::Interrupt(i) => write!(f, "interrupt {} for {} @{}", i.id, i.source, i.time),
            Event::Send(s) => s.fmt(f),
            Event::Reply(r) => r.fmt(f),
        }
    }
}
