// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Containers and their routing policies.
//!
//! Every component is either a leaf, whose behaviour is a boxed
//! [`Processor`], or a container whose behaviour is one of the closed set of
//! [`System`] policies:
//!
//!  - [`series`]: pass a send through each child in turn.
//!  - [`parallel`]: fan a send out to every child and wait for all replies.
//!  - [`network`]: route sends to named children by forwarding rules.
//!  - [`decorator`]: wrap a single target, optionally with a [`Queue`] or
//!    [`Timeout`] policy.
//!
//! A container handles a send differently depending on whether it came from
//! one of its own children or from outside. Sends that cannot be routed are
//! answered immediately with a `No destination found.` error reply.

use std::collections::HashMap;
use std::rc::Rc;

use crate::message::{MsgId, Reply, Send};
use crate::processor::Processor;
use crate::types::{SimError, SimResult};
use crate::world::Context;

pub mod decorator;
pub mod network;
pub mod parallel;
pub mod queue;
pub mod series;
pub mod timeout;

pub use network::Forward;
pub use queue::{Queue, QueueDiagnostics};
pub use timeout::{Timeout, TimeoutRule};

/// Reason given when a container has no route for a send.
pub const NO_DESTINATION: &str = "No destination found.";

/// What a component does with the events delivered to it.
pub enum Behaviour {
    Leaf(Box<dyn Processor>),
    System(System),
}

/// The routing policy of a container.
pub enum System {
    Series,
    Parallel {
        /// Completion bits, by child position, for each send fanned out.
        pending: HashMap<MsgId, Vec<bool>>,
    },
    Network {
        forwards: Vec<Forward>,
    },
    Decorator(Policy),
}

/// The flavours of single-child decorator.
pub enum Policy {
    PassThrough,
    Queue(Queue),
    Timeout(Timeout),
}

impl Behaviour {
    pub(crate) fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        match self {
            Behaviour::Leaf(processor) => processor.process_send(send, ctx),
            Behaviour::System(system) => system.process_send(send, ctx),
        }
    }

    pub(crate) fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        match self {
            Behaviour::Leaf(processor) => processor.process_reply(reply, ctx),
            Behaviour::System(system) => system.process_reply(reply, ctx),
        }
    }

    pub(crate) fn process_interrupt(&mut self, ctx: &mut Context) -> SimResult {
        match self {
            Behaviour::Leaf(processor) => processor.process_interrupt(ctx),
            Behaviour::System(system) => system.process_interrupt(ctx),
        }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            Behaviour::Leaf(processor) => processor.reset(),
            Behaviour::System(system) => system.reset(),
        }
    }

    /// Copy the configuration into a new behaviour with fresh runtime state.
    ///
    /// Network forwarding rules still refer to the original children and
    /// must be remapped by the caller.
    pub(crate) fn clone_fresh(&self) -> Behaviour {
        match self {
            Behaviour::Leaf(processor) => {
                let mut copy = processor.clone_processor();
                copy.reset();
                Behaviour::Leaf(copy)
            }
            Behaviour::System(system) => Behaviour::System(system.clone_fresh()),
        }
    }
}

impl System {
    pub(crate) fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        let handled = if ctx.is_child(send.source) {
            self.process_send_from_child(&send, ctx)?
        } else {
            self.route_send_to_child(&send, ctx)?
        };
        if !handled {
            ctx.reply_to_send(&send, 0.0, Some(NO_DESTINATION))?;
        }
        Ok(())
    }

    fn route_send_to_child(&mut self, send: &Rc<Send>, ctx: &mut Context) -> Result<bool, SimError> {
        match self {
            System::Series => series::route_send_to_child(send, ctx),
            System::Parallel { pending } => parallel::route_send_to_child(pending, send, ctx),
            System::Network { forwards } => network::route_send_to_child(forwards, send, ctx),
            System::Decorator(Policy::Queue(queue)) => queue.route_send_to_child(send, ctx),
            System::Decorator(_) => decorator::route_send_to_child(send, ctx),
        }
    }

    fn process_send_from_child(
        &mut self,
        send: &Rc<Send>,
        ctx: &mut Context,
    ) -> Result<bool, SimError> {
        match self {
            System::Decorator(Policy::Timeout(timeout)) => {
                timeout.process_send_from_child(send, ctx)
            }
            System::Decorator(_) => decorator::process_send_from_child(send, ctx),
            _ => Ok(false),
        }
    }

    pub(crate) fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        if ctx.is_child(reply.source) {
            self.process_reply_from_child(&reply, ctx)
        } else {
            self.route_reply_to_child(&reply, ctx)
        }
    }

    fn process_reply_from_child(&mut self, reply: &Rc<Reply>, ctx: &mut Context) -> SimResult {
        match self {
            System::Series => series::process_reply_from_child(reply, ctx),
            System::Parallel { pending } => {
                parallel::process_reply_from_child(pending, reply, ctx)
            }
            System::Decorator(Policy::Queue(queue)) => queue.process_reply_from_child(reply, ctx),
            _ => {
                ctx.forward_reply(reply, 0.0)?;
                Ok(())
            }
        }
    }

    fn route_reply_to_child(&mut self, reply: &Rc<Reply>, ctx: &mut Context) -> SimResult {
        match self {
            System::Decorator(Policy::Timeout(timeout)) => {
                timeout.route_reply_to_child(reply, ctx)
            }
            _ => {
                ctx.forward_reply(reply, 0.0)?;
                Ok(())
            }
        }
    }

    pub(crate) fn process_interrupt(&mut self, ctx: &mut Context) -> SimResult {
        match self {
            System::Decorator(Policy::Queue(queue)) => queue.drain(ctx),
            System::Decorator(Policy::Timeout(timeout)) => timeout.sweep(ctx),
            _ => Ok(()),
        }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            System::Parallel { pending } => pending.clear(),
            System::Decorator(Policy::Queue(queue)) => queue.reset(),
            System::Decorator(Policy::Timeout(timeout)) => timeout.reset(),
            _ => {}
        }
    }

    fn clone_fresh(&self) -> System {
        match self {
            System::Series => System::Series,
            System::Parallel { .. } => System::Parallel {
                pending: HashMap::new(),
            },
            System::Network { forwards } => System::Network {
                forwards: forwards.clone(),
            },
            System::Decorator(Policy::PassThrough) => System::Decorator(Policy::PassThrough),
            System::Decorator(Policy::Queue(queue)) => {
                System::Decorator(Policy::Queue(queue.clone_fresh()))
            }
            System::Decorator(Policy::Timeout(timeout)) => {
                System::Decorator(Policy::Timeout(timeout.clone_fresh()))
            }
        }
    }
}
