// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The interface implemented by leaf components.
//!
//! A leaf is any component without children. It reacts to the sends, replies
//! and interrupts delivered to it through a [`Context`] which lets it reply,
//! forward, schedule wake-ups and draw random numbers.
//!
//! By default a leaf rejects sends and replies: a model that delivers one to
//! a leaf that does not expect it is broken.

use std::any::Any;
use std::rc::Rc;

use crate::message::{Reply, Send};
use crate::property::Properties;
use crate::sim_error;
use crate::types::SimResult;
use crate::world::Context;

pub trait Processor: Properties + ProcessorClone {
    /// Handle a send delivered to this leaf.
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        let _ = (send, ctx);
        sim_error!("Sends not allowed for this actor")
    }

    /// Handle a reply delivered to this leaf.
    fn process_reply(&mut self, reply: Rc<Reply>, ctx: &mut Context) -> SimResult {
        let _ = (reply, ctx);
        sim_error!("Replies not allowed for this actor")
    }

    /// Handle a wake-up requested by this leaf.
    fn process_interrupt(&mut self, ctx: &mut Context) -> SimResult {
        let _ = ctx;
        Ok(())
    }

    /// Return to the state just after construction, keeping configuration.
    fn reset(&mut self) {}
}

/// Cloning and downcasting for boxed processors.
///
/// This is implemented for every `Clone` processor.
pub trait ProcessorClone {
    fn clone_processor(&self) -> Box<dyn Processor>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> ProcessorClone for T
where
    T: Processor + Clone + 'static,
{
    fn clone_processor(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
