// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Routing between named children.
//!
//! A network holds its children by name and routes incoming sends with an
//! ordered list of [`Forward`] rules: the first rule whose input matches the
//! method (or is `*`) wins. A router is a network that adds a rule for each
//! child it is given, matching the child's name.

use std::rc::Rc;

use crate::message::{Address, Send};
use crate::tree::ActorId;
use crate::types::SimError;
use crate::world::Context;

/// Matches every method.
pub const WILDCARD: &str = "*";

/// A forwarding rule of a network.
#[derive(Clone, Debug, PartialEq)]
pub struct Forward {
    /// The method this rule matches, or `*`.
    pub input: String,

    /// The child sends are forwarded to.
    pub target: ActorId,

    /// If set, the method the forwarded send calls instead.
    pub target_input: Option<String>,
}

impl Forward {
    #[must_use]
    pub fn matches(&self, method: &str) -> bool {
        self.input == WILDCARD || self.input == method
    }
}

pub(crate) fn route_send_to_child(
    forwards: &[Forward],
    send: &Rc<Send>,
    ctx: &mut Context,
) -> Result<bool, SimError> {
    let Some(forward) = forwards.iter().find(|f| f.matches(&send.address.method)) else {
        return Ok(false);
    };
    let method = forward
        .target_input
        .as_deref()
        .unwrap_or(&send.address.method);
    let address = Address::new(&send.address.dest, method);
    let next = send
        .spawn(ctx.me(), ctx.now(), Some(address))?
        .with_next_actor(forward.target)?;
    ctx.forward_send(next)?;
    Ok(true)
}
