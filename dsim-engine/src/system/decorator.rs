// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Single-child pass-through routing.
//!
//! A decorator forwards every send from outside to its target. Sends its
//! target makes only come back through it when the decorator intercepts
//! them (see [`Timeout`](super::Timeout)); those are passed on upwards.

use std::rc::Rc;

use crate::message::Send;
use crate::types::SimError;
use crate::world::Context;

/// Forward a send from outside to the target.
///
/// Unhandled if the decorator has no target yet.
pub(crate) fn route_send_to_child(send: &Rc<Send>, ctx: &mut Context) -> Result<bool, SimError> {
    let Some(target) = ctx.tree().target(ctx.me()) else {
        return Ok(false);
    };
    let next = send
        .spawn(ctx.me(), ctx.now(), None)?
        .with_next_actor(target)?;
    ctx.forward_send(next)?;
    Ok(true)
}

/// Forward a send made by the target back out, resolved from here.
pub(crate) fn process_send_from_child(
    send: &Rc<Send>,
    ctx: &mut Context,
) -> Result<bool, SimError> {
    let next = send.spawn(ctx.me(), ctx.now(), None)?;
    ctx.forward_send(next)?;
    Ok(true)
}
