// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Sequential composition.
//!
//! A send into a series goes to its first child. Each child's reply triggers
//! a send to the next child, spawned from the same incoming send, and the
//! last child's reply is passed back to the caller. An error reply does not
//! stop the sequence.

use std::rc::Rc;

use dsim_track::trace;

use crate::message::{Reply, Send};
use crate::sim_error;
use crate::types::{SimError, SimResult};
use crate::world::Context;

pub(crate) fn route_send_to_child(send: &Rc<Send>, ctx: &mut Context) -> Result<bool, SimError> {
    let Some(first) = ctx.tree().child_at(ctx.me(), 0) else {
        return Ok(false);
    };
    let next = send
        .spawn(ctx.me(), ctx.now(), None)?
        .with_next_actor(first)?;
    ctx.forward_send(next)?;
    Ok(true)
}

pub(crate) fn process_reply_from_child(reply: &Rc<Reply>, ctx: &mut Context) -> SimResult {
    let Some(incoming) = reply.response_to().spawned_from().cloned() else {
        return sim_error!("Series received a reply to a send it did not spawn");
    };
    let me = ctx.me();
    let next_child = ctx
        .tree()
        .index_of(me, reply.source)
        .and_then(|index| ctx.tree().child_at(me, index + 1));

    match next_child {
        Some(child) => {
            trace!(ctx.entity() ; "{} next step {child}", incoming.id);
            let next = incoming
                .spawn(me, ctx.now(), None)?
                .with_next_actor(child)?;
            ctx.forward_send(next)
        }
        None => {
            ctx.forward_reply(reply, 0.0)?;
            Ok(())
        }
    }
}
