// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Fan-out composition.
//!
//! A send into a parallel container is copied to every child at once. The
//! caller gets a reply once every child has replied; it is the last child
//! reply to arrive that is passed back.

use std::collections::HashMap;
use std::rc::Rc;

use dsim_track::trace;

use crate::message::{MsgId, Reply, Send};
use crate::types::{SimError, SimResult};
use crate::world::Context;

pub(crate) fn route_send_to_child(
    pending: &mut HashMap<MsgId, Vec<bool>>,
    send: &Rc<Send>,
    ctx: &mut Context,
) -> Result<bool, SimError> {
    let me = ctx.me();
    let children = ctx.tree().children(me).to_vec();
    if children.is_empty() {
        return Ok(false);
    }
    pending.insert(send.id, vec![false; children.len()]);
    for child in children {
        let next = send
            .spawn(me, ctx.now(), None)?
            .with_next_actor(child)?;
        ctx.forward_send(next)?;
    }
    Ok(true)
}

pub(crate) fn process_reply_from_child(
    pending: &mut HashMap<MsgId, Vec<bool>>,
    reply: &Rc<Reply>,
    ctx: &mut Context,
) -> SimResult {
    let Some(incoming) = reply.response_to().spawned_from() else {
        return Ok(());
    };
    let incoming_id = incoming.id;
    let Some(received) = pending.get_mut(&incoming_id) else {
        return Ok(());
    };
    if let Some(index) = ctx.tree().index_of(ctx.me(), reply.source) {
        if let Some(bit) = received.get_mut(index) {
            *bit = true;
        }
    }
    if received.iter().all(|r| *r) {
        trace!(ctx.entity() ; "{incoming_id} all children replied");
        pending.remove(&incoming_id);
        ctx.forward_reply(reply, 0.0)?;
    }
    Ok(())
}
