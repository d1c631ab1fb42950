// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Named nodes of the simulated system.
//!
//! Every component of a design owns an [`Entity`]. Entities mirror the
//! component tree: a component attached to a container gets an entity under
//! the container's entity, so log lines carry names such as
//! `top::frontend::tinyurl::db`.

use std::fmt;
use std::rc::Rc;

use crate::{Id, Tracker, create, destroy};

const SEPARATOR: &str = "::";

/// A named node with a unique [`Id`] used to tag its track events.
pub struct Entity {
    /// Local name, unique among siblings.
    pub name: String,

    /// `None` only for the root returned by [`toplevel`].
    pub parent: Option<Rc<Entity>>,

    /// Identifier that tags this entity's events.
    pub id: Id,

    /// [`Tracker`] that receives this entity's events.
    pub tracker: Tracker,

    full_name: String,
}

impl Entity {
    /// Create an entity below `parent`, registering its full name with the
    /// parent's tracker.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{SEPARATOR}{name}", parent.full_name);
        let entity = Self::register(&parent.tracker, Some(parent.clone()), name, full_name);
        create!(entity);
        entity
    }

    /// A new entity with the same name placed below `parent`.
    ///
    /// Components are built detached and attached later, so the tree uses
    /// this to move a subtree of entities under its new container. The new
    /// entity gets a fresh id.
    #[must_use]
    pub fn moved_to(&self, parent: &Rc<Entity>) -> Self {
        Self::new(parent, &self.name)
    }

    fn register(
        tracker: &Tracker,
        parent: Option<Rc<Entity>>,
        name: &str,
        full_name: String,
    ) -> Self {
        let id = tracker.unique_id();
        tracker.add_entity(id, &full_name);
        Self {
            name: name.to_string(),
            parent,
            id,
            tracker: tracker.clone(),
            full_name,
        }
    }

    /// The `::` separated names from the root down to this entity.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.full_name.clone()
    }

    /// Number of ancestors above this entity.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_ref();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent.as_ref();
        }
        depth
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("full_name", &self.full_name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Create the root entity of a simulation.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    let top = Rc::new(Entity::register(tracker, None, name, name.to_string()));
    create!(top);
    top
}
