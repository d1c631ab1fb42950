// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The component tree.
//!
//! All components of a model live in one [`Tree`], an arena keyed by
//! [`ActorId`]. Components are created detached and then attached to
//! exactly one container:
//!
//!  - ordered containers (series, parallel) with [`Tree::push`],
//!  - named containers (network, router) with [`Tree::add`],
//!  - decorators (pass-through, queue, timeout) with [`Tree::set_target`].
//!
//! Names only need to be unique among siblings. Components refer to each
//! other by name and the name is resolved late by walking up the tree from
//! the component making the call (see [`Tree::resolve_name`]).
//!
//! Every component has an [`Entity`] whose full name follows its position in
//! the tree so that log output can be filtered by path.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use dsim_model_builder::EntityDisplay;
use dsim_track::entity::{Entity, toplevel};
use dsim_track::{Tracker, debug};

use crate::message::Address;
use crate::processor::Processor;
use crate::property::PropertySpec;
use crate::sim_error;
use crate::system::network::Forward;
use crate::system::{Behaviour, Policy, Queue, System, Timeout};
use crate::types::{SimError, SimResult};

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique component identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl ActorId {
    /// Allocate a new identifier.
    ///
    /// Components get one when they are created. External drivers that
    /// inject sends without being part of the tree can allocate their own.
    #[must_use]
    pub fn next() -> Self {
        ActorId(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Series,
    Parallel,
    Network,
    Router,
    Decorator,
    Queue,
    Timeout,
}

impl NodeKind {
    #[must_use]
    pub fn is_container(self) -> bool {
        self != NodeKind::Leaf
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a component holds its children.
#[derive(Clone, Debug)]
enum Children {
    None,
    Ordered(Vec<ActorId>),
    Named(Vec<ActorId>),
    Single(Option<ActorId>),
}

impl Children {
    fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Leaf => Children::None,
            NodeKind::Series | NodeKind::Parallel => Children::Ordered(Vec::new()),
            NodeKind::Network | NodeKind::Router => Children::Named(Vec::new()),
            NodeKind::Decorator | NodeKind::Queue | NodeKind::Timeout => Children::Single(None),
        }
    }

    fn ids(&self) -> &[ActorId] {
        match self {
            Children::None => &[],
            Children::Ordered(ids) | Children::Named(ids) => ids,
            Children::Single(target) => target.as_slice(),
        }
    }

    fn remove(&mut self, child: ActorId) {
        match self {
            Children::None => {}
            Children::Ordered(ids) | Children::Named(ids) => ids.retain(|id| *id != child),
            Children::Single(target) => {
                if *target == Some(child) {
                    *target = None;
                }
            }
        }
    }
}

/// One component in the [`Tree`].
#[derive(EntityDisplay)]
pub struct Node {
    pub entity: Rc<Entity>,
    id: ActorId,
    kind: NodeKind,
    parent: Option<ActorId>,
    children: Children,
    metadata: BTreeMap<String, String>,
    defs: BTreeMap<String, String>,

    /// Lifted out while the component is handling an event.
    behaviour: Option<Behaviour>,
}

impl Node {
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.entity.name
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ActorId] {
        self.children.ids()
    }
}

/// The arena holding every component of a model.
pub struct Tree {
    top: Rc<Entity>,
    nodes: BTreeMap<ActorId, Node>,
}

impl Tree {
    #[must_use]
    pub fn new(tracker: &Tracker) -> Self {
        Self {
            top: toplevel(tracker, "top"),
            nodes: BTreeMap::new(),
        }
    }

    /// The entity every detached component hangs off.
    #[must_use]
    pub fn top(&self) -> &Rc<Entity> {
        &self.top
    }

    fn insert(&mut self, name: &str, kind: NodeKind, behaviour: Behaviour) -> ActorId {
        let id = ActorId::next();
        let node = Node {
            entity: Rc::new(Entity::new(&self.top, name)),
            id,
            kind,
            parent: None,
            children: Children::for_kind(kind),
            metadata: BTreeMap::new(),
            defs: BTreeMap::new(),
            behaviour: Some(behaviour),
        };
        self.nodes.insert(id, node);
        id
    }

    /// Create a leaf component.
    pub fn new_leaf<P>(&mut self, name: &str, processor: P) -> ActorId
    where
        P: Processor + 'static,
    {
        self.insert(name, NodeKind::Leaf, Behaviour::Leaf(Box::new(processor)))
    }

    pub fn new_series(&mut self, name: &str) -> ActorId {
        self.insert(name, NodeKind::Series, Behaviour::System(System::Series))
    }

    pub fn new_parallel(&mut self, name: &str) -> ActorId {
        let system = System::Parallel {
            pending: Default::default(),
        };
        self.insert(name, NodeKind::Parallel, Behaviour::System(system))
    }

    pub fn new_network(&mut self, name: &str) -> ActorId {
        let system = System::Network {
            forwards: Vec::new(),
        };
        self.insert(name, NodeKind::Network, Behaviour::System(system))
    }

    /// Create a network that forwards each method to the child of the same
    /// name.
    pub fn new_router(&mut self, name: &str) -> ActorId {
        let system = System::Network {
            forwards: Vec::new(),
        };
        self.insert(name, NodeKind::Router, Behaviour::System(system))
    }

    pub fn new_decorator(&mut self, name: &str) -> ActorId {
        let system = System::Decorator(Policy::PassThrough);
        self.insert(name, NodeKind::Decorator, Behaviour::System(system))
    }

    pub fn new_queue(&mut self, name: &str, queue: Queue) -> ActorId {
        let system = System::Decorator(Policy::Queue(queue));
        self.insert(name, NodeKind::Queue, Behaviour::System(system))
    }

    pub fn new_timeout(&mut self, name: &str, timeout: Timeout) -> ActorId {
        let system = System::Decorator(Policy::Timeout(timeout));
        self.insert(name, NodeKind::Timeout, Behaviour::System(system))
    }

    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.nodes.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: ActorId) -> Result<&Node, SimError> {
        match self.nodes.get(&id) {
            Some(node) => Ok(node),
            None => sim_error!(format!("Unknown actor: {id}")),
        }
    }

    fn node_mut(&mut self, id: ActorId) -> Result<&mut Node, SimError> {
        match self.nodes.get_mut(&id) {
            Some(node) => Ok(node),
            None => sim_error!(format!("Unknown actor: {id}")),
        }
    }

    /// The name of a component, or an empty string for an unknown id.
    #[must_use]
    pub fn name(&self, id: ActorId) -> &str {
        self.nodes.get(&id).map_or("", Node::name)
    }

    #[must_use]
    pub fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    #[must_use]
    pub fn children(&self, id: ActorId) -> &[ActorId] {
        match self.nodes.get(&id) {
            Some(node) => node.children(),
            None => &[],
        }
    }

    #[must_use]
    pub fn child_count(&self, id: ActorId) -> usize {
        self.children(id).len()
    }

    #[must_use]
    pub fn child_at(&self, id: ActorId, index: usize) -> Option<ActorId> {
        self.children(id).get(index).copied()
    }

    #[must_use]
    pub fn index_of(&self, id: ActorId, child: ActorId) -> Option<usize> {
        self.children(id).iter().position(|c| *c == child)
    }

    #[must_use]
    pub fn child_named(&self, id: ActorId, name: &str) -> Option<ActorId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.name(*child) == name)
    }

    /// The target of a decorator.
    #[must_use]
    pub fn target(&self, id: ActorId) -> Option<ActorId> {
        match self.nodes.get(&id).map(|node| &node.children) {
            Some(Children::Single(target)) => *target,
            _ => None,
        }
    }

    /// Whether `id` is `ancestor` or lies below it.
    #[must_use]
    pub fn is_descendant_of(&self, id: ActorId, ancestor: ActorId) -> bool {
        let mut curr = Some(id);
        while let Some(node) = curr {
            if node == ancestor {
                return true;
            }
            curr = self.parent(node);
        }
        false
    }

    /// Check that `child` may be attached to `container`.
    ///
    /// Returns `Ok(true)` if it is already attached there.
    fn validate_child(&self, container: ActorId, child: ActorId) -> Result<bool, SimError> {
        let parent = self.node(container)?;
        let node = self.node(child)?;
        if !parent.kind.is_container() {
            return sim_error!(format!("{} is not a container", parent.name()));
        }
        if let Some(existing) = self.child_named(container, node.name()) {
            if existing == child {
                return Ok(true);
            }
            return sim_error!(format!(
                "Child with given name ({}) already exists in the system.  Create child with a different name.",
                node.name()
            ));
        }
        self.validate_detached(container, child)?;
        Ok(false)
    }

    /// Check that `child` is neither an ancestor of `container` nor owned by
    /// another container.
    fn validate_detached(&self, container: ActorId, child: ActorId) -> SimResult {
        let parent = self.node(container)?;
        let node = self.node(child)?;
        if self.is_descendant_of(container, child) {
            return sim_error!(format!(
                "Child ({}) is already an ancestor of this System ({})",
                node.name(),
                parent.name()
            ));
        }
        if let Some(owner) = node.parent {
            if owner != container {
                return sim_error!(format!(
                    "Child ({}) already belongs to another System ({}).  Remove it first or clone it",
                    node.name(),
                    self.name(owner)
                ));
            }
        }
        Ok(())
    }

    fn attach(&mut self, container: ActorId, child: ActorId) -> SimResult {
        let parent = self.node_mut(container)?;
        let parent_entity = parent.entity.clone();
        match &mut parent.children {
            Children::Ordered(ids) | Children::Named(ids) => ids.push(child),
            Children::Single(target) => *target = Some(child),
            Children::None => {
                return sim_error!(format!("{} is not a container", parent_entity.name));
            }
        }
        self.node_mut(child)?.parent = Some(container);
        self.rebuild_entities(child, &parent_entity);
        debug!(parent_entity ; "attached {}", self.name(child));
        Ok(())
    }

    fn rebuild_entities(&mut self, id: ActorId, parent: &Rc<Entity>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let entity = Rc::new(node.entity.moved_to(parent));
        node.entity = entity.clone();
        let children = node.children.ids().to_vec();
        for child in children {
            self.rebuild_entities(child, &entity);
        }
    }

    /// Append a child to a series or parallel container.
    ///
    /// Pushing a child that is already there does nothing.
    pub fn push(&mut self, container: ActorId, child: ActorId) -> SimResult {
        if !matches!(self.node(container)?.children, Children::Ordered(_)) {
            return sim_error!(format!(
                "{} is not an ordered container",
                self.name(container)
            ));
        }
        if self.validate_child(container, child)? {
            return Ok(());
        }
        self.attach(container, child)
    }

    /// Add a child to a network or router.
    pub fn add(&mut self, container: ActorId, child: ActorId) -> SimResult {
        let node = self.node(container)?;
        if !node.kind.is_container() {
            return sim_error!(format!("{} is not a container", node.name()));
        }
        if !matches!(node.children, Children::Named(_)) {
            return sim_error!(format!("{} is not a network", node.name()));
        }
        let is_router = node.kind == NodeKind::Router;
        if self.validate_child(container, child)? {
            return Ok(());
        }
        self.attach(container, child)?;
        if is_router {
            let name = self.name(child).to_string();
            self.forward_input(container, &name, child, None)?;
        }
        Ok(())
    }

    /// Set the target of a decorator, detaching any previous target.
    ///
    /// The previous target stays in place if `child` is rejected.
    pub fn set_target(&mut self, decorator: ActorId, child: ActorId) -> SimResult {
        if !matches!(self.node(decorator)?.children, Children::Single(_)) {
            return sim_error!(format!("{} is not a decorator", self.name(decorator)));
        }
        let previous = self.target(decorator);
        if previous == Some(child) {
            return Ok(());
        }
        self.validate_detached(decorator, child)?;
        if let Some(previous) = previous {
            self.remove(decorator, previous)?;
        }
        self.attach(decorator, child)
    }

    /// Attach `child` to `container` whatever kind of container it is.
    pub fn add_child(&mut self, container: ActorId, child: ActorId) -> SimResult {
        match self.node(container)?.children {
            Children::Ordered(_) => self.push(container, child),
            Children::Named(_) => self.add(container, child),
            Children::Single(_) => self.set_target(container, child),
            Children::None => sim_error!(format!("{} is not a container", self.name(container))),
        }
    }

    /// Detach `child` from `container`. Forwarding rules to it are dropped.
    ///
    /// Returns `Ok(false)` if it was not a child of `container`.
    pub fn remove(&mut self, container: ActorId, child: ActorId) -> Result<bool, SimError> {
        if self.parent(child) != Some(container) {
            return Ok(false);
        }
        let parent = self.node_mut(container)?;
        parent.children.remove(child);
        if let Some(Behaviour::System(System::Network { forwards })) = &mut parent.behaviour {
            forwards.retain(|forward| forward.target != child);
        }
        self.node_mut(child)?.parent = None;
        let top = self.top.clone();
        self.rebuild_entities(child, &top);
        Ok(true)
    }

    fn forwards_mut(&mut self, network: ActorId) -> Result<&mut Vec<Forward>, SimError> {
        let node = self.node_mut(network)?;
        match &mut node.behaviour {
            Some(Behaviour::System(System::Network { forwards })) => Ok(forwards),
            Some(_) => sim_error!(format!("{} is not a network", node.entity.name)),
            None => sim_error!(format!("{} is busy", node.entity.name)),
        }
    }

    /// Forward sends calling `input` (or `*` for all) to `target`, renaming
    /// the method to `target_input` if given.
    pub fn forward_input(
        &mut self,
        network: ActorId,
        input: &str,
        target: ActorId,
        target_input: Option<&str>,
    ) -> SimResult {
        if self.parent(target) != Some(network) {
            return sim_error!(format!("{} is not a child", self.name(target)));
        }
        self.forwards_mut(network)?.push(Forward {
            input: input.to_string(),
            target,
            target_input: target_input.map(str::to_string),
        });
        Ok(())
    }

    /// As [`Tree::forward_input`] with the target given by name.
    pub fn forward_input_by_name(
        &mut self,
        network: ActorId,
        input: &str,
        target: &str,
        target_input: Option<&str>,
    ) -> SimResult {
        let Some(child) = self.child_named(network, target) else {
            return sim_error!(format!("Cannot find child actor: {target}"));
        };
        self.forward_input(network, input, child, target_input)
    }

    #[must_use]
    pub fn forwards(&self, network: ActorId) -> &[Forward] {
        match self.nodes.get(&network).and_then(|node| node.behaviour.as_ref()) {
            Some(Behaviour::System(System::Network { forwards })) => forwards.as_slice(),
            _ => &[],
        }
    }

    /// Deep copy a component and everything below it under a new name.
    ///
    /// The copy is detached, has fresh identities and fresh runtime state
    /// (nothing queued, nothing in flight) but the same configuration,
    /// properties, metadata and definitions.
    pub fn clone_subtree(&mut self, id: ActorId, name: &str) -> Result<ActorId, SimError> {
        let node = self.node(id)?;
        let Some(behaviour) = &node.behaviour else {
            return sim_error!(format!("{} is busy", node.name()));
        };
        let kind = node.kind;
        let behaviour = behaviour.clone_fresh();
        let metadata = node.metadata.clone();
        let defs = node.defs.clone();
        let children: Vec<(ActorId, String)> = node
            .children
            .ids()
            .iter()
            .map(|child| (*child, self.name(*child).to_string()))
            .collect();

        let copy = self.insert(name, kind, behaviour);
        if let Some(node) = self.nodes.get_mut(&copy) {
            node.metadata = metadata;
            node.defs = defs;
        }

        let mut remap = BTreeMap::new();
        for (child, child_name) in children {
            let child_copy = self.clone_subtree(child, &child_name)?;
            remap.insert(child, child_copy);
            self.attach(copy, child_copy)?;
        }
        if let Ok(forwards) = self.forwards_mut(copy) {
            for forward in forwards.iter_mut() {
                if let Some(target) = remap.get(&forward.target) {
                    forward.target = *target;
                }
            }
        }
        Ok(copy)
    }

    /// The dotted names from just below `ancestor` down to `id`.
    ///
    /// Returns `None` if `id` is not below `ancestor`.
    #[must_use]
    pub fn path_until(&self, id: ActorId, ancestor: ActorId) -> Option<String> {
        let mut names = Vec::new();
        let mut curr = id;
        while curr != ancestor {
            names.push(self.name(curr));
            curr = self.parent(curr)?;
        }
        names.reverse();
        Some(names.join("."))
    }

    /// Find a component by dotted path of names below `root`.
    ///
    /// An empty path is `root` itself.
    #[must_use]
    pub fn actor_by_path(&self, root: ActorId, path: &str) -> Option<ActorId> {
        if path.is_empty() {
            return Some(root);
        }
        path.split('.')
            .try_fold(root, |curr, name| self.child_named(curr, name))
    }

    fn split_property_path<'p>(
        &self,
        root: ActorId,
        path: &'p str,
    ) -> Result<(ActorId, &'p str), SimError> {
        let (actor_path, property) = path.rsplit_once('.').unwrap_or(("", path));
        match self.actor_by_path(root, actor_path) {
            Some(id) => Ok((id, property)),
            None => sim_error!(format!("Cannot find actor at path: {actor_path}")),
        }
    }

    /// The schema of the properties of a component.
    #[must_use]
    pub fn property_specs(&self, id: ActorId) -> &'static [PropertySpec] {
        use crate::property::Properties;
        match self.nodes.get(&id).and_then(|node| node.behaviour.as_ref()) {
            Some(Behaviour::Leaf(processor)) => processor.property_specs(),
            Some(Behaviour::System(System::Decorator(Policy::Queue(queue)))) => {
                queue.property_specs()
            }
            Some(Behaviour::System(System::Decorator(Policy::Timeout(timeout)))) => {
                timeout.property_specs()
            }
            _ => &[],
        }
    }

    #[must_use]
    pub fn property(&self, id: ActorId, name: &str) -> Option<f64> {
        use crate::property::Properties;
        match self.nodes.get(&id)?.behaviour.as_ref()? {
            Behaviour::Leaf(processor) => processor.property(name),
            Behaviour::System(System::Decorator(Policy::Queue(queue))) => queue.property(name),
            Behaviour::System(System::Decorator(Policy::Timeout(timeout))) => {
                timeout.property(name)
            }
            Behaviour::System(_) => None,
        }
    }

    pub fn set_property(&mut self, id: ActorId, name: &str, value: f64) -> SimResult {
        use crate::property::Properties;
        let node = self.node_mut(id)?;
        let result = match node.behaviour.as_mut() {
            Some(Behaviour::Leaf(processor)) => processor.set_property(name, value),
            Some(Behaviour::System(System::Decorator(Policy::Queue(queue)))) => {
                queue.set_property(name, value)
            }
            Some(Behaviour::System(System::Decorator(Policy::Timeout(timeout)))) => {
                timeout.set_property(name, value)
            }
            Some(Behaviour::System(_)) => sim_error!(format!("Unknown property: {name}")),
            None => sim_error!(format!("{} is busy", node.entity.name)),
        };
        if result.is_ok() {
            debug!(node.entity ; "{name} = {value}");
        }
        result
    }

    /// Read a property by dotted path, for example `web.db.put_latency`.
    #[must_use]
    pub fn property_by_path(&self, root: ActorId, path: &str) -> Option<f64> {
        let (id, property) = self.split_property_path(root, path).ok()?;
        self.property(id, property)
    }

    pub fn set_property_by_path(&mut self, root: ActorId, path: &str, value: f64) -> SimResult {
        let (id, property) = self.split_property_path(root, path)?;
        self.set_property(id, property, value)
    }

    pub fn set_metadata(&mut self, id: ActorId, key: &str, value: &str) -> SimResult {
        self.node_mut(id)?
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[must_use]
    pub fn metadata(&self, id: ActorId, key: &str) -> Option<&str> {
        self.nodes
            .get(&id)?
            .metadata
            .get(key)
            .map(String::as_str)
    }

    pub fn set_def(&mut self, id: ActorId, key: &str, value: &str) -> SimResult {
        self.node_mut(id)?
            .defs
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Look up a definition on a component or, failing that, its closest
    /// ancestor that has one.
    #[must_use]
    pub fn def(&self, id: ActorId, key: &str) -> Option<&str> {
        let mut curr = Some(id);
        while let Some(node) = curr.and_then(|id| self.nodes.get(&id)) {
            if let Some(value) = node.defs.get(key) {
                return Some(value);
            }
            curr = node.parent;
        }
        None
    }

    /// Find the component `name` refers to when used by `from`.
    ///
    /// Each container from `from` upwards is asked for a child of that name;
    /// a leaf starts with its parent. A timeout asked on behalf of its own
    /// target answers with itself, so the calls its target makes pass
    /// through it.
    #[must_use]
    pub fn resolve_name(&self, from: ActorId, name: &str) -> Option<ActorId> {
        let mut prev = None;
        let mut curr = from;
        loop {
            let node = self.nodes.get(&curr)?;
            if node.kind.is_container() {
                if node.kind == NodeKind::Timeout && prev.is_some() && prev == self.target(curr) {
                    return Some(curr);
                }
                if let Some(child) = self.child_named(curr, name) {
                    return Some(child);
                }
            }
            prev = Some(curr);
            curr = node.parent?;
        }
    }

    /// Find the component that should receive a send to `address` made by
    /// `from`.
    #[must_use]
    pub fn resolve_address(&self, from: ActorId, address: &Address) -> Option<ActorId> {
        self.resolve_name(from, &address.dest)
    }

    /// Typed access to a leaf's processor.
    pub fn processor<P: Processor + 'static>(&self, id: ActorId) -> Result<&P, SimError> {
        let node = self.node(id)?;
        match &node.behaviour {
            Some(Behaviour::Leaf(processor)) => match processor.as_any().downcast_ref::<P>() {
                Some(p) => Ok(p),
                None => sim_error!(format!(
                    "{} is not a {}",
                    node.name(),
                    std::any::type_name::<P>()
                )),
            },
            _ => sim_error!(format!("{} is not a leaf", node.name())),
        }
    }

    pub fn processor_mut<P: Processor + 'static>(
        &mut self,
        id: ActorId,
    ) -> Result<&mut P, SimError> {
        let node = self.node_mut(id)?;
        let name = node.entity.name.clone();
        match &mut node.behaviour {
            Some(Behaviour::Leaf(processor)) => match processor.as_any_mut().downcast_mut::<P>() {
                Some(p) => Ok(p),
                None => sim_error!(format!("{name} is not a {}", std::any::type_name::<P>())),
            },
            _ => sim_error!(format!("{name} is not a leaf")),
        }
    }

    pub fn queue(&self, id: ActorId) -> Result<&Queue, SimError> {
        let node = self.node(id)?;
        match &node.behaviour {
            Some(Behaviour::System(System::Decorator(Policy::Queue(queue)))) => Ok(queue),
            _ => sim_error!(format!("{} is not a queue", node.name())),
        }
    }

    pub fn queue_mut(&mut self, id: ActorId) -> Result<&mut Queue, SimError> {
        let node = self.node_mut(id)?;
        match &mut node.behaviour {
            Some(Behaviour::System(System::Decorator(Policy::Queue(queue)))) => Ok(queue),
            _ => sim_error!(format!("{} is not a queue", node.entity.name)),
        }
    }

    pub fn timeout(&self, id: ActorId) -> Result<&Timeout, SimError> {
        let node = self.node(id)?;
        match &node.behaviour {
            Some(Behaviour::System(System::Decorator(Policy::Timeout(timeout)))) => Ok(timeout),
            _ => sim_error!(format!("{} is not a timeout", node.name())),
        }
    }

    pub fn timeout_mut(&mut self, id: ActorId) -> Result<&mut Timeout, SimError> {
        let node = self.node_mut(id)?;
        match &mut node.behaviour {
            Some(Behaviour::System(System::Decorator(Policy::Timeout(timeout)))) => Ok(timeout),
            _ => sim_error!(format!("{} is not a timeout", node.entity.name)),
        }
    }

    pub(crate) fn take_behaviour(
        &mut self,
        id: ActorId,
    ) -> Result<(Behaviour, Rc<Entity>), SimError> {
        let node = self.node_mut(id)?;
        match node.behaviour.take() {
            Some(behaviour) => Ok((behaviour, node.entity.clone())),
            None => sim_error!(format!("{} is busy", node.entity.name)),
        }
    }

    pub(crate) fn restore_behaviour(&mut self, id: ActorId, behaviour: Behaviour) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.behaviour = Some(behaviour);
        }
    }

    /// Reset the runtime state of every component.
    pub fn reset_all(&mut self) {
        for node in self.nodes.values_mut() {
            if let Some(behaviour) = &mut node.behaviour {
                behaviour.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::start_test;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = ActorId::next();
        let b = ActorId::next();
        assert!(b > a);
        assert_eq!(format!("{}", ActorId(3)), "#3");
    }

    #[test]
    fn entity_names_follow_tree() {
        let mut tree = start_test(file!());
        let net = tree.new_network("net");
        let queue = tree.new_queue("queue", Queue::default());
        let series = tree.new_series("series");
        tree.set_target(queue, series).unwrap();
        tree.add(net, queue).unwrap();
        assert_eq!(
            tree.node(series).unwrap().entity.full_name(),
            "top::net::queue::series"
        );

        assert!(tree.remove(net, queue).unwrap());
        assert_eq!(
            format!("{}", tree.node(series).unwrap()),
            "top::queue::series"
        );
    }
}
