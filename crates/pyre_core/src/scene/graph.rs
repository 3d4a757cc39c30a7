//! # Spatial Transform Hierarchy
//!
//! Every spatial node owns a local/world transform pair, a bounded child
//! list, and a weak back-reference to its parent. Consistency is kept with
//! a two-state dirty flag and eager write-through resolution:
//!
//! ```text
//!              set_world_transform        set_local_transform
//!                     │                          │
//!                     v                          v
//!     Clean ──── LocalStale                 WorldStale ──── Clean
//!       ^            │                          │             ^
//!       └──── update_transform ──── update_transform ─────────┘
//! ```
//!
//! Resolving eagerly on write (rather than purely on next read) costs a
//! little redundant work but keeps external consumers - physics sync in
//! particular - simple: after any setter returns, both sides are valid and
//! the change notification has been published.
//!
//! Propagation is unconditional depth-first: every resolve forces all
//! children `WorldStale` and recurses, with no skip-if-already-clean
//! short-circuit. Deep or wide hierarchies pay full recomputation on every
//! ancestor write.

use pyre_shared::constants::MAX_NODE_CHILDREN;
use pyre_shared::Transform;
use tracing::warn;

use crate::events::{EventSender, SceneEvent};
use crate::memory::{SlotKey, SlotPool};
use crate::scene::ActorId;

/// Weak handle to a spatial node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(SlotKey);

impl NodeId {
    /// Null/invalid node id.
    pub const NULL: Self = Self(SlotKey::NULL);

    /// Wraps a raw slot key.
    #[inline]
    #[must_use]
    pub const fn from_key(key: SlotKey) -> Self {
        Self(key)
    }

    /// Returns the underlying slot key.
    #[inline]
    #[must_use]
    pub const fn key(self) -> SlotKey {
        self.0
    }

    /// Checks if this id is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Which side of the local/world transform pair is stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DirtyState {
    /// Resting state: local and world are mutually consistent.
    #[default]
    Clean,
    /// Local must be recomputed from an authoritative world write.
    LocalStale,
    /// World must be recomputed from an authoritative local write
    /// (including writes propagated from an ancestor).
    WorldStale,
}

/// Policy governing which transform survives a reparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachMode {
    /// Local becomes identity; world snaps to the parent's world.
    ResetTransform,
    /// Local is unchanged; world is recomputed from it.
    KeepLocalTransform,
    /// World is unchanged; local is recomputed to preserve it.
    KeepWorldTransform,
}

/// One node of the transform hierarchy.
pub struct SpatialNode {
    /// Owning actor (weak).
    owner: ActorId,
    /// Display name.
    name: String,
    /// Parent node (weak). `None` means the node is a hierarchy root.
    parent: Option<NodeId>,
    /// Child nodes, bounded by [`MAX_NODE_CHILDREN`].
    children: Vec<NodeId>,
    /// Transform relative to the parent.
    local: Transform,
    /// Transform in world space.
    world: Transform,
    /// Which side of the pair is stale.
    dirty: DirtyState,
}

impl SpatialNode {
    /// Returns the owning actor.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> ActorId {
        self.owner
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent node, if any.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the child nodes.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the local transform as last resolved.
    #[inline]
    #[must_use]
    pub const fn local_transform(&self) -> Transform {
        self.local
    }

    /// Returns the world transform as last resolved.
    #[inline]
    #[must_use]
    pub const fn world_transform(&self) -> Transform {
        self.world
    }

    /// Returns the current dirty state.
    #[inline]
    #[must_use]
    pub const fn dirty_state(&self) -> DirtyState {
        self.dirty
    }
}

/// The transform hierarchy for one world.
///
/// Owns every spatial node; actors hold weak [`NodeId`]s. No locking: the
/// hierarchy is mutated only from the world's update thread, so no reader
/// can observe a half-updated parent/child pair.
pub struct SceneGraph {
    nodes: SlotPool<SpatialNode>,
    events: EventSender,
}

impl SceneGraph {
    /// Creates a graph with a fixed node capacity.
    pub(crate) fn new(capacity: usize, events: EventSender) -> Self {
        Self {
            nodes: SlotPool::new(capacity),
            events,
        }
    }

    /// Creates a root node for `owner`.
    ///
    /// # Panics
    ///
    /// Panics if the node table is full - like arena exhaustion, this is an
    /// engine sizing problem, not a recoverable condition.
    pub(crate) fn create_node(&mut self, owner: ActorId, name: &str) -> NodeId {
        let node = SpatialNode {
            owner,
            name: name.to_owned(),
            parent: None,
            children: Vec::new(),
            local: Transform::IDENTITY,
            world: Transform::IDENTITY,
            dirty: DirtyState::Clean,
        };
        let key = self
            .nodes
            .insert(node)
            .unwrap_or_else(|| panic!("Spatial node table full ({} nodes)", self.nodes.capacity()));
        NodeId::from_key(key)
    }

    /// Removes a node.
    ///
    /// The node is detached from its parent first; its children are each
    /// detached in turn and continue as hierarchy roots, keeping their
    /// world transforms.
    pub(crate) fn remove_node(&mut self, id: NodeId) {
        self.detach(id);
        let children = self
            .nodes
            .get(id.key())
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.detach(child);
        }
        let _ = self.nodes.remove(id.key());
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.live_count()
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SpatialNode> {
        self.nodes.get(id.key())
    }

    /// Returns a node's world transform.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(id.key()).map(|n| n.world)
    }

    /// Returns a node's local transform.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(id.key()).map(|n| n.local)
    }

    /// Writes the world transform directly and resolves immediately.
    ///
    /// Returns `false` (with a warning) for an unknown node.
    pub fn set_world_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        let Some(node) = self.nodes.get_mut(id.key()) else {
            warn!(?id, "set_world_transform on unknown node");
            return false;
        };
        node.world = transform;
        node.dirty = DirtyState::LocalStale;
        self.update_transform(id);
        true
    }

    /// Writes the local transform and resolves immediately.
    ///
    /// Returns `false` (with a warning) for an unknown node.
    pub fn set_local_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        let Some(node) = self.nodes.get_mut(id.key()) else {
            warn!(?id, "set_local_transform on unknown node");
            return false;
        };
        node.local = transform;
        node.dirty = DirtyState::WorldStale;
        self.update_transform(id);
        true
    }

    /// Resolves the stale side of the pair, publishes the change, and
    /// propagates to all children.
    ///
    /// The stale side is recomputed against the parent's world transform
    /// (identity composition for hierarchy roots). Every child is then
    /// forced `WorldStale` and resolved depth-first, unconditionally.
    pub fn update_transform(&mut self, id: NodeId) {
        let parent = self.nodes.get(id.key()).and_then(|n| n.parent);
        let parent_world = parent
            .and_then(|p| self.nodes.get(p.key()))
            .map_or(Transform::IDENTITY, |p| p.world);

        let Some(node) = self.nodes.get_mut(id.key()) else {
            return;
        };
        match node.dirty {
            DirtyState::Clean => {}
            DirtyState::LocalStale => node.local = node.world.relative_to(parent_world),
            DirtyState::WorldStale => node.world = Transform::compose(parent_world, node.local),
        }
        node.dirty = DirtyState::Clean;

        let actor = node.owner;
        let world = node.world;
        let children = node.children.clone();

        let _ = self.events.send(SceneEvent::TransformChanged {
            actor,
            node: id,
            world,
        });

        for child in children {
            if let Some(c) = self.nodes.get_mut(child.key()) {
                c.dirty = DirtyState::WorldStale;
            }
            self.update_transform(child);
        }
    }

    /// Reparents `node` under `new_parent` with the given policy.
    ///
    /// No-ops (with a warning) on unknown ids, self-attach, or a parent
    /// whose child list is full. If `new_parent` is currently a child of
    /// `node`, that reverse relationship is detached first to prevent the
    /// immediate cycle.
    ///
    /// This one-hop guard is the *only* cycle prevention: a longer cycle
    /// built through several calls (A under B, B under C, C under A) is not
    /// detected. Known gap, preserved deliberately - full ancestor walks
    /// would change behavior under malformed input.
    pub fn attach(&mut self, node: NodeId, new_parent: NodeId, mode: AttachMode) -> bool {
        if !self.nodes.contains(node.key()) || !self.nodes.contains(new_parent.key()) {
            warn!(?node, ?new_parent, "attach with unknown node");
            return false;
        }
        if node == new_parent {
            warn!(?node, "attach to self ignored");
            return false;
        }

        // Capacity is checked before any structural change so a rejected
        // attach leaves the hierarchy exactly as it was. A node re-attached
        // to its current parent does not consume a new slot.
        let parent_full = self.nodes.get(new_parent.key()).is_some_and(|p| {
            p.children.len() >= MAX_NODE_CHILDREN && !p.children.contains(&node)
        });
        if parent_full {
            warn!(?node, ?new_parent, "attach to full parent ignored");
            return false;
        }

        // One-hop cycle guard: attaching to our own child first breaks the
        // reverse edge.
        let reverse = self
            .nodes
            .get(node.key())
            .is_some_and(|n| n.children.contains(&new_parent));
        if reverse {
            self.detach(new_parent);
        }

        self.detach(node);

        if let Some(parent) = self.nodes.get_mut(new_parent.key()) {
            parent.children.push(node);
        }
        if let Some(n) = self.nodes.get_mut(node.key()) {
            n.parent = Some(new_parent);
            match mode {
                AttachMode::ResetTransform => {
                    n.local = Transform::IDENTITY;
                    n.dirty = DirtyState::WorldStale;
                }
                AttachMode::KeepLocalTransform => n.dirty = DirtyState::WorldStale,
                AttachMode::KeepWorldTransform => n.dirty = DirtyState::LocalStale,
            }
        }

        self.update_transform(node);
        true
    }

    /// Detaches `node` from its parent; no-op if already a root.
    ///
    /// The world transform is retained and the local transform recomputed
    /// as if newly rooted.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node.key()).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent.key()) {
            p.children.retain(|c| *c != node);
        }
        if let Some(n) = self.nodes.get_mut(node.key()) {
            n.parent = None;
            n.dirty = DirtyState::LocalStale;
        }
        self.update_transform(node);
    }
}
