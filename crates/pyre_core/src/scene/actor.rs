//! # Actor
//!
//! An addressable simulated entity: a container of components plus a
//! bounded list of child actors, with exactly one designated root spatial
//! node through which all positional queries and mutations are routed.
//!
//! Actors are owned by their world's slot pool; the `parent` and `level`
//! fields are weak back-references, never second owners.

use crate::memory::{BlockRef, SlotKey};
use crate::scene::{ComponentRecord, LevelId, NodeId};

/// Weak handle to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorId(SlotKey);

impl ActorId {
    /// Null/invalid actor id.
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

impl Default for ActorId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Bitmask of actor lifecycle flags.
///
/// Hand-rolled: six bits do not justify a dependency, and the mask is
/// copied around in hot dispatch loops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActorFlags(u32);

impl ActorFlags {
    /// Reserved: marks actors intended for persistent-level residence.
    /// Carried through spawn but not yet consulted by any lifecycle path.
    pub const PERSISTENT: u32 = 1 << 0;
    /// Wants `on_tick_update` dispatch every frame.
    pub const WANTS_TICK: u32 = 1 << 1;
    /// Wants `on_start_play` / `on_stop_play` dispatch.
    pub const WANTS_START_STOP_PLAY: u32 = 1 << 2;
    /// Currently a member of a level.
    pub const ADDED_TO_LEVEL: u32 = 1 << 3;
    /// `on_start_play` has fired without a matching stop.
    pub const STARTED_PLAY: u32 = 1 << 4;
    /// Marked for destruction; reaped at end of frame.
    pub const PENDING_DESTROY: u32 = 1 << 5;

    /// Empty flag set.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Checks whether every bit in `bits` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, bits: u32) -> bool {
        (self.0 & bits) == bits
    }

    /// Sets the given bits.
    #[inline]
    pub fn insert(&mut self, bits: u32) {
        self.0 |= bits;
    }

    /// Clears the given bits.
    #[inline]
    pub fn remove(&mut self, bits: u32) {
        self.0 &= !bits;
    }
}

/// Spawn-time actor parameters.
#[derive(Clone, Copy, Debug)]
pub struct ActorSpawnDesc {
    /// Mark the actor persistent.
    pub persistent: bool,
    /// Opt in to per-frame tick dispatch.
    pub wants_tick: bool,
    /// Opt in to start/stop-play dispatch.
    pub wants_start_stop_play: bool,
    /// Initial world transform of the root node.
    pub transform: pyre_shared::Transform,
}

impl Default for ActorSpawnDesc {
    fn default() -> Self {
        Self {
            persistent: false,
            wants_tick: false,
            wants_start_stop_play: true,
            transform: pyre_shared::Transform::IDENTITY,
        }
    }
}

/// An addressable simulated entity.
///
/// Constructed only through `World::spawn_actor`; by the time a caller sees
/// an `ActorId`, initialization has completed and the root node exists.
pub struct Actor {
    /// Display name. Not required to be unique across the world.
    pub(crate) name: String,
    /// Lifecycle flag bitmask.
    pub(crate) flags: ActorFlags,
    /// Level this actor is resident in, if any (weak).
    pub(crate) level: Option<LevelId>,
    /// Parent actor, if attached (weak).
    pub(crate) parent: Option<ActorId>,
    /// Child actors, bounded by `MAX_CHILD_ACTORS`.
    pub(crate) children: Vec<ActorId>,
    /// Owned components, unique by name, fan-out in insertion order.
    pub(crate) components: Vec<ComponentRecord>,
    /// The designated root spatial node.
    pub(crate) root: NodeId,
    /// Arena charge freed when the actor is reaped.
    pub(crate) block: BlockRef,
}

impl Actor {
    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lifecycle flags.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> ActorFlags {
        self.flags
    }

    /// Returns the level this actor is resident in.
    #[inline]
    #[must_use]
    pub const fn level(&self) -> Option<LevelId> {
        self.level
    }

    /// Returns the parent actor, if attached.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    /// Returns the child actors.
    #[must_use]
    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    /// Returns the root spatial node.
    #[inline]
    #[must_use]
    pub const fn root_node(&self) -> NodeId {
        self.root
    }

    /// Checks whether a component with `name` is owned by this actor.
    #[must_use]
    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.name == name)
    }

    /// Returns the number of owned components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Iterates owned component names in insertion order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name.as_str())
    }

    /// Whether this actor is marked for end-of-frame destruction.
    #[inline]
    #[must_use]
    pub const fn is_pending_destroy(&self) -> bool {
        self.flags.contains(ActorFlags::PENDING_DESTROY)
    }

    /// Whether `on_start_play` has fired without a matching stop.
    #[inline]
    #[must_use]
    pub const fn has_started_play(&self) -> bool {
        self.flags.contains(ActorFlags::STARTED_PLAY)
    }

    /// Fans `on_tick_update` out to owned components in insertion order.
    pub(crate) fn fan_out_tick(&mut self, delta_time: f32) {
        for record in &mut self.components {
            record.behavior.on_tick_update(delta_time);
        }
    }

    /// Fans `on_start_play` out and records the transition.
    pub(crate) fn fan_out_start_play(&mut self) {
        self.flags.insert(ActorFlags::STARTED_PLAY);
        for record in &mut self.components {
            record.behavior.on_start_play();
        }
    }

    /// Fans `on_stop_play` out and records the transition.
    pub(crate) fn fan_out_stop_play(&mut self) {
        self.flags.remove(ActorFlags::STARTED_PLAY);
        for record in &mut self.components {
            record.behavior.on_stop_play();
        }
    }

    /// Fans `on_added_to_level` out and records the transition.
    pub(crate) fn fan_out_added_to_level(&mut self) {
        self.flags.insert(ActorFlags::ADDED_TO_LEVEL);
        for record in &mut self.components {
            record.behavior.on_added_to_level();
            record.added_to_level = true;
        }
    }

    /// Fans `on_removed_from_level` out and records the transition.
    pub(crate) fn fan_out_removed_from_level(&mut self) {
        self.flags.remove(ActorFlags::ADDED_TO_LEVEL);
        for record in &mut self.components {
            record.behavior.on_removed_from_level();
            record.added_to_level = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_mask_operations() {
        let mut flags = ActorFlags::empty();
        assert!(!flags.contains(ActorFlags::WANTS_TICK));

        flags.insert(ActorFlags::WANTS_TICK | ActorFlags::PERSISTENT);
        assert!(flags.contains(ActorFlags::WANTS_TICK));
        assert!(flags.contains(ActorFlags::PERSISTENT));
        assert!(flags.contains(ActorFlags::WANTS_TICK | ActorFlags::PERSISTENT));
        assert!(!flags.contains(ActorFlags::PENDING_DESTROY));

        flags.remove(ActorFlags::WANTS_TICK);
        assert!(!flags.contains(ActorFlags::WANTS_TICK));
        assert!(flags.contains(ActorFlags::PERSISTENT));
    }

    #[test]
    fn test_null_actor_id() {
        assert!(ActorId::NULL.is_null());
        assert!(ActorId::default().is_null());
    }
}
