//! # Level
//!
//! An unordered, duplicate-free membership set of actors within one world.
//!
//! Levels own no actor memory (the world's slot pool does) and no spatial
//! state; they are pure membership. The first level of every world is the
//! persistent level and cannot be removed.

use crate::scene::ActorId;

/// Identifier of a level within its world.
///
/// Plain index: levels are never recycled within a world's lifetime, a
/// removed level's slot simply stays empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a level id from a raw index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// A membership set of actors.
pub struct Level {
    /// Display name, unique within the world.
    name: String,
    /// Member actors. Insertion order is an accident; no code may rely on it.
    actors: Vec<ActorId>,
    /// Set when the level is queued for end-of-frame removal.
    pending_destroy: bool,
}

impl Level {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            actors: Vec::new(),
            pending_destroy: false,
        }
    }

    /// Returns the level name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member actors.
    #[must_use]
    pub fn actors(&self) -> &[ActorId] {
        &self.actors
    }

    /// Returns the number of member actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, actor: ActorId) -> bool {
        self.actors.contains(&actor)
    }

    /// Whether this level is queued for end-of-frame removal.
    #[must_use]
    pub const fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    /// Adds an actor. Returns `false` if it was already a member.
    pub(crate) fn insert(&mut self, actor: ActorId) -> bool {
        if self.contains(actor) {
            return false;
        }
        self.actors.push(actor);
        true
    }

    /// Removes an actor, if present.
    pub(crate) fn remove(&mut self, actor: ActorId) {
        self.actors.retain(|a| *a != actor);
    }

    pub(crate) fn mark_pending_destroy(&mut self) {
        self.pending_destroy = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SlotKey;

    #[test]
    fn test_membership_is_duplicate_free() {
        let mut level = Level::new("Test");
        let a = ActorId::from_key(SlotKey::new(1, 1));

        assert!(level.insert(a));
        assert!(!level.insert(a));
        assert_eq!(level.actor_count(), 1);

        level.remove(a);
        assert!(!level.contains(a));
        assert_eq!(level.actor_count(), 0);
    }
}
