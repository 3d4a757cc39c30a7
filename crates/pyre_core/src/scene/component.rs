//! # Component Lifecycle
//!
//! A component is pure behavior plus lifecycle hooks, owned exclusively by
//! one actor. Hooks are invoked only by the owning actor's world-driven
//! fan-out, never self-invoked, and always in this partial order per actor:
//!
//! ```text
//! initialize -> added_to_level -> start_play -> tick* -> stop_play
//!            -> removed_from_level -> destroy
//! ```
//!
//! Components added after construction are caught up to the actor's current
//! state: a component added to a level-resident, playing actor receives
//! `on_added_to_level` and `on_start_play` immediately (the equip-weapon
//! flow must not miss transitions that already happened).

use crate::memory::BlockRef;
use crate::scene::NodeId;

/// Lifecycle hooks for actor-owned behavior.
///
/// All hooks default to no-ops so implementors override only what they
/// need. No hook may block: the dispatch runs on the world's single update
/// thread, once per frame.
pub trait Component {
    /// Called once, immediately after allocation, before any other hook.
    fn on_initialize(&mut self) {}

    /// Called when the owning actor becomes level-resident (or immediately,
    /// for components added to an already-resident actor).
    fn on_added_to_level(&mut self) {}

    /// Called when play starts for the owning actor (or immediately, for
    /// components added after play started).
    fn on_start_play(&mut self) {}

    /// Called every frame while the owning actor is tick-eligible.
    fn on_tick_update(&mut self, delta_time: f32) {
        let _ = delta_time;
    }

    /// Called when play stops for the owning actor.
    fn on_stop_play(&mut self) {}

    /// Called when the owning actor leaves its level.
    fn on_removed_from_level(&mut self) {}

    /// Called last, during end-of-frame reaping. Must leave the component
    /// safe for memory reuse: the arena poisons but does not zero the
    /// freed block.
    fn on_destroy(&mut self) {}
}

/// Ownership record for one component inside its actor.
///
/// The record, not the behavior object, carries the identity (unique name
/// per actor), the optional spatial node, and the arena charge.
pub(crate) struct ComponentRecord {
    /// Display name, unique within the owning actor.
    pub(crate) name: String,
    /// The behavior object.
    pub(crate) behavior: Box<dyn Component>,
    /// Spatial node, present only for spatial components.
    pub(crate) node: Option<NodeId>,
    /// Arena charge freed when the component is destroyed.
    pub(crate) block: BlockRef,
    /// Whether `on_added_to_level` has fired without a matching removal.
    pub(crate) added_to_level: bool,
}
