//! # PYRE Core
//!
//! The runtime object-ownership and scene-graph core:
//! - Every live actor and component is charged to a fixed-capacity arena
//! - Lifecycle hooks fire in one fixed partial order per actor
//! - The transform hierarchy stays consistent under deferred mutation
//!
//! ## Architecture Rules
//!
//! 1. **Single mutator thread per world** - no locks anywhere in the scene
//! 2. **Destruction is two-phase** - mark during the frame, reap after it
//! 3. **Caches never shrink mid-iteration** - capability lists are rebuilt
//!    only from the cleanup phase
//!
//! ## Example
//!
//! ```rust
//! use pyre_core::{ActorSpawnDesc, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default());
//! let actor = world.spawn_actor("player", ActorSpawnDesc::default());
//! world.add_actor_to_level(actor, World::PERSISTENT_LEVEL);
//! assert!(world.actor(actor).is_some());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod events;
pub mod memory;
pub mod scene;

pub use config::{ConfigError, WorldConfig};
pub use events::{EventBus, EventReceiver, EventSender, SceneEvent};
pub use memory::{ArenaError, BlockArena, BlockInfo, BlockRef, SlotKey, SlotPool};
pub use scene::{
    Actor, ActorFlags, ActorId, ActorSpawnDesc, AttachMode, Component, DirtyState, Level, LevelId,
    NodeId, SceneGraph, SpatialNode, World,
};
