//! # Scene
//!
//! The entity/sub-object lifecycle machine and the spatial hierarchy:
//!
//! - [`Component`]: the smallest lifecycle-bearing unit, owned by one actor
//! - [`SceneGraph`]/[`SpatialNode`]: parent-child transforms with eager
//!   write-through resolution and three reparenting policies
//! - [`Actor`]: an addressable container of components and child actors
//! - [`Level`]: a duplicate-free membership set of actors
//! - [`World`]: owner of the arena, the levels, the cached capability
//!   lists, and the deferred destruction queue
//!
//! Dependency order is strictly upward: graph knows nothing about actors'
//! components, levels know nothing about transforms, and only the world
//! ties the pieces together.

mod actor;
mod component;
mod graph;
mod level;
mod world;

pub use actor::{Actor, ActorFlags, ActorId, ActorSpawnDesc};
pub use component::Component;
pub use graph::{AttachMode, DirtyState, NodeId, SceneGraph, SpatialNode};
pub use level::{Level, LevelId};
pub use world::World;

pub(crate) use component::ComponentRecord;
