//! # PYRE
//!
//! The engine's frame driver, integrating the scene core into a per-frame
//! cadence:
//!
//! ```text
//! Frame N:
//! ┌────────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME                                             │
//! │    └─ Measure and clamp delta time                         │
//! │                                                            │
//! │ 2. TICK DISPATCH                                           │
//! │    └─ on_tick_update over the cached tick list             │
//! │                                                            │
//! │ 3. POST-TICK PHASE (optional)                              │
//! │    └─ Caller hook - physics sync, gameplay systems         │
//! │                                                            │
//! │ 4. CLEANUP                                                 │
//! │    └─ Reap everything marked for destruction this frame    │
//! │                                                            │
//! │ 5. END FRAME                                               │
//! │    └─ Record timing, warn on budget overrun                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `sim_loop`: frame orchestration and timing

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod sim_loop;

// Re-export the scene core
pub use pyre_core as core;
pub use pyre_shared as shared;

// Re-export commonly used types
pub use pyre_core::{
    Actor, ActorId, ActorSpawnDesc, AttachMode, Component, Level, LevelId, NodeId, SceneEvent,
    World, WorldConfig,
};
pub use sim_loop::{FrameStats, FrameStatsAccumulator, SimLoop, SimLoopConfig};
