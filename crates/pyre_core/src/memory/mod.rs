//! # Memory Management
//!
//! Entity memory for PYRE worlds:
//! - [`BlockArena`]: a named fixed-capacity byte buffer partitioned into a
//!   chain of variable-size blocks, first-fit allocated, lazily coalesced.
//! - [`SlotPool`]: a generational slot table that owns the typed actor and
//!   node records whose byte budget the arena accounts for.

mod arena;
mod slots;

pub use arena::{ArenaError, BlockArena, BlockInfo, BlockRef};
pub use slots::{SlotKey, SlotPool};
