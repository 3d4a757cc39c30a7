//! # Engine Constants
//!
//! Hard limits and fixed parameters for the PYRE runtime core.
//!
//! **CRITICAL:** several of these values participate in arena block
//! accounting. Changing them invalidates any serialized memory statistics.

// =============================================================================
// ARENA CONFIGURATION
// =============================================================================

/// Size in bytes of one arena block header.
///
/// Every block's recorded size includes this header; the total arena
/// capacity is rounded up to a multiple of it.
pub const BLOCK_HEADER_SIZE: usize = 16;

/// Minimum allowed arena alignment. Anything smaller is a setup error.
pub const MIN_ARENA_ALIGNMENT: usize = 4;

/// Byte pattern written over a freed block's payload.
///
/// Debug aid only: a struct full of `0xDD` in a crash dump means
/// use-after-free of arena memory.
pub const FREED_BLOCK_PATTERN: u8 = 0xDD;

/// Default size of the per-world actor arena.
pub const DEFAULT_ACTOR_ARENA_BYTES: usize = 8 * 1024 * 1024;

// =============================================================================
// SCENE LIMITS
// =============================================================================

/// Maximum children one spatial node may hold.
pub const MAX_NODE_CHILDREN: usize = 64;

/// Maximum child actors one actor may hold.
pub const MAX_CHILD_ACTORS: usize = 64;

/// Default capacity of the per-world actor table.
pub const DEFAULT_MAX_ACTORS: usize = 65_536;

/// Default capacity of the per-world spatial node table.
///
/// Nodes outnumber actors (every actor has a root plus any attached
/// spatial components), so this is sized above [`DEFAULT_MAX_ACTORS`].
pub const DEFAULT_MAX_NODES: usize = 131_072;

// =============================================================================
// DISPATCH CONFIGURATION
// =============================================================================

/// Tick rate (updates per second) the frame orchestrator targets.
pub const TICK_RATE: u32 = 60;

/// Default capacity of the scene event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 2048;

/// Epsilon for transform comparisons after compose/decompose round trips.
pub const TRANSFORM_EPSILON: f32 = 1.0e-4;
