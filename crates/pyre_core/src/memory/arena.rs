//! # Block Arena
//!
//! A named, fixed-capacity byte buffer partitioned into a chain of
//! variable-size blocks. Serves every actor and component allocation in a
//! world with an O(n) first-fit scan and lazy coalescing.
//!
//! The trade is deliberate: allocation is slow-ish, but there is zero
//! external bookkeeping and entity memory stays local. Actor churn is low
//! relative to per-frame update rates, so the scan never shows up in
//! profiles.
//!
//! # Thread Safety
//!
//! Not thread-safe. The arena is mutated only from its world's update
//! thread; worker threads must marshal allocation requests back to it.

use pyre_shared::constants::{BLOCK_HEADER_SIZE, FREED_BLOCK_PATTERN, MIN_ARENA_ALIGNMENT};
use thiserror::Error;
use tracing::error;

/// Errors from arena deallocation.
///
/// These are programmer-error invariant violations: they are logged and
/// rejected, never silently accepted, and never "fixed up".
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    /// The handle's offset lies outside the arena's byte range.
    #[error("offset {0} is outside the arena byte range")]
    OutOfRange(usize),
    /// The handle's offset does not point exactly past a block header.
    #[error("offset {0} does not point past a block header")]
    UnknownBlock(usize),
    /// The referenced block is already free.
    #[error("block with payload at offset {0} is already free")]
    DoubleFree(usize),
}

/// Handle to an allocated block.
///
/// Safe-Rust stand-in for "a pointer exactly past one block header": it
/// carries the payload's byte offset into the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRef {
    /// Payload offset into the arena buffer.
    offset: usize,
}

impl BlockRef {
    /// Returns the payload offset into the arena buffer.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }
}

/// One node of the block chain.
///
/// `size` includes the header; the chain's sizes always sum to the arena
/// capacity exactly.
struct Block {
    offset: usize,
    size: usize,
    free: bool,
}

/// Snapshot of one chain entry, for diagnostics and invariant checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block size in bytes, header included.
    pub size: usize,
    /// Whether the block is free.
    pub free: bool,
}

/// Fixed-capacity first-fit block allocator.
///
/// Created once at world construction, destroyed at world teardown.
/// Out-of-memory after one defragment attempt is fatal: the arena is an
/// engine-startup-sized budget, not a general heap.
pub struct BlockArena {
    /// Name for diagnostics ("World.ActorArena").
    name: String,
    /// Backing bytes. `None` after `clear(true)`.
    buffer: Option<Box<[u8]>>,
    /// The block chain, ordered by offset, exactly partitioning `capacity`.
    blocks: Vec<Block>,
    /// Allocation granularity; requested sizes round up to this.
    alignment: usize,
    /// Total capacity in bytes.
    capacity: usize,
    /// Sum of sizes of non-free blocks, headers included.
    allocated_bytes: usize,
}

impl BlockArena {
    /// Creates a new arena.
    ///
    /// `total_size` is rounded up to a multiple of the block header size and
    /// seeded as one giant free block.
    ///
    /// # Panics
    ///
    /// Panics if `total_size` is zero, or `alignment` is below
    /// [`MIN_ARENA_ALIGNMENT`] or not a power of two. These are engine setup
    /// errors, not recoverable conditions.
    #[must_use]
    pub fn new(name: &str, total_size: usize, alignment: usize) -> Self {
        assert!(total_size > 0, "Arena size must be greater than zero");
        assert!(
            alignment >= MIN_ARENA_ALIGNMENT,
            "Arena alignment must be at least {MIN_ARENA_ALIGNMENT}"
        );
        assert!(
            alignment.is_power_of_two(),
            "Arena alignment must be a power of two"
        );

        let capacity = round_up(total_size, BLOCK_HEADER_SIZE);
        let buffer = vec![0u8; capacity].into_boxed_slice();

        Self {
            name: name.to_owned(),
            buffer: Some(buffer),
            blocks: vec![Block {
                offset: 0,
                size: capacity,
                free: true,
            }],
            alignment,
            capacity,
            allocated_bytes: 0,
        }
    }

    /// Returns the arena name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the sum of sizes of non-free blocks, headers included.
    #[inline]
    #[must_use]
    pub const fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Returns the allocation alignment.
    #[inline]
    #[must_use]
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    /// Returns the number of blocks in the chain.
    #[inline]
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates the block chain in offset order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.blocks.iter().map(|b| BlockInfo {
            size: b.size,
            free: b.free,
        })
    }

    /// Allocates `size` bytes, rounded up to the arena alignment.
    ///
    /// First-fit over the chain; on a miss, runs one [`Self::defragment`]
    /// pass and retries. If the found block's spare space exceeds one header,
    /// the spare is split into a trailing free block; otherwise the spare is
    /// absorbed so no unusably small fragment is left behind.
    ///
    /// # Panics
    ///
    /// Panics if no block fits after the defragment retry (engine-level
    /// sizing problem), or if the backing buffer was released by
    /// `clear(true)`.
    pub fn allocate(&mut self, size: usize) -> BlockRef {
        assert!(
            self.buffer.is_some(),
            "Arena '{}' used after its buffer was released",
            self.name
        );

        let needed = round_up(size.max(1), self.alignment) + BLOCK_HEADER_SIZE;

        let index = match self.find_first_fit(needed) {
            Some(index) => index,
            None => {
                self.defragment();
                self.find_first_fit(needed).unwrap_or_else(|| {
                    panic!(
                        "Arena '{}' out of memory: requested {} bytes, {} of {} in use",
                        self.name, needed, self.allocated_bytes, self.capacity
                    )
                })
            }
        };

        let spare = self.blocks[index].size - needed;
        if spare > BLOCK_HEADER_SIZE {
            // Split: trailing spare becomes a new free block.
            self.blocks[index].size = needed;
            let offset = self.blocks[index].offset + needed;
            self.blocks.insert(
                index + 1,
                Block {
                    offset,
                    size: spare,
                    free: true,
                },
            );
        }
        // else: spare absorbed into the allocation.

        let block = &mut self.blocks[index];
        block.free = false;
        self.allocated_bytes += block.size;

        BlockRef {
            offset: block.offset + BLOCK_HEADER_SIZE,
        }
    }

    /// Frees the block behind `handle`.
    ///
    /// The payload is overwritten with [`FREED_BLOCK_PATTERN`] so stale
    /// reads are obvious in a dump. Adjacent free blocks are *not* merged
    /// here; coalescing is lazy and happens in [`Self::defragment`].
    ///
    /// # Errors
    ///
    /// Rejects handles outside the arena range, handles that do not match a
    /// block boundary, and double-frees. Each rejection is logged.
    pub fn deallocate(&mut self, handle: BlockRef) -> Result<(), ArenaError> {
        let index = match self.find_block(handle.offset) {
            Ok(index) => index,
            Err(err) => {
                error!(arena = %self.name, %err, "rejected deallocation");
                return Err(err);
            }
        };

        if self.blocks[index].free {
            let err = ArenaError::DoubleFree(handle.offset);
            error!(arena = %self.name, %err, "rejected deallocation");
            return Err(err);
        }

        let payload_end = self.blocks[index].offset + self.blocks[index].size;
        if let Some(buffer) = self.buffer.as_deref_mut() {
            buffer[handle.offset..payload_end].fill(FREED_BLOCK_PATTERN);
        }

        self.allocated_bytes -= self.blocks[index].size;
        self.blocks[index].free = true;
        Ok(())
    }

    /// One linear coalescing pass. Returns the number of merges performed.
    ///
    /// Each free block is merged with an immediately following free block,
    /// after which the cursor advances past the merged pair. A run of three
    /// or more free blocks therefore finishes coalescing over multiple calls
    /// across frames, matching the forward-only chain walk.
    pub fn defragment(&mut self) -> usize {
        let mut merged = 0;
        let mut i = 0;
        while i + 1 < self.blocks.len() {
            if self.blocks[i].free && self.blocks[i + 1].free {
                let next = self.blocks.remove(i + 1);
                self.blocks[i].size += next.size;
                merged += 1;
            }
            i += 1;
        }
        merged
    }

    /// Resets the arena to the single-free-block state.
    ///
    /// With `free_memory` the backing buffer is released too (shutdown
    /// path); any later allocation is fatal.
    pub fn clear(&mut self, free_memory: bool) {
        self.blocks.clear();
        self.blocks.push(Block {
            offset: 0,
            size: self.capacity,
            free: true,
        });
        self.allocated_bytes = 0;
        if free_memory {
            self.buffer = None;
        }
    }

    /// Returns the payload bytes behind `handle`, free or not.
    ///
    /// Diagnostics only: lets tooling inspect poison patterns. Returns
    /// `None` for invalid handles or after `clear(true)`.
    #[must_use]
    pub fn payload(&self, handle: BlockRef) -> Option<&[u8]> {
        let index = self.find_block(handle.offset).ok()?;
        let end = self.blocks[index].offset + self.blocks[index].size;
        self.buffer.as_deref().map(|b| &b[handle.offset..end])
    }

    fn find_first_fit(&self, needed: usize) -> Option<usize> {
        self.blocks.iter().position(|b| b.free && b.size >= needed)
    }

    fn find_block(&self, payload_offset: usize) -> Result<usize, ArenaError> {
        if payload_offset < BLOCK_HEADER_SIZE || payload_offset >= self.capacity {
            return Err(ArenaError::OutOfRange(payload_offset));
        }
        let block_offset = payload_offset - BLOCK_HEADER_SIZE;
        self.blocks
            .binary_search_by(|b| b.offset.cmp(&block_offset))
            .map_err(|_| ArenaError::UnknownBlock(payload_offset))
    }
}

/// Rounds `value` up to the next multiple of `multiple`.
const fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_total(arena: &BlockArena) -> usize {
        arena.blocks().map(|b| b.size).sum()
    }

    fn live_total(arena: &BlockArena) -> usize {
        arena.blocks().filter(|b| !b.free).map(|b| b.size).sum()
    }

    #[test]
    fn test_new_rounds_capacity_to_header_multiple() {
        let arena = BlockArena::new("Test", 100, 8);
        assert_eq!(arena.capacity() % BLOCK_HEADER_SIZE, 0);
        assert!(arena.capacity() >= 100);
        assert_eq!(arena.block_count(), 1);
    }

    #[test]
    #[should_panic(expected = "alignment")]
    fn test_undersized_alignment_is_fatal() {
        let _ = BlockArena::new("Test", 1024, 2);
    }

    #[test]
    fn test_conservation_under_churn() {
        let mut arena = BlockArena::new("Test", 1024, 8);

        let a = arena.allocate(40);
        let b = arena.allocate(100);
        let c = arena.allocate(8);
        assert_eq!(chain_total(&arena), arena.capacity());
        assert_eq!(arena.allocated_bytes(), live_total(&arena));

        arena.deallocate(b).unwrap();
        let d = arena.allocate(24);
        arena.deallocate(a).unwrap();
        assert_eq!(chain_total(&arena), arena.capacity());
        assert_eq!(arena.allocated_bytes(), live_total(&arena));

        arena.deallocate(c).unwrap();
        arena.deallocate(d).unwrap();
        arena.defragment();
        assert_eq!(chain_total(&arena), arena.capacity());
        assert_eq!(arena.allocated_bytes(), 0);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut arena = BlockArena::new("Test", 256, 8);
        let r = arena.allocate(32);
        arena.deallocate(r).unwrap();
        assert_eq!(arena.deallocate(r), Err(ArenaError::DoubleFree(r.offset())));
    }

    #[test]
    fn test_bogus_handles_rejected() {
        let mut arena = BlockArena::new("Test", 256, 8);
        let _ = arena.allocate(32);
        assert!(matches!(
            arena.deallocate(BlockRef { offset: 9999 }),
            Err(ArenaError::OutOfRange(_))
        ));
        assert!(matches!(
            arena.deallocate(BlockRef {
                offset: BLOCK_HEADER_SIZE + 4
            }),
            Err(ArenaError::UnknownBlock(_))
        ));
    }

    #[test]
    fn test_split_and_absorb() {
        // 160 bytes total. 64-byte request costs 64 + 16 header = 80.
        let mut arena = BlockArena::new("Test", 160, 8);

        let _a = arena.allocate(64);
        // Spare of 80 > header: split into a trailing free block.
        assert_eq!(arena.block_count(), 2);

        // 56-byte request costs 72; spare of 8 <= header is absorbed.
        let _b = arena.allocate(50);
        assert_eq!(arena.block_count(), 2);
        assert_eq!(arena.allocated_bytes(), arena.capacity());
    }

    #[test]
    fn test_allocation_rounds_to_alignment() {
        let mut arena = BlockArena::new("Test", 256, 8);
        let _ = arena.allocate(1);
        let first = arena.blocks().next().unwrap();
        assert_eq!(first.size, 8 + BLOCK_HEADER_SIZE);
    }

    #[test]
    fn test_defragment_needs_multiple_passes() {
        // Four 80-byte blocks fill the arena exactly.
        let mut arena = BlockArena::new("Test", 320, 8);
        let a = arena.allocate(64);
        let b = arena.allocate(64);
        let c = arena.allocate(64);
        let _d = arena.allocate(64);

        arena.deallocate(a).unwrap();
        arena.deallocate(b).unwrap();
        arena.deallocate(c).unwrap();
        assert_eq!(arena.block_count(), 4);

        // First pass merges a+b, then the cursor has moved past c.
        assert_eq!(arena.defragment(), 1);
        assert_eq!(arena.block_count(), 3);

        // Second pass picks up the remaining adjacency.
        assert_eq!(arena.defragment(), 1);
        assert_eq!(arena.block_count(), 2);
    }

    #[test]
    fn test_allocate_retries_through_defragment() {
        let mut arena = BlockArena::new("Test", 320, 8);
        let a = arena.allocate(64);
        let b = arena.allocate(64);
        let _c = arena.allocate(64);
        arena.deallocate(a).unwrap();
        arena.deallocate(b).unwrap();

        // 160 contiguous bytes only exist after coalescing a+b.
        let big = arena.allocate(144);
        assert_eq!(big.offset(), BLOCK_HEADER_SIZE);
    }

    #[test]
    #[should_panic(expected = "out of memory")]
    fn test_exhaustion_is_fatal() {
        let mut arena = BlockArena::new("Test", 160, 8);
        let _ = arena.allocate(200);
    }

    #[test]
    fn test_freed_payload_is_poisoned() {
        let mut arena = BlockArena::new("Test", 256, 8);
        let r = arena.allocate(32);
        arena.deallocate(r).unwrap();

        let payload = arena.payload(r).unwrap();
        assert!(payload.iter().all(|&byte| byte == FREED_BLOCK_PATTERN));
    }

    #[test]
    fn test_clear_resets_chain() {
        let mut arena = BlockArena::new("Test", 256, 8);
        let _ = arena.allocate(32);
        let _ = arena.allocate(32);
        arena.clear(false);
        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.allocated_bytes(), 0);

        // Still usable without the buffer released.
        let _ = arena.allocate(64);
    }

    #[test]
    #[should_panic(expected = "buffer was released")]
    fn test_use_after_release_is_fatal() {
        let mut arena = BlockArena::new("Test", 256, 8);
        arena.clear(true);
        let _ = arena.allocate(8);
    }
}
