//! # Generational Slot Pool
//!
//! Fixed-capacity storage for objects addressed by weak handles.
//!
//! Parent pointers, owner pointers, and level membership are all modeled as
//! [`SlotKey`]s into a pool: the pool is the sole owner, every back-reference
//! is non-owning, and a generation counter makes stale handles resolve to
//! `None` instead of aliasing a recycled slot.

/// Weak handle into a [`SlotPool`].
///
/// The key is split into two parts:
/// - Lower 32 bits: index into the slot array
/// - Upper 32 bits: generation counter for detecting stale handles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SlotKey(u64);

impl SlotKey {
    /// Creates a new key from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the key.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the key.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid key.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this key is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        Self::NULL
    }
}

/// One slot: the stored value plus the generation stamped into live keys.
struct Slot<T> {
    value: Option<T>,
    generation: u32,
}

/// Fixed-capacity generational slot pool.
///
/// All slots are pre-allocated at creation. Inserting reuses the
/// lowest-recycled slot and bumps its generation so keys handed out for the
/// previous occupant go stale.
///
/// # Thread Safety
///
/// Not thread-safe. One pool per world, mutated only from the update thread.
pub struct SlotPool<T> {
    /// The slot array (pre-allocated).
    slots: Box<[Slot<T>]>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently live values.
    live_count: usize,
    /// Maximum capacity.
    capacity: usize,
}

impl<T> SlotPool<T> {
    /// Creates a new pool with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds `u32::MAX`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity <= u32::MAX as usize,
            "Capacity cannot exceed u32::MAX"
        );

        let slots = (0..capacity)
            .map(|_| Slot {
                value: None,
                generation: 0,
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        // Lowest indices pop first.
        let free_indices: Vec<u32> = (0..capacity as u32).rev().collect();

        Self {
            slots,
            free_indices,
            live_count: 0,
            capacity,
        }
    }

    /// Returns the maximum capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently live values.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count
    }

    /// Inserts a value, returning its key.
    ///
    /// Returns `None` if the pool is full.
    pub fn insert(&mut self, value: T) -> Option<SlotKey> {
        let index = self.free_indices.pop()?;

        let slot = &mut self.slots[index as usize];
        // Bump generation to invalidate keys of the previous occupant.
        slot.generation = slot.generation.wrapping_add(1);
        slot.value = Some(value);
        self.live_count += 1;

        Some(SlotKey::new(index, slot.generation))
    }

    /// Removes the value for `key`, freeing its slot for reuse.
    ///
    /// Returns `None` if the key is null, stale, or already removed.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        if !self.contains(key) {
            return None;
        }

        let slot = &mut self.slots[key.index() as usize];
        let value = slot.value.take()?;
        self.free_indices.push(key.index());
        self.live_count -= 1;

        Some(value)
    }

    /// Checks whether `key` refers to a live value.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: SlotKey) -> bool {
        if key.is_null() {
            return false;
        }
        let idx = key.index() as usize;
        if idx >= self.capacity {
            return false;
        }
        let slot = &self.slots[idx];
        slot.value.is_some() && slot.generation == key.generation()
    }

    /// Gets a reference to the value for `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: SlotKey) -> Option<&T> {
        if !self.contains(key) {
            return None;
        }
        self.slots[key.index() as usize].value.as_ref()
    }

    /// Gets a mutable reference to the value for `key`.
    #[inline]
    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        if !self.contains(key) {
            return None;
        }
        self.slots[key.index() as usize].value.as_mut()
    }

    /// Iterates over all live values with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|v| (SlotKey::new(index as u32, slot.generation), v))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key = SlotKey::new(12345, 67890);
        assert_eq!(key.index(), 12345);
        assert_eq!(key.generation(), 67890);
        assert!(!key.is_null());
        assert!(SlotKey::NULL.is_null());
    }

    #[test]
    fn test_insert_remove() {
        let mut pool: SlotPool<u32> = SlotPool::new(10);

        let k1 = pool.insert(42).unwrap();
        assert_eq!(*pool.get(k1).unwrap(), 42);
        assert_eq!(pool.live_count(), 1);

        assert_eq!(pool.remove(k1), Some(42));
        assert_eq!(pool.live_count(), 0);
        assert!(pool.get(k1).is_none());
    }

    #[test]
    fn test_stale_key_after_reuse() {
        let mut pool: SlotPool<u32> = SlotPool::new(1);

        let k1 = pool.insert(1).unwrap();
        pool.remove(k1);

        let k2 = pool.insert(2).unwrap();
        assert_eq!(k1.index(), k2.index()); // Same slot reused
        assert_ne!(k1.generation(), k2.generation());

        // The old key must not alias the new occupant.
        assert!(pool.get(k1).is_none());
        assert_eq!(*pool.get(k2).unwrap(), 2);
    }

    #[test]
    fn test_pool_full() {
        let mut pool: SlotPool<u8> = SlotPool::new(2);
        let _ = pool.insert(1).unwrap();
        let _ = pool.insert(2).unwrap();
        assert!(pool.insert(3).is_none());
    }

    #[test]
    fn test_iter_skips_dead_slots() {
        let mut pool: SlotPool<u8> = SlotPool::new(4);
        let a = pool.insert(10).unwrap();
        let b = pool.insert(20).unwrap();
        pool.remove(a);

        let live: Vec<_> = pool.iter().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].0, b);
        assert_eq!(*live[0].1, 20);
    }
}
