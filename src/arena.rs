//! Slot arena backing the frequency buckets.
//!
//! Entries live in a flat `Vec` of optional slots; a free list recycles
//! vacated slots. Buckets link entries through [`SlotId`] indices instead of
//! pointers, so detaching, inserting at the head and removing the tail stay
//! O(1) without any aliasing between the map, the buckets and the entries.
//!
//! Slot indices are stable for the lifetime of an entry, which is what lets
//! the background sweep walk the arena in fixed-size index ranges while
//! releasing the cache lock between ranges.

/// Index of an occupied slot in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Free-list backed slot storage.
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value` in a free slot and returns its id.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(value);
            idx
        } else {
            self.slots.push(Some(value));
            self.slots.len() - 1
        };
        self.len += 1;
        SlotId(idx)
    }

    /// Vacates the slot and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.0)?;
        let value = slot.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(value)
    }

    /// Returns the value stored at `id`.
    #[inline]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// Returns the value stored at `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated (occupied or free); the exclusive upper
    /// bound of valid slot indices.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Drops every value and releases all slots.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }

    /// Iterates over occupied slots whose index lies in `start..end`.
    pub fn iter_range(&self, start: usize, end: usize) -> impl Iterator<Item = (SlotId, &T)> {
        let end = end.min(self.slots.len());
        let start = start.min(end);
        self.slots[start..end]
            .iter()
            .enumerate()
            .filter_map(move |(offset, slot)| slot.as_ref().map(|v| (SlotId(start + offset), v)))
    }

    /// Iterates over all occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.iter_range(0, self.slots.len())
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
