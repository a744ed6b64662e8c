//! Frequency bucket: a recency-ordered doubly linked list of arena slots.
//!
//! Every frequency level owns one bucket. The bucket itself only stores the
//! ids of its first and last entries; the links between entries live in the
//! entries (`Entry::prev` / `Entry::next`), so all operations take the arena
//! that owns them.
//!
//! ```text
//!   head ──► [most recent] ◄──► [ ... ] ◄──► [least recent] ◄── tail
//!                                                  ▲
//!                                        eviction candidate
//! ```
//!
//! All operations are O(1). `remove_node` uses the entry's own links, never a
//! scan, and checks them against the bucket so that a node claimed by another
//! bucket is reported as an invariant violation instead of silently corrupting
//! both lists.

use crate::arena::{SlotArena, SlotId};
use crate::entry::Entry;
use crate::error::{CacheError, Result};

/// One frequency level: entries ordered from most to least recently touched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrequencyBucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl FrequencyBucket {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries linked in this bucket.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no entry is linked here.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most recently touched entry.
    #[inline]
    pub fn head(&self) -> Option<SlotId> {
        self.head
    }

    /// Least recently touched entry, the eviction candidate of this level.
    #[inline]
    pub fn tail(&self) -> Option<SlotId> {
        self.tail
    }

    /// Links `id` in front of the current head.
    ///
    /// The entry must not be linked in any bucket.
    pub fn insert_at_head<K, V>(
        &mut self,
        arena: &mut SlotArena<Entry<K, V>>,
        id: SlotId,
    ) -> Result<()> {
        let old_head = self.head;
        {
            let entry = slot_mut(arena, id)?;
            if !entry.is_unlinked() || self.head == Some(id) {
                return Err(CacheError::Invariant(format!(
                    "slot {} is already linked into a bucket",
                    id.index()
                )));
            }
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(h) => slot_mut(arena, h)?.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        Ok(())
    }

    /// Unlinks `id` from this bucket using its own links.
    pub fn remove_node<K, V>(&mut self, arena: &mut SlotArena<Entry<K, V>>, id: SlotId) -> Result<()> {
        if !self.contains_link(arena, id) {
            return Err(CacheError::Invariant(format!(
                "slot {} is not linked in the bucket its frequency claims",
                id.index()
            )));
        }
        let (prev, next) = {
            let entry = slot_mut(arena, id)?;
            let links = (entry.prev, entry.next);
            entry.prev = None;
            entry.next = None;
            links
        };
        match prev {
            Some(p) => slot_mut(arena, p)?.next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => slot_mut(arena, n)?.prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        Ok(())
    }

    /// Unlinks and returns the least recently touched entry, or `None` if the
    /// bucket is empty.
    pub fn remove_tail<K, V>(&mut self, arena: &mut SlotArena<Entry<K, V>>) -> Result<Option<SlotId>> {
        match self.tail {
            Some(id) => {
                self.remove_node(arena, id)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Checks in O(1) that `id`'s links agree with this bucket.
    pub fn contains_link<K, V>(&self, arena: &SlotArena<Entry<K, V>>, id: SlotId) -> bool {
        let Some(entry) = arena.get(id) else {
            return false;
        };
        let prev_ok = match entry.prev {
            Some(p) => arena.get(p).map_or(false, |e| e.next == Some(id)),
            None => self.head == Some(id),
        };
        let next_ok = match entry.next {
            Some(n) => arena.get(n).map_or(false, |e| e.prev == Some(id)),
            None => self.tail == Some(id),
        };
        prev_ok && next_ok
    }

    /// Iterates from head (most recent) to tail (least recent).
    pub fn iter<'a, K, V>(&self, arena: &'a SlotArena<Entry<K, V>>) -> BucketIter<'a, K, V> {
        BucketIter {
            arena,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Iterates from tail (least recent) to head (most recent).
    pub fn iter_rev<'a, K, V>(&self, arena: &'a SlotArena<Entry<K, V>>) -> BucketRevIter<'a, K, V> {
        BucketRevIter {
            arena,
            cursor: self.tail,
            remaining: self.len,
        }
    }
}

fn slot_mut<K, V>(arena: &mut SlotArena<Entry<K, V>>, id: SlotId) -> Result<&mut Entry<K, V>> {
    arena
        .get_mut(id)
        .ok_or_else(|| CacheError::Invariant(format!("slot {} is vacant", id.index())))
}

/// Head-to-tail iterator over a bucket.
#[derive(Debug)]
pub struct BucketIter<'a, K, V> {
    arena: &'a SlotArena<Entry<K, V>>,
    cursor: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (SlotId, &'a Entry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        // `remaining` bounds the walk even if links were corrupted into a cycle
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        let entry = self.arena.get(id)?;
        self.cursor = entry.next;
        self.remaining -= 1;
        Some((id, entry))
    }
}

/// Tail-to-head iterator over a bucket.
#[derive(Debug)]
pub struct BucketRevIter<'a, K, V> {
    arena: &'a SlotArena<Entry<K, V>>,
    cursor: Option<SlotId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for BucketRevIter<'a, K, V> {
    type Item = (SlotId, &'a Entry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        let entry = self.arena.get(id)?;
        self.cursor = entry.prev;
        self.remaining -= 1;
        Some((id, entry))
    }
}
