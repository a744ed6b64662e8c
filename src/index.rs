//! Frequency index: the key map, the entry arena and the frequency buckets.
//!
//! [`FrequencyIndex`] is the single owner of every structure that has to stay
//! consistent for O(1) LFU eviction:
//!
//! ```text
//! ┌──────────────────────────┐      ┌────────────────────────────────────┐
//! │ map: HashMap<K, SlotId>  │ ───► │ entries: SlotArena<Entry<K, V>>    │
//! └──────────────────────────┘      └────────────────────────────────────┘
//!                                                  ▲ prev/next links
//! ┌────────────────────────────────────────────────┴───────────────────┐
//! │ buckets: BTreeMap<u64, FrequencyBucket>                            │
//! │                                                                    │
//! │   min_frequency = 1                                                │
//! │        │                                                           │
//! │        ▼                                                           │
//! │   freq=1: head ──► [c] ◄──► [b] ◄── tail   (b evicted first)       │
//! │   freq=2: head ──► [a] ◄── tail                                    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # `min_frequency`
//!
//! A promotion that empties the bucket at `min_frequency` advances it at
//! once: frequencies only grow, so nothing can fall back into the lower
//! bucket. Detaching an entry (delete, eviction, expiry) leaves the stored
//! value alone; it can then point at an empty bucket. Every read through
//! [`FrequencyIndex::settled_min_frequency`] and every eviction settles it first by
//! scanning upward to the first non-empty bucket, so no eviction decision is
//! ever taken from a stale-low value.
//!
//! # Empty buckets
//!
//! Buckets are created lazily and are not freed when they empty.
//! [`FrequencyIndex::prune_empty_buckets`] reclaims them; the background sweep
//! calls it once per tick.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::arena::{SlotArena, SlotId};
use crate::bucket::FrequencyBucket;
use crate::entry::Entry;
use crate::error::{CacheError, Result};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Key map, entry arena and frequency buckets of one cache.
pub struct FrequencyIndex<K, V, S = DefaultHashBuilder> {
    map: HashMap<K, SlotId, S>,
    entries: SlotArena<Entry<K, V>>,
    buckets: BTreeMap<u64, FrequencyBucket>,
    min_frequency: u64,
}

impl<K: Hash + Eq + Clone, V> FrequencyIndex<K, V> {
    /// Creates an index sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> FrequencyIndex<K, V, S> {
    /// Creates an index sized for `capacity` entries using `hash_builder`.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, hash_builder),
            entries: SlotArena::with_capacity(capacity),
            buckets: BTreeMap::new(),
            min_frequency: 1,
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the index holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up the slot of `key`.
    #[inline]
    pub fn get_id<Q>(&self, key: &Q) -> Option<SlotId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).copied()
    }

    /// Returns the entry stored in `id`.
    #[inline]
    pub fn entry(&self, id: SlotId) -> Option<&Entry<K, V>> {
        self.entries.get(id)
    }

    /// Returns the entry stored in `id` mutably.
    ///
    /// Only the value and TTL may be changed through this reference; links
    /// and frequency belong to the index.
    #[inline]
    pub fn entry_mut(&mut self, id: SlotId) -> Option<&mut Entry<K, V>> {
        self.entries.get_mut(id)
    }

    /// Returns the entry stored in `id`, or an invariant error if the slot is
    /// vacant.
    pub fn expect_entry(&self, id: SlotId) -> Result<&Entry<K, V>> {
        self.entries
            .get(id)
            .ok_or_else(|| CacheError::Invariant(format!("mapped slot {} is vacant", id.index())))
    }

    /// Current frequency of `key`, if present.
    pub fn frequency_of<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_id(key)
            .and_then(|id| self.entries.get(id))
            .map(Entry::frequency)
    }

    /// Creates a new entry for an absent key with frequency 1.
    pub fn insert(&mut self, key: K, value: V, ttl: Option<Duration>, now: Instant) -> Result<SlotId> {
        let id = self.link_new(Entry::new(key, value, 1, ttl, now))?;
        self.min_frequency = 1;
        Ok(id)
    }

    /// Creates a new entry with a given frequency and deadline; used to
    /// rebuild the index from a snapshot.
    pub fn insert_with_frequency(
        &mut self,
        key: K,
        value: V,
        frequency: u64,
        ttl: Option<Duration>,
        remaining: Option<Duration>,
        now: Instant,
    ) -> Result<SlotId> {
        let frequency = frequency.max(1);
        let settled = self.settled_min_frequency();
        let mut entry = Entry::new(key, value, frequency, ttl, now);
        entry.restore_deadline(ttl, remaining, now);
        let id = self.link_new(entry)?;
        self.min_frequency = settled.map_or(frequency, |min| min.min(frequency));
        Ok(id)
    }

    fn link_new(&mut self, entry: Entry<K, V>) -> Result<SlotId> {
        if self.map.contains_key(&entry.key) {
            return Err(CacheError::Invariant(
                "insert of a key that is already indexed".into(),
            ));
        }
        let key = entry.key.clone();
        let frequency = entry.frequency;
        let id = self.entries.insert(entry);
        self.buckets
            .entry(frequency)
            .or_default()
            .insert_at_head(&mut self.entries, id)?;
        self.map.insert(key, id);
        Ok(id)
    }

    /// Moves the entry one frequency level up and makes it the most recent
    /// entry of its new bucket. Returns the new frequency.
    pub fn promote(&mut self, id: SlotId) -> Result<u64> {
        let frequency = self.expect_entry(id)?.frequency;
        let bucket = self.buckets.get_mut(&frequency).ok_or_else(|| {
            CacheError::Invariant(format!("no bucket exists for frequency {frequency}"))
        })?;
        bucket.remove_node(&mut self.entries, id)?;
        if bucket.is_empty() && frequency == self.min_frequency {
            self.min_frequency = frequency + 1;
        }

        let next = frequency + 1;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.frequency = next;
        }
        self.buckets
            .entry(next)
            .or_default()
            .insert_at_head(&mut self.entries, id)?;
        Ok(next)
    }

    /// Removes the entry from its bucket, the arena and the map.
    ///
    /// The stored `min_frequency` is left as is; see the module docs.
    pub fn detach(&mut self, id: SlotId) -> Result<(K, V)> {
        let frequency = self.expect_entry(id)?.frequency;
        self.buckets
            .get_mut(&frequency)
            .ok_or_else(|| {
                CacheError::Invariant(format!("no bucket exists for frequency {frequency}"))
            })?
            .remove_node(&mut self.entries, id)?;
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| CacheError::Invariant(format!("slot {} vanished", id.index())))?;
        self.map.remove(&entry.key);
        Ok((entry.key, entry.value))
    }

    /// Removes `key` if present.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<(K, V)>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.get_id(key) {
            Some(id) => self.detach(id).map(Some),
            None => Ok(None),
        }
    }

    /// Lowest frequency held by a live entry, `None` when empty.
    pub fn settled_min_frequency(&self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        self.buckets
            .range(self.min_frequency..)
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(&frequency, _)| frequency)
    }

    /// Highest frequency held by a live entry, `None` when empty.
    pub fn max_frequency(&self) -> Option<u64> {
        self.buckets
            .iter()
            .rev()
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(&frequency, _)| frequency)
    }

    fn settle_min_frequency(&mut self) -> Result<Option<u64>> {
        match self.settled_min_frequency() {
            Some(min) => {
                self.min_frequency = min;
                Ok(Some(min))
            }
            None if self.is_empty() => Ok(None),
            None => Err(CacheError::Invariant(format!(
                "{} live entries but every bucket from frequency {} up is empty",
                self.len(),
                self.min_frequency
            ))),
        }
    }

    /// Removes the least recently touched entry of the lowest frequency.
    pub fn pop_lfu(&mut self) -> Result<Option<(K, V)>> {
        let Some(min) = self.settle_min_frequency()? else {
            return Ok(None);
        };
        let id = self
            .buckets
            .get_mut(&min)
            .ok_or_else(|| CacheError::Invariant(format!("no bucket exists for frequency {min}")))?
            .remove_tail(&mut self.entries)?
            .ok_or_else(|| CacheError::Invariant(format!("bucket {min} emptied while settled")))?;
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| CacheError::Invariant(format!("slot {} vanished", id.index())))?;
        self.map.remove(&entry.key);
        Ok(Some((entry.key, entry.value)))
    }

    /// Drops every entry and every bucket.
    pub fn clear(&mut self) {
        self.map.clear();
        self.entries.clear();
        self.buckets.clear();
        self.min_frequency = 1;
    }

    /// Frees buckets that no longer hold entries; returns how many were freed.
    pub fn prune_empty_buckets(&mut self) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        before - self.buckets.len()
    }

    /// Number of allocated buckets, empty ones included.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets holding at least one entry.
    pub fn active_levels(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }

    /// Exclusive upper bound of arena slot indices.
    #[inline]
    pub fn slot_capacity(&self) -> usize {
        self.entries.slot_count()
    }

    /// Slots in `start..end` whose entries have expired at `now`.
    pub fn expired_in_range(&self, start: usize, end: usize, now: Instant) -> Vec<SlotId> {
        self.entries
            .iter_range(start, end)
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(id, _)| id)
            .collect()
    }

    /// Iterates over live entries from lowest to highest frequency and, within
    /// a frequency, from least to most recently touched. Re-inserting entries
    /// in this order at the bucket heads reproduces the eviction order.
    pub fn snapshot_order(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.buckets
            .values()
            .flat_map(move |bucket| bucket.iter_rev(&self.entries).map(|(_, entry)| entry))
    }

    /// Verifies the structural invariants of the index in O(n).
    ///
    /// Checks that the map, the arena and the buckets agree on every entry,
    /// that each entry sits in the bucket of its own frequency, and that the
    /// settled minimum frequency is the true minimum.
    pub fn check_invariants(&self) -> Result<()> {
        if self.map.len() != self.entries.len() {
            return Err(CacheError::Invariant(format!(
                "map holds {} keys but arena holds {} entries",
                self.map.len(),
                self.entries.len()
            )));
        }
        let mut linked = 0;
        for (&frequency, bucket) in &self.buckets {
            let mut walked = 0;
            for (id, entry) in bucket.iter(&self.entries) {
                walked += 1;
                if entry.frequency != frequency {
                    return Err(CacheError::Invariant(format!(
                        "entry with frequency {} linked in bucket {frequency}",
                        entry.frequency
                    )));
                }
                if self.map.get(&entry.key) != Some(&id) {
                    return Err(CacheError::Invariant(format!(
                        "bucket {frequency} links slot {} that the map does not point to",
                        id.index()
                    )));
                }
            }
            if walked != bucket.len() {
                return Err(CacheError::Invariant(format!(
                    "bucket {frequency} reports {} entries but links {walked}",
                    bucket.len()
                )));
            }
            linked += walked;
        }
        if linked != self.map.len() {
            return Err(CacheError::Invariant(format!(
                "{linked} entries linked in buckets but {} keys mapped",
                self.map.len()
            )));
        }
        let true_min = self
            .entries
            .iter()
            .map(|(_, entry)| entry.frequency)
            .min();
        if self.settled_min_frequency() != true_min {
            return Err(CacheError::Invariant(format!(
                "settled min frequency {:?} differs from true minimum {true_min:?}",
                self.settled_min_frequency()
            )));
        }
        Ok(())
    }
}

impl<K, V, S> fmt::Debug for FrequencyIndex<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyIndex")
            .field("len", &self.entries.len())
            .field("buckets", &self.buckets.len())
            .field("min_frequency", &self.min_frequency)
            .finish()
    }
}
