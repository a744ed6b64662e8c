//! Snapshot boundary for persisting cache contents across restarts.
//!
//! The engine does not persist anything itself. It hands a [`Snapshot`] to a
//! [`SnapshotStore`] when it is stopped and asks for one back on its first
//! start. Entries are ordered lowest frequency first and, within a frequency,
//! least recently touched first; replaying them in order rebuilds the same
//! eviction order.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;

/// One persisted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry<K, V> {
    /// The cached key.
    pub key: K,
    /// The cached value.
    pub value: V,
    /// Access frequency at the time of the snapshot.
    pub frequency: u64,
    /// TTL the entry was written with.
    pub ttl: Option<Duration>,
    /// Time left before expiry at the time of the snapshot; `None` never
    /// expires.
    pub remaining_ttl: Option<Duration>,
}

/// Ordered cache contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<K, V> {
    /// Entries in eviction order, next victim first.
    pub entries: Vec<SnapshotEntry<K, V>>,
}

impl<K, V> Snapshot<K, V> {
    /// Wraps entries that are already in eviction order.
    pub fn new(entries: Vec<SnapshotEntry<K, V>>) -> Self {
        Self { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Persistence collaborator consulted at `start` and `stop`.
///
/// Failures should be reported as [`CacheError::Snapshot`](crate::CacheError::Snapshot).
pub trait SnapshotStore<K, V>: Send + Sync {
    /// Returns the last saved snapshot, or `None` if nothing was saved.
    fn load_snapshot(&self) -> Result<Option<Snapshot<K, V>>>;

    /// Persists `snapshot`, replacing any earlier one.
    fn save_snapshot(&self, snapshot: &Snapshot<K, V>) -> Result<()>;
}

impl<K, V, T> SnapshotStore<K, V> for Arc<T>
where
    T: SnapshotStore<K, V> + ?Sized,
{
    fn load_snapshot(&self) -> Result<Option<Snapshot<K, V>>> {
        (**self).load_snapshot()
    }

    fn save_snapshot(&self, snapshot: &Snapshot<K, V>) -> Result<()> {
        (**self).save_snapshot(snapshot)
    }
}

/// Keeps the last snapshot in memory.
#[derive(Debug)]
pub struct MemorySnapshotStore<K, V> {
    slot: Mutex<Option<Snapshot<K, V>>>,
    saves: Mutex<usize>,
}

impl<K, V> MemorySnapshotStore<K, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            saves: Mutex::new(0),
        }
    }

    /// Creates a store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot<K, V>) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl<K: Clone, V: Clone> MemorySnapshotStore<K, V> {
    /// Returns a copy of the stored snapshot.
    pub fn current(&self) -> Option<Snapshot<K, V>> {
        self.slot.lock().clone()
    }
}

impl<K, V> Default for MemorySnapshotStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SnapshotStore<K, V> for MemorySnapshotStore<K, V>
where
    K: Clone + Send,
    V: Clone + Send,
{
    fn load_snapshot(&self) -> Result<Option<Snapshot<K, V>>> {
        Ok(self.slot.lock().clone())
    }

    fn save_snapshot(&self, snapshot: &Snapshot<K, V>) -> Result<()> {
        *self.slot.lock() = Some(snapshot.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}
