#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │ CacheEngine                                                              │
//! │                                                                          │
//! │   put / get / peek / del / mget / mset / mdel / clear / evict / stats    │
//! │        │                                                                 │
//! │        ▼                                                                 │
//! │   Mutex<State> ─────────────────────────────────────────────┐            │
//! │   │ FrequencyIndex                                          │            │
//! │   │   HashMap<K, SlotId> ─► SlotArena<Entry<K, V>>          │            │
//! │   │   BTreeMap<u64, FrequencyBucket>, min_frequency         │            │
//! │   │ CacheStats, sweep_interval, poisoned                    │            │
//! │   └─────────────────────────────────────────────────────────┘            │
//! │        ▲                                   ▲                             │
//! │        │ batch by batch                    │ first start / every stop    │
//! │   Sweeper thread ◄── EvictionPolicy        SnapshotStore                 │
//! │        ▲                                                                 │
//! │        └── LoadSource (load average / cores)                             │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction order
//!
//! A full cache evicts the entry with the lowest access frequency; among
//! entries with equal frequency, the one touched longest ago. Every `get` hit
//! and every overwrite by `put` raises an entry's frequency by one.
//!
//! ## Expiry
//!
//! | Path | Behaviour | Counted as |
//! |------|-----------|------------|
//! | `get` past the deadline | entry removed, `None` | miss |
//! | `get` inside the early window | removed with the configured probability | miss |
//! | `peek` past the deadline | `None`, entry left in place | nothing |
//! | background sweep | every expired entry removed | eviction |
//!
//! ## Modules
//!
//! - [`engine`]: the thread-safe cache and its builder
//! - [`index`]: key map, entry arena and frequency buckets
//! - [`policy`]: LFU eviction, early expiration and sweep interval rules
//! - [`config`]: engine configuration and defaults
//! - [`snapshot`]: persistence boundary used at start and stop
//! - [`metrics`]: counters, BTreeMap reports and performance alarms

/// Slot arena holding cache entries.
///
/// Entries are addressed by stable [`SlotId`](arena::SlotId) indices; buckets
/// link them through these indices rather than pointers.
pub mod arena;

/// Frequency bucket: a recency-ordered list of arena slots.
pub mod bucket;

/// Cache configuration.
pub mod config;

/// Cache entry type.
pub mod entry;

/// Thread-safe cache engine.
pub mod engine;

/// Error taxonomy shared by every module.
pub mod error;

/// Frequency index combining the key map, arena and buckets.
pub mod index;

/// Host load sampling for the adaptive sweep.
pub mod load;

/// Cache metrics and performance reports.
pub mod metrics;

/// Eviction, expiry and sweep scheduling rules.
pub mod policy;

/// Snapshot persistence boundary.
pub mod snapshot;

/// Background sweep thread.
pub(crate) mod sweeper;

pub use config::CacheConfig;
pub use engine::{CacheEngine, CacheEngineBuilder, SweepReport};
pub use entry::Entry;
pub use error::{BoxError, CacheError, Result};
pub use index::FrequencyIndex;
pub use load::{FixedLoad, LoadSample, LoadSource, SystemLoad};
pub use metrics::{CacheMetrics, CacheStats, PerformanceReport};
pub use policy::EvictionPolicy;
pub use snapshot::{MemorySnapshotStore, Snapshot, SnapshotEntry, SnapshotStore};
