//! Cache Engine
//!
//! [`CacheEngine`] is the public face of the crate. It owns one
//! [`FrequencyIndex`] behind a `parking_lot::Mutex`, applies the
//! [`EvictionPolicy`] on every write and read, and drives an optional
//! background [`Sweeper`] that removes expired entries and retunes its own
//! interval.
//!
//! # Locking
//!
//! Every public operation takes the state lock once. The background sweep
//! takes it once per batch of `sweep_batch_size` arena slots, so a sweep over
//! a large cache never stalls readers for the whole scan. Host load is
//! sampled before the lock is taken.
//!
//! `start` and `stop` are serialized by a second lock that the sweep thread
//! never touches; `stop` joins the thread while holding only that lock.
//!
//! # Poisoning
//!
//! The first [`CacheError::Invariant`] returned by any operation marks the
//! instance poisoned. From then on every structural operation fails with
//! [`CacheError::Poisoned`] and the sweeper winds down. [`CacheEngine::clear`]
//! discards the corrupt structure and lifts the poison.
//!
//! # Example
//!
//! ```
//! use freqcache::{CacheConfig, CacheEngine};
//!
//! let cache = CacheEngine::new(CacheConfig::new(2)).unwrap();
//! cache.put(1, "a").unwrap();
//! cache.put(2, "b").unwrap();
//! assert_eq!(cache.get(&1).unwrap(), Some("a"));
//!
//! // 2 is the least frequently used entry
//! cache.put(3, "c").unwrap();
//! assert_eq!(cache.get(&2).unwrap(), None);
//! assert_eq!(cache.len(), 2);
//! ```

use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::hash::{BuildHasher, Hash};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::arena::SlotId;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::index::FrequencyIndex;
use crate::load::{LoadSource, SystemLoad};
use crate::metrics::{CacheMetrics, CacheStats, PerformanceReport};
use crate::policy::EvictionPolicy;
use crate::snapshot::{Snapshot, SnapshotEntry, SnapshotStore};
use crate::sweeper::Sweeper;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

const SWEEPER_THREAD_NAME: &str = "freqcache-sweeper";

/// Upper bound on the number of entries allocated up front.
const MAX_PREALLOCATED: usize = 4096;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired entries removed.
    pub expired: usize,
    /// Empty frequency buckets freed.
    pub pruned_buckets: usize,
    /// Interval until the next background sweep.
    pub interval: Duration,
}

struct State<K, V, S> {
    index: FrequencyIndex<K, V, S>,
    stats: CacheStats,
    sweep_interval: Duration,
    poisoned: bool,
}

impl<K, V, S> State<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    fn snapshot(&self, now: Instant) -> Snapshot<K, V> {
        let entries = self
            .index
            .snapshot_order()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| SnapshotEntry {
                key: entry.key.clone(),
                value: entry.value.clone(),
                frequency: entry.frequency(),
                ttl: entry.ttl(),
                remaining_ttl: entry.remaining_ttl(now),
            })
            .collect();
        Snapshot::new(entries)
    }
}

struct Shared<K, V, S> {
    config: CacheConfig,
    policy: EvictionPolicy,
    load: Box<dyn LoadSource>,
    state: Mutex<State<K, V, S>>,
}

impl<K, V, S> Shared<K, V, S>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
    S: BuildHasher,
{
    /// Runs `f` on the state unless it is poisoned; poisons it if `f` reports
    /// a broken invariant.
    fn with_state<T>(&self, f: impl FnOnce(&mut State<K, V, S>) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock();
        if state.poisoned {
            return Err(CacheError::Poisoned);
        }
        let result = f(&mut *state);
        if let Err(CacheError::Invariant(reason)) = &result {
            state.poisoned = true;
            error!(%reason, "cache invariant violated, refusing further operations");
        }
        result
    }

    fn sweep(&self) -> Result<SweepReport> {
        let load = self.load.sample();
        let batch = self.policy.batch_size();
        let mut start = 0;
        let mut expired = 0;
        loop {
            let done = self.with_state(|state| {
                if start >= state.index.slot_capacity() {
                    return Ok(true);
                }
                let removed = self
                    .policy
                    .expire_batch(&mut state.index, start, Instant::now())?;
                state.stats.record_evictions(removed);
                expired += removed;
                Ok(false)
            })?;
            if done {
                break;
            }
            start += batch;
        }

        let (pruned_buckets, interval) = self.with_state(|state| {
            let pruned = state.index.prune_empty_buckets();
            let interval =
                self.policy
                    .next_interval(state.index.len(), self.config.max_size, load);
            state.sweep_interval = interval;
            Ok((pruned, interval))
        })?;
        debug!(
            expired,
            pruned_buckets,
            interval_ms = interval.as_millis() as u64,
            "sweep finished"
        );
        Ok(SweepReport {
            expired,
            pruned_buckets,
            interval,
        })
    }

    fn restore(&self, snapshot: Snapshot<K, V>) -> Result<usize> {
        if self.config.is_disabled() {
            return Ok(0);
        }
        self.with_state(|state| {
            let now = Instant::now();
            let live: Vec<_> = snapshot
                .entries
                .into_iter()
                .filter(|entry| entry.remaining_ttl != Some(Duration::ZERO))
                .filter(|entry| state.index.get_id(&entry.key).is_none())
                .collect();
            // keep the most frequently used entries when the snapshot is too big
            let room = self.config.max_size.saturating_sub(state.index.len());
            let skip = live.len().saturating_sub(room);

            let mut restored = 0;
            for entry in live.into_iter().skip(skip) {
                // a snapshot may repeat a key
                if state.index.get_id(&entry.key).is_some() {
                    continue;
                }
                state.index.insert_with_frequency(
                    entry.key,
                    entry.value,
                    entry.frequency,
                    entry.ttl,
                    entry.remaining_ttl,
                    now,
                )?;
                restored += 1;
            }
            Ok(restored)
        })
    }
}

#[derive(Default)]
struct Control {
    sweeper: Option<Sweeper>,
    restored: bool,
}

/// A thread-safe LFU cache with TTL expiration and an adaptive background
/// sweep.
///
/// All operations take `&self`; share the engine between threads with an
/// `Arc`.
pub struct CacheEngine<K, V, S = DefaultHashBuilder> {
    shared: Arc<Shared<K, V, S>>,
    control: Mutex<Control>,
    snapshot_store: Option<Box<dyn SnapshotStore<K, V>>>,
}

impl<K, V> CacheEngine<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Creates an engine with the default hasher and system load sampling.
    ///
    /// Returns [`CacheError::Config`] if `config` fails validation.
    pub fn new(config: CacheConfig) -> Result<Self> {
        CacheEngineBuilder::new(config).build()
    }

    /// Returns a builder for engines that need a custom hasher, load source
    /// or snapshot store.
    pub fn builder(config: CacheConfig) -> CacheEngineBuilder<K, V> {
        CacheEngineBuilder::new(config)
    }
}

impl<K, V, S> CacheEngine<K, V, S>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
    S: BuildHasher + Send + 'static,
{
    /// Creates an engine that hashes keys with `hash_builder`.
    pub fn with_hasher(config: CacheConfig, hash_builder: S) -> Result<Self> {
        CacheEngineBuilder::new(config).hasher(hash_builder).build()
    }

    fn init(
        config: CacheConfig,
        hash_builder: S,
        load: Box<dyn LoadSource>,
        snapshot_store: Option<Box<dyn SnapshotStore<K, V>>>,
    ) -> Result<Self> {
        config.validate()?;
        let policy = EvictionPolicy::from_config(&config);
        let state = State {
            index: FrequencyIndex::with_capacity_and_hasher(
                config.max_size.min(MAX_PREALLOCATED),
                hash_builder,
            ),
            stats: CacheStats::default(),
            sweep_interval: policy.base_interval(),
            poisoned: false,
        };
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                policy,
                load,
                state: Mutex::new(state),
            }),
            control: Mutex::new(Control::default()),
            snapshot_store,
        })
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Maximum number of entries; zero means the cache is disabled.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.config.max_size
    }

    /// Number of entries, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.shared.state.lock().index.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once an invariant violation has been detected.
    pub fn is_poisoned(&self) -> bool {
        self.shared.state.lock().poisoned
    }

    /// Stores `value` under `key` with the configured default TTL.
    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.put_with_ttl(key, value, self.shared.config.default_ttl)
    }

    /// Stores `value` under `key`, expiring after `ttl`; `None` never expires.
    ///
    /// Overwriting an existing key replaces its value and TTL and counts as an
    /// access. Inserting into a full cache evicts the least frequently used
    /// entry first. A zero `ttl` is rejected with [`CacheError::Input`]; a
    /// `ttl` too large for the clock never expires. A disabled cache ignores
    /// the call.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) -> Result<()> {
        check_ttl(ttl)?;
        let max_size = self.shared.config.max_size;
        if max_size == 0 {
            return Ok(());
        }
        self.shared.with_state(|state| {
            let now = Instant::now();
            if let Some(id) = state.index.get_id(&key) {
                let entry = state.index.entry_mut(id).ok_or_else(|| vacant(id))?;
                entry.value = value;
                entry.renew_ttl(ttl, now);
                state.index.promote(id)?;
                return Ok(());
            }
            if state.index.len() >= max_size {
                let overflow = state.index.len() + 1 - max_size;
                let evicted = self.shared.policy.evict_lfu(&mut state.index, overflow)?;
                state.stats.record_evictions(evicted);
            }
            state.index.insert(key, value, ttl, now)?;
            Ok(())
        })
    }

    /// Returns a copy of the value under `key` and counts the access.
    ///
    /// An entry past its deadline, or one chosen for early expiration, is
    /// removed and reported as a miss.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.shared.with_state(|state| {
            let Some(id) = state.index.get_id(key) else {
                state.stats.record_miss();
                return Ok(None);
            };
            let now = Instant::now();
            let entry = state.index.expect_entry(id)?;
            let hard = entry.is_expired(now);
            let expired = hard
                || self
                    .shared
                    .policy
                    .should_expire_early(entry, now, &mut rand::thread_rng());
            if expired {
                let (key, _) = state.index.detach(id)?;
                state.stats.record_miss();
                debug!(key = ?key, early = !hard, "expired entry removed on read");
                return Ok(None);
            }
            state.index.promote(id)?;
            state.stats.record_hit();
            Ok(Some(state.index.expect_entry(id)?.value.clone()))
        })
    }

    /// Returns a copy of the value under `key` without counting an access.
    ///
    /// Expired entries read as `None` but are left for the sweep.
    pub fn peek<Q>(&self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.shared.with_state(|state| {
            let Some(id) = state.index.get_id(key) else {
                return Ok(None);
            };
            let entry = state.index.expect_entry(id)?;
            if entry.is_expired(Instant::now()) {
                return Ok(None);
            }
            Ok(Some(entry.value.clone()))
        })
    }

    /// Returns `true` if `key` is present and not past its deadline.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let state = self.shared.state.lock();
        let now = Instant::now();
        state
            .index
            .get_id(key)
            .and_then(|id| state.index.entry(id))
            .map_or(false, |entry| !entry.is_expired(now))
    }

    /// Removes `key`; returns whether it was present.
    pub fn del<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + Debug,
    {
        self.shared.with_state(|state| match state.index.remove(key)? {
            Some(_) => {
                debug!(key = ?key, "deleted entry");
                Ok(true)
            }
            None => {
                warn!(key = ?key, "delete of missing key");
                Ok(false)
            }
        })
    }

    /// Reads each key in turn, as [`get`](Self::get) would.
    pub fn mget<'a, Q, I>(&self, keys: I) -> Result<Vec<Option<V>>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        keys.into_iter().map(|key| self.get(key)).collect()
    }

    /// Stores each pair in turn with the default TTL.
    pub fn mset<I>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.mset_with_ttl(pairs, self.shared.config.default_ttl)
    }

    /// Stores each pair in turn with `ttl`.
    ///
    /// Pairs are written one at a time; a failure leaves earlier pairs
    /// written.
    pub fn mset_with_ttl<I>(&self, pairs: I, ttl: Option<Duration>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        check_ttl(ttl)?;
        for (key, value) in pairs {
            self.put_with_ttl(key, value, ttl)?;
        }
        Ok(())
    }

    /// Removes each key in turn; returns how many were present.
    pub fn mdel<'a, Q, I>(&self, keys: I) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + Debug + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        let mut removed = 0;
        for key in keys {
            if self.del(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Drops every entry and frequency bucket. Statistics are kept.
    ///
    /// Also lifts a poisoned state, since the corrupt structure is gone.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        let dropped = state.index.len();
        state.index.clear();
        if state.poisoned {
            warn!("clearing poisoned cache");
            state.poisoned = false;
        }
        info!(dropped, "cache cleared");
    }

    /// Hit, miss and eviction counters as of this call.
    pub fn stats(&self) -> CacheStats {
        self.shared.state.lock().stats
    }

    /// Evicts up to `count` entries in LFU order; returns how many left.
    pub fn evict(&self, count: usize) -> Result<usize> {
        self.shared.with_state(|state| {
            let evicted = self.shared.policy.evict_lfu(&mut state.index, count)?;
            state.stats.record_evictions(evicted);
            Ok(evicted)
        })
    }

    /// Access frequency of `key`, if present.
    pub fn frequency<Q>(&self, key: &Q) -> Result<Option<u64>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.shared.with_state(|state| Ok(state.index.frequency_of(key)))
    }

    /// Lowest access frequency among live entries, `None` when empty.
    pub fn min_frequency(&self) -> Result<Option<u64>> {
        self.shared
            .with_state(|state| Ok(state.index.settled_min_frequency()))
    }

    /// Interval the background sweep currently waits between runs.
    pub fn sweep_interval(&self) -> Duration {
        self.shared.state.lock().sweep_interval
    }

    /// Runs one sweep on the calling thread.
    pub fn sweep_now(&self) -> Result<SweepReport> {
        self.shared.sweep()
    }

    /// Verifies the internal structure in O(n). A failure poisons the cache.
    pub fn check_invariants(&self) -> Result<()> {
        self.shared.with_state(|state| state.index.check_invariants())
    }

    /// Checks hit ratio and eviction count against the alarm thresholds and
    /// logs a warning for each one crossed.
    pub fn monitor_performance(&self) -> PerformanceReport {
        let stats = self.stats();
        let report =
            PerformanceReport::evaluate(&stats, self.shared.config.eviction_alarm_threshold);
        if report.low_hit_ratio {
            warn!(hit_ratio = report.hit_ratio, "cache hit ratio is low");
        }
        if report.eviction_alarm {
            warn!(
                evictions = report.evictions,
                threshold = self.shared.config.eviction_alarm_threshold,
                "cache evictions exceeded alarm threshold"
            );
        }
        report
    }

    /// Returns `true` while the background sweep is running.
    pub fn is_running(&self) -> bool {
        self.control
            .lock()
            .sweeper
            .as_ref()
            .map_or(false, Sweeper::is_running)
    }

    /// Starts the background sweep.
    ///
    /// On the first start the snapshot store, if any, is asked for a snapshot
    /// to restore. Starting a running engine does nothing.
    pub fn start(&self) -> Result<()> {
        let mut control = self.control.lock();
        if control.sweeper.as_ref().map_or(false, Sweeper::is_running) {
            return Ok(());
        }
        if !control.restored {
            if let Some(store) = &self.snapshot_store {
                if let Some(snapshot) = store.load_snapshot()? {
                    let offered = snapshot.len();
                    let restored = self.shared.restore(snapshot)?;
                    info!(offered, restored, "restored cache snapshot");
                }
            }
            control.restored = true;
        }

        let initial = self.shared.with_state(|state| Ok(state.sweep_interval))?;
        let shared = Arc::downgrade(&self.shared);
        let sweeper = Sweeper::spawn(SWEEPER_THREAD_NAME, initial, move || {
            let shared = shared.upgrade()?;
            match shared.sweep() {
                Ok(report) => Some(report.interval),
                Err(err) => {
                    error!(%err, "background sweep failed, stopping sweeper");
                    None
                }
            }
        })?;
        control.sweeper = Some(sweeper);
        info!(interval_ms = initial.as_millis() as u64, "cache sweeper started");
        Ok(())
    }

    /// Stops the background sweep and, if a snapshot store is configured,
    /// saves the cache contents to it.
    ///
    /// Stopping a stopped engine does nothing. The engine keeps all of its
    /// entries and can be started again.
    pub fn stop(&self) -> Result<()> {
        let mut control = self.control.lock();
        let Some(mut sweeper) = control.sweeper.take() else {
            return Ok(());
        };
        sweeper.stop();
        info!("cache sweeper stopped");

        if let Some(store) = &self.snapshot_store {
            let snapshot = self
                .shared
                .with_state(|state| Ok(state.snapshot(Instant::now())))?;
            store.save_snapshot(&snapshot)?;
            info!(entries = snapshot.len(), "saved cache snapshot");
        }
        Ok(())
    }
}

impl<K, V, S> CacheMetrics for CacheEngine<K, V, S>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
    S: BuildHasher + Send + 'static,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let state = self.shared.state.lock();
        let stats = state.stats;
        let mut metrics = BTreeMap::new();
        metrics.insert("hits".to_string(), stats.hits as f64);
        metrics.insert("misses".to_string(), stats.misses as f64);
        metrics.insert("requests".to_string(), stats.requests() as f64);
        metrics.insert("evictions".to_string(), stats.evictions as f64);
        metrics.insert("hit_rate".to_string(), stats.hit_rate().unwrap_or(0.0));
        metrics.insert("len".to_string(), state.index.len() as f64);
        metrics.insert("max_size".to_string(), self.shared.config.max_size as f64);
        metrics.insert(
            "min_frequency".to_string(),
            state.index.settled_min_frequency().unwrap_or(0) as f64,
        );
        metrics.insert(
            "max_frequency".to_string(),
            state.index.max_frequency().unwrap_or(0) as f64,
        );
        metrics.insert(
            "active_frequency_levels".to_string(),
            state.index.active_levels() as f64,
        );
        metrics.insert(
            "sweep_interval_ms".to_string(),
            state.sweep_interval.as_millis() as f64,
        );
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "LFU"
    }
}

impl<K, V, S> Drop for CacheEngine<K, V, S> {
    fn drop(&mut self) {
        if let Some(mut sweeper) = self.control.get_mut().sweeper.take() {
            sweeper.stop();
        }
    }
}

impl<K, V, S> Debug for CacheEngine<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("CacheEngine")
            .field("config", &self.shared.config)
            .field("index", &state.index)
            .field("stats", &state.stats)
            .field("poisoned", &state.poisoned)
            .field("snapshot_store", &self.snapshot_store.is_some())
            .finish()
    }
}

fn check_ttl(ttl: Option<Duration>) -> Result<()> {
    match ttl {
        Some(ttl) if ttl.is_zero() => Err(CacheError::Input(
            "ttl must be greater than zero".into(),
        )),
        _ => Ok(()),
    }
}

fn vacant(id: SlotId) -> CacheError {
    CacheError::Invariant(format!("mapped slot {} is vacant", id.index()))
}

/// Builds a [`CacheEngine`] with optional collaborators.
///
/// ```
/// use std::sync::Arc;
/// use freqcache::{CacheConfig, CacheEngine, FixedLoad, LoadSample, MemorySnapshotStore};
///
/// let store = Arc::new(MemorySnapshotStore::new());
/// let cache = CacheEngine::<String, u64>::builder(CacheConfig::new(100))
///     .load_source(FixedLoad(LoadSample::IDLE))
///     .snapshot_store(Arc::clone(&store))
///     .build()
///     .unwrap();
/// cache.put("hits".to_string(), 1).unwrap();
/// cache.start().unwrap();
/// cache.stop().unwrap();
/// assert_eq!(store.save_count(), 1);
/// ```
pub struct CacheEngineBuilder<K, V, S = DefaultHashBuilder> {
    config: CacheConfig,
    hash_builder: S,
    load: Option<Box<dyn LoadSource>>,
    snapshot_store: Option<Box<dyn SnapshotStore<K, V>>>,
}

impl<K, V> CacheEngineBuilder<K, V> {
    /// Starts a builder from `config` with the default hasher.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            hash_builder: DefaultHashBuilder::default(),
            load: None,
            snapshot_store: None,
        }
    }
}

impl<K, V, S> CacheEngineBuilder<K, V, S> {
    /// Hashes keys with `hash_builder`.
    pub fn hasher<S2>(self, hash_builder: S2) -> CacheEngineBuilder<K, V, S2> {
        CacheEngineBuilder {
            config: self.config,
            hash_builder,
            load: self.load,
            snapshot_store: self.snapshot_store,
        }
    }

    /// Samples host load from `load` instead of [`SystemLoad`].
    pub fn load_source(mut self, load: impl LoadSource + 'static) -> Self {
        self.load = Some(Box::new(load));
        self
    }

    /// Restores from and saves to `store` at start and stop.
    pub fn snapshot_store(mut self, store: impl SnapshotStore<K, V> + 'static) -> Self {
        self.snapshot_store = Some(Box::new(store));
        self
    }
}

impl<K, V, S> CacheEngineBuilder<K, V, S>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
    S: BuildHasher + Send + 'static,
{
    /// Validates the configuration and builds the engine. The sweeper is not
    /// started.
    pub fn build(self) -> Result<CacheEngine<K, V, S>> {
        let load = self.load.unwrap_or_else(|| Box::new(SystemLoad));
        CacheEngine::init(self.config, self.hash_builder, load, self.snapshot_store)
    }
}

impl<K, V, S> Debug for CacheEngineBuilder<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngineBuilder")
            .field("config", &self.config)
            .field("load", &self.load)
            .field("snapshot_store", &self.snapshot_store.is_some())
            .finish()
    }
}
