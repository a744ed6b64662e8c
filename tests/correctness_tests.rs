//! Correctness Tests for the LFU Cache Engine
//!
//! Validates eviction order, expiry, statistics and the start/stop lifecycle
//! using small caches and deterministic access patterns.
//!
//! ## Test Strategy
//! - Small cache sizes (2-5 entries) for predictable behavior
//! - Early expiration disabled unless a test is about it
//! - Fixed host load so sweep intervals are reproducible
//! - `check_invariants` after every mutation-heavy scenario

use freqcache::{
    CacheConfig, CacheEngine, CacheError, CacheStats, FixedLoad, LoadSample, MemorySnapshotStore,
    Snapshot, SnapshotEntry, SnapshotStore,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// HELPERS
// ============================================================================

fn config(max_size: usize) -> CacheConfig {
    CacheConfig::new(max_size)
        .without_early_expiration()
        .with_base_sweep_interval(Duration::from_millis(50))
        .with_min_sweep_interval(Duration::from_millis(5))
}

fn make_cache<K, V>(max_size: usize) -> CacheEngine<K, V>
where
    K: std::hash::Hash + Eq + Clone + std::fmt::Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    CacheEngine::builder(config(max_size))
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap()
}

fn live_keys(cache: &CacheEngine<u32, &'static str>, candidates: &[u32]) -> Vec<u32> {
    candidates
        .iter()
        .copied()
        .filter(|k| cache.contains(k))
        .collect()
}

// ============================================================================
// EVICTION ORDER
// ============================================================================

#[test]
fn scenario_capacity_two_evicts_least_frequent() {
    let cache = make_cache(2);
    cache.put(1, "a").unwrap();
    cache.put(2, "b").unwrap();
    assert_eq!(cache.get(&1).unwrap(), Some("a"));
    cache.put(3, "c").unwrap();

    assert_eq!(live_keys(&cache, &[1, 2, 3]), vec![1, 3]);
    assert_eq!(cache.peek(&1).unwrap(), Some("a"));
    assert_eq!(cache.peek(&3).unwrap(), Some("c"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn peek_does_not_refresh_eviction_order() {
    let cache = make_cache(2);
    cache.put(1, "a").unwrap();
    cache.put(2, "b").unwrap();
    assert_eq!(cache.peek(&1).unwrap(), Some("a"));
    cache.put(3, "c").unwrap();

    // 1 is still the oldest entry at frequency 1
    assert_eq!(live_keys(&cache, &[1, 2, 3]), vec![2, 3]);
    assert_eq!(cache.stats(), CacheStats { evictions: 1, ..CacheStats::default() });
}

#[test]
fn tie_break_evicts_least_recently_touched() {
    let cache = make_cache(3);
    cache.put(1, "a").unwrap();
    cache.put(2, "b").unwrap();
    cache.put(3, "c").unwrap();
    // every key at frequency 2, touched in order 2, 3, 1
    cache.get(&2).unwrap();
    cache.get(&3).unwrap();
    cache.get(&1).unwrap();

    cache.put(4, "d").unwrap();
    assert_eq!(live_keys(&cache, &[1, 2, 3, 4]), vec![1, 3, 4]);

    // 4 is alone at frequency 1
    cache.put(5, "e").unwrap();
    assert_eq!(live_keys(&cache, &[1, 2, 3, 4, 5]), vec![1, 3, 5]);
    cache.check_invariants().unwrap();
}

#[test]
fn frequent_entries_survive_a_scan() {
    let cache = make_cache(3);
    cache.put(100, "hot").unwrap();
    for _ in 0..5 {
        cache.get(&100).unwrap();
    }
    for k in 0..50 {
        cache.put(k, "scan").unwrap();
    }
    assert!(cache.contains(&100));
    assert_eq!(cache.frequency(&100).unwrap(), Some(6));
    assert_eq!(cache.len(), 3);
}

#[test]
fn every_capacity_eviction_removes_the_lfu_entry() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let cache: CacheEngine<u32, u32> = make_cache(8);
    // shadow model: key -> (frequency, last touch)
    let mut model: HashMap<u32, (u64, u64)> = HashMap::new();
    let mut clock = 0u64;

    for _ in 0..2000 {
        clock += 1;
        let key = rng.gen_range(0..20);
        if rng.gen_bool(0.5) {
            if let Some((freq, touched)) = model.get_mut(&key) {
                *freq += 1;
                *touched = clock;
                assert_eq!(cache.get(&key).unwrap(), Some(key));
            } else {
                assert_eq!(cache.get(&key).unwrap(), None);
            }
            continue;
        }

        if let Some((freq, touched)) = model.get_mut(&key) {
            *freq += 1;
            *touched = clock;
        } else {
            if model.len() == 8 {
                let (&victim, _) = model
                    .iter()
                    .min_by_key(|(_, rank)| **rank)
                    .unwrap();
                model.remove(&victim);
                cache.put(key, key).unwrap();
                assert!(!cache.contains(&victim), "expected {victim} to be evicted");
                model.insert(key, (1, clock));
                continue;
            }
            model.insert(key, (1, clock));
        }
        cache.put(key, key).unwrap();
        assert!(cache.len() <= 8);
    }

    for (key, (freq, _)) in &model {
        assert_eq!(cache.frequency(key).unwrap(), Some(*freq));
    }
    let true_min = model.values().map(|(freq, _)| *freq).min();
    assert_eq!(cache.min_frequency().unwrap(), true_min);
    cache.check_invariants().unwrap();
}

#[test]
fn len_never_exceeds_max_size() {
    let cache = make_cache(5);
    for k in 0..100u32 {
        cache.put(k, k).unwrap();
        assert!(cache.len() <= 5);
        if k % 3 == 0 {
            cache.get(&(k / 2)).unwrap();
        }
    }
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.stats().evictions, 95);
}

#[test]
fn manual_evict_follows_lfu_order() {
    let cache = make_cache(5);
    cache
        .mset(vec![(1, "a"), (2, "b"), (3, "c"), (4, "d")])
        .unwrap();
    cache.get(&1).unwrap();
    cache.get(&1).unwrap();
    cache.get(&3).unwrap();

    assert_eq!(cache.evict(2).unwrap(), 2);
    assert_eq!(live_keys(&cache, &[1, 2, 3, 4]), vec![1, 3]);
    assert_eq!(cache.evict(10).unwrap(), 2);
    assert!(cache.is_empty());
    assert_eq!(cache.evict(1).unwrap(), 0);
    assert_eq!(cache.stats().evictions, 4);
}

// ============================================================================
// FREQUENCY
// ============================================================================

#[test]
fn consecutive_gets_raise_frequency_by_one_each() {
    let cache = make_cache(4);
    cache.put("k", 1).unwrap();
    for k in 1..=10 {
        assert_eq!(cache.get("k").unwrap(), Some(1));
        assert_eq!(cache.frequency("k").unwrap(), Some(1 + k));
    }
}

#[test]
fn put_update_counts_as_access() {
    let cache = make_cache(2);
    cache.put("a", 1).unwrap();
    cache.put("b", 2).unwrap();
    cache.put("a", 10).unwrap();
    assert_eq!(cache.frequency("a").unwrap(), Some(2));

    // "b" is now the only entry at frequency 1
    cache.put("c", 3).unwrap();
    assert!(cache.contains("a"));
    assert!(!cache.contains("b"));
    assert_eq!(cache.get("a").unwrap(), Some(10));
    // an update is not a read
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn min_frequency_tracks_deletions() {
    let cache = make_cache(4);
    cache.mset(vec![("a", 1), ("b", 2)]).unwrap();
    cache.get("b").unwrap();
    cache.get("b").unwrap();
    assert_eq!(cache.min_frequency().unwrap(), Some(1));

    assert!(cache.del("a").unwrap());
    assert_eq!(cache.min_frequency().unwrap(), Some(3));

    cache.put("c", 3).unwrap();
    assert_eq!(cache.min_frequency().unwrap(), Some(1));
    cache.check_invariants().unwrap();

    cache.mdel(["b", "c"]).unwrap();
    assert_eq!(cache.min_frequency().unwrap(), None);
}

// ============================================================================
// EXPIRY
// ============================================================================

#[test]
fn scenario_expired_get_is_a_miss_and_removes_the_entry() {
    let cache = make_cache(4);
    cache
        .put_with_ttl(1, "a", Some(Duration::from_millis(100)))
        .unwrap();
    thread::sleep(Duration::from_millis(150));

    let before = cache.stats();
    assert_eq!(cache.get(&1).unwrap(), None);
    let after = cache.stats();
    assert_eq!(after.misses, before.misses + 1);
    assert_eq!(after.hits, before.hits);
    assert_eq!(cache.len(), 0);
    assert!(!cache.contains(&1));
}

#[test]
fn default_ttl_applies_to_put_and_mset() {
    let config = config(4).with_default_ttl(Some(Duration::from_millis(40)));
    let cache: CacheEngine<&str, u32> = CacheEngine::builder(config)
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap();
    cache.put("a", 1).unwrap();
    cache.mset(vec![("b", 2)]).unwrap();
    cache.put_with_ttl("forever", 3, None).unwrap();

    thread::sleep(Duration::from_millis(80));
    assert_eq!(cache.get("a").unwrap(), None);
    assert_eq!(cache.get("b").unwrap(), None);
    assert_eq!(cache.get("forever").unwrap(), Some(3));
}

#[test]
fn renewing_with_no_ttl_never_expires() {
    let cache = make_cache(4);
    cache
        .put_with_ttl("a", 1, Some(Duration::from_millis(20)))
        .unwrap();
    cache.put_with_ttl("a", 2, None).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(cache.get("a").unwrap(), Some(2));
}

#[test]
fn overwrite_restarts_the_ttl_clock() {
    let cache = make_cache(4);
    cache
        .put_with_ttl("a", 1, Some(Duration::from_millis(200)))
        .unwrap();
    thread::sleep(Duration::from_millis(120));
    cache
        .put_with_ttl("a", 2, Some(Duration::from_millis(200)))
        .unwrap();
    thread::sleep(Duration::from_millis(120));
    assert_eq!(cache.get("a").unwrap(), Some(2));
}

#[test]
fn ttl_beyond_the_clock_range_never_expires() {
    let cache = make_cache(1);
    cache.put(1, "a").unwrap();
    cache.put_with_ttl(2, "b", Some(Duration::MAX)).unwrap();

    assert_eq!(live_keys(&cache, &[1, 2]), vec![2]);
    assert_eq!(cache.stats().evictions, 1);
    assert_eq!(cache.get(&2).unwrap(), Some("b"));

    // renewing an existing entry takes the same path
    cache.put_with_ttl(2, "c", Some(Duration::MAX)).unwrap();
    assert_eq!(cache.sweep_now().unwrap().expired, 0);
    assert_eq!(cache.get(&2).unwrap(), Some("c"));
    cache.check_invariants().unwrap();
}

#[test]
fn huge_default_ttl_is_accepted() {
    let config = config(2).with_default_ttl(Some(Duration::MAX));
    config.validate().unwrap();
    let cache: CacheEngine<u32, u32> = CacheEngine::builder(config)
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap();
    cache.mset(vec![(1, 1), (2, 2)]).unwrap();
    assert_eq!(cache.mget([1u32, 2].iter()).unwrap(), vec![Some(1), Some(2)]);
}

#[test]
fn zero_ttl_is_rejected() {
    let cache = make_cache(4);
    let err = cache
        .put_with_ttl("a", 1, Some(Duration::ZERO))
        .unwrap_err();
    assert!(matches!(err, CacheError::Input(_)));
    assert!(!err.is_fatal());
    assert!(cache.is_empty());
}

#[test]
fn early_expiration_applies_near_the_deadline() {
    let config = config(4).with_early_expiration(1.0, 1.0);
    let cache: CacheEngine<&str, u32> = CacheEngine::builder(config)
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap();
    cache
        .put_with_ttl("a", 1, Some(Duration::from_secs(60)))
        .unwrap();
    cache.put_with_ttl("b", 2, None).unwrap();
    thread::sleep(Duration::from_millis(5));

    // a window of the whole TTL and probability 1 expires on the first read
    assert_eq!(cache.get("a").unwrap(), None);
    assert!(!cache.contains("a"));
    assert_eq!(cache.get("b").unwrap(), Some(2));
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn sweep_removes_expired_entries_in_batches() {
    let config = config(100).with_sweep_batch_size(3);
    let cache: CacheEngine<u32, u32> = CacheEngine::builder(config)
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap();
    for k in 0..20 {
        let ttl = if k % 2 == 0 {
            Some(Duration::from_millis(10))
        } else {
            None
        };
        cache.put_with_ttl(k, k, ttl).unwrap();
    }
    thread::sleep(Duration::from_millis(30));

    let report = cache.sweep_now().unwrap();
    assert_eq!(report.expired, 10);
    assert_eq!(cache.len(), 10);
    assert_eq!(cache.stats().evictions, 10);
    assert_eq!(cache.stats().misses, 0);
    cache.check_invariants().unwrap();
}

#[test]
fn background_sweep_runs_while_started() {
    let cache = make_cache(10);
    cache
        .put_with_ttl("short", 1, Some(Duration::from_millis(10)))
        .unwrap();
    cache.put("long", 2).unwrap();
    cache.start().unwrap();
    assert!(cache.is_running());

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while cache.len() > 1 && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("long"));
    // the sweep never registers reads
    assert_eq!(cache.stats().misses, 0);

    cache.stop().unwrap();
    assert!(!cache.is_running());
}

#[test]
fn sweep_interval_adapts_to_fill_and_load() {
    let config = config(4)
        .with_base_sweep_interval(Duration::from_secs(8))
        .with_min_sweep_interval(Duration::from_millis(100));
    let busy = LoadSample {
        load_average: 1.0,
        cpu_cores: 4,
    };
    let cache: CacheEngine<u32, u32> = CacheEngine::builder(config)
        .load_source(FixedLoad(busy))
        .build()
        .unwrap();
    assert_eq!(cache.sweep_interval(), Duration::from_secs(8));

    cache.put(1, 1).unwrap();
    // 1 - 0.25 fill - 0.25 load
    assert_eq!(cache.sweep_now().unwrap().interval, Duration::from_secs(4));

    cache.mset(vec![(2, 2), (3, 3), (4, 4)]).unwrap();
    assert_eq!(cache.sweep_now().unwrap().interval, Duration::from_millis(100));
    assert_eq!(cache.sweep_interval(), Duration::from_millis(100));
}

// ============================================================================
// DISABLED CACHE AND BULK OPERATIONS
// ============================================================================

#[test]
fn scenario_disabled_cache_ignores_puts() {
    let cache = make_cache(0);
    cache.put(1, "a").unwrap();
    assert_eq!(cache.get(&1).unwrap(), None);
    assert!(cache.is_empty());
    assert_eq!(cache.capacity(), 0);
    assert_eq!(cache.sweep_now().unwrap().expired, 0);
}

#[test]
fn bulk_operations_are_element_wise() {
    let cache = make_cache(10);
    cache
        .mset(vec![("a", 1), ("b", 2), ("c", 3)])
        .unwrap();
    assert_eq!(
        cache.mget(["a", "zz", "c"]).unwrap(),
        vec![Some(1), None, Some(3)]
    );
    assert_eq!(cache.mdel(["a", "zz"]).unwrap(), 1);
    assert_eq!(cache.len(), 2);
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 2,
            misses: 1,
            evictions: 0
        }
    );
}

#[test]
fn clear_keeps_stats_and_resets_structure() {
    let cache = make_cache(3);
    cache.mset(vec![(1, "a"), (2, "b")]).unwrap();
    cache.get(&1).unwrap();
    cache.get(&9).unwrap();
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.min_frequency().unwrap(), None);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);

    cache.put(3, "c").unwrap();
    assert_eq!(cache.frequency(&3).unwrap(), Some(1));
    cache.check_invariants().unwrap();
}

#[test]
fn monitor_performance_raises_alarms() {
    let config = config(2).with_eviction_alarm_threshold(3);
    let cache: CacheEngine<u32, u32> = CacheEngine::builder(config)
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap();
    for k in 0..4 {
        cache.put(k, k).unwrap();
        cache.get(&k).unwrap();
    }
    let report = cache.monitor_performance();
    assert!(report.is_healthy());
    assert_eq!(report.hit_ratio, Some(1.0));

    for k in 10..20 {
        cache.get(&k).unwrap();
        cache.put(k, k).unwrap();
    }
    let report = cache.monitor_performance();
    assert!(report.low_hit_ratio);
    assert!(report.eviction_alarm);
    assert_eq!(report.evictions, cache.stats().evictions);
}

// ============================================================================
// LIFECYCLE AND SNAPSHOTS
// ============================================================================

#[test]
fn start_and_stop_are_idempotent_and_restartable() {
    let cache = make_cache(4);
    cache.mset(vec![("a", 1), ("b", 2)]).unwrap();
    cache.get("a").unwrap();

    cache.start().unwrap();
    cache.start().unwrap();
    cache.stop().unwrap();
    cache.stop().unwrap();
    cache.start().unwrap();
    assert!(cache.is_running());

    // state survives the restart
    assert_eq!(cache.frequency("a").unwrap(), Some(2));
    assert_eq!(cache.min_frequency().unwrap(), Some(1));
    cache.stop().unwrap();
}

#[test]
fn stop_saves_and_first_start_restores_a_snapshot() {
    let store = Arc::new(MemorySnapshotStore::new());
    let first: CacheEngine<&str, u32> = CacheEngine::builder(config(4))
        .load_source(FixedLoad(LoadSample::IDLE))
        .snapshot_store(Arc::clone(&store))
        .build()
        .unwrap();
    first.mset(vec![("a", 1), ("b", 2), ("c", 3)]).unwrap();
    first.get("a").unwrap();
    first.get("a").unwrap();
    first.get("c").unwrap();
    first.start().unwrap();
    first.stop().unwrap();
    assert_eq!(store.save_count(), 1);

    let saved = store.current().unwrap();
    let order: Vec<_> = saved.entries.iter().map(|e| (e.key, e.frequency)).collect();
    assert_eq!(order, vec![("b", 1), ("c", 2), ("a", 3)]);

    let second: CacheEngine<&str, u32> = CacheEngine::builder(config(4))
        .load_source(FixedLoad(LoadSample::IDLE))
        .snapshot_store(Arc::clone(&store))
        .build()
        .unwrap();
    second.start().unwrap();
    assert_eq!(second.frequency("a").unwrap(), Some(3));
    assert_eq!(second.frequency("c").unwrap(), Some(2));
    assert_eq!(second.peek("b").unwrap(), Some(2));
    second.check_invariants().unwrap();

    // a restart does not reload
    second.del("b").unwrap();
    second.stop().unwrap();
    second.start().unwrap();
    assert!(!second.contains("b"));
    second.stop().unwrap();
}

#[test]
fn restore_skips_entries_with_no_time_left() {
    let entry = |key, remaining_ttl| SnapshotEntry {
        key,
        value: 0u32,
        frequency: 1,
        ttl: Some(Duration::from_secs(10)),
        remaining_ttl,
    };
    let store = MemorySnapshotStore::with_snapshot(Snapshot::new(vec![
        entry("gone", Some(Duration::ZERO)),
        entry("kept", Some(Duration::from_secs(5))),
    ]));
    let cache: CacheEngine<&str, u32> = CacheEngine::builder(config(4))
        .load_source(FixedLoad(LoadSample::IDLE))
        .snapshot_store(store)
        .build()
        .unwrap();
    cache.start().unwrap();
    assert!(!cache.contains("gone"));
    assert!(cache.contains("kept"));
    cache.stop().unwrap();
}

#[test]
fn restore_counts_room_after_skipping_present_keys() {
    let entry = |key, frequency| SnapshotEntry {
        key,
        value: 0u32,
        frequency,
        ttl: None,
        remaining_ttl: None,
    };
    let store = MemorySnapshotStore::with_snapshot(Snapshot::new(vec![
        entry("x", 1),
        entry("a", 5),
    ]));
    let cache: CacheEngine<&str, u32> = CacheEngine::builder(config(2))
        .load_source(FixedLoad(LoadSample::IDLE))
        .snapshot_store(store)
        .build()
        .unwrap();
    cache.put("a", 7).unwrap();
    cache.start().unwrap();

    assert_eq!(cache.len(), 2);
    assert!(cache.contains("x"));
    // the live value wins over the saved one
    assert_eq!(cache.peek("a").unwrap(), Some(7));
    assert_eq!(cache.frequency("a").unwrap(), Some(1));
    cache.check_invariants().unwrap();
    cache.stop().unwrap();
}

#[derive(Debug)]
struct FailingStore;

impl SnapshotStore<u32, u32> for FailingStore {
    fn load_snapshot(&self) -> freqcache::Result<Option<Snapshot<u32, u32>>> {
        Err(CacheError::Snapshot("backend unavailable".into()))
    }

    fn save_snapshot(&self, _snapshot: &Snapshot<u32, u32>) -> freqcache::Result<()> {
        Err(CacheError::Snapshot("backend unavailable".into()))
    }
}

#[test]
fn snapshot_failures_surface_from_start() {
    let cache: CacheEngine<u32, u32> = CacheEngine::builder(config(4))
        .load_source(FixedLoad(LoadSample::IDLE))
        .snapshot_store(FailingStore)
        .build()
        .unwrap();
    let err = cache.start().unwrap_err();
    assert!(matches!(err, CacheError::Snapshot(_)));
    assert!(!cache.is_running());

    // the cache itself keeps working
    cache.put(1, 1).unwrap();
    assert_eq!(cache.get(&1).unwrap(), Some(1));
}
