//! Cache Metrics
//!
//! Hit/miss/eviction counters kept by the engine plus a BTreeMap-based report
//! for callers that want a uniform, deterministically ordered view.
//!
//! BTreeMap keeps report keys sorted, so two reports taken from the same
//! state print identically.

use std::collections::BTreeMap;

/// Hit ratio below which [`PerformanceReport::low_hit_ratio`] is raised.
pub const LOW_HIT_RATIO_THRESHOLD: f64 = 0.8;

/// Counters exposed by [`CacheEngine::stats`](crate::CacheEngine::stats).
///
/// `evictions` counts capacity evictions, manual `evict` calls and entries
/// removed by the expiry sweep. An expired entry found by a read is counted
/// as a miss only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a value.
    pub hits: u64,
    /// Reads that found nothing, or found an expired entry.
    pub misses: u64,
    /// Entries removed by the cache itself.
    pub evictions: u64,
}

impl CacheStats {
    /// Total number of reads.
    #[inline]
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of reads that hit, `None` before the first read.
    pub fn hit_rate(&self) -> Option<f64> {
        match self.requests() {
            0 => None,
            total => Some(self.hits as f64 / total as f64),
        }
    }

    #[inline]
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    #[inline]
    pub(crate) fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

/// Result of [`CacheEngine::monitor_performance`](crate::CacheEngine::monitor_performance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceReport {
    /// Hit ratio at the time of the check, `None` before the first read.
    pub hit_ratio: Option<f64>,
    /// Total evictions at the time of the check.
    pub evictions: u64,
    /// The hit ratio is below [`LOW_HIT_RATIO_THRESHOLD`].
    pub low_hit_ratio: bool,
    /// Evictions exceed the configured alarm threshold.
    pub eviction_alarm: bool,
}

impl PerformanceReport {
    /// Evaluates `stats` against the alarm thresholds.
    pub fn evaluate(stats: &CacheStats, eviction_alarm_threshold: u64) -> Self {
        let hit_ratio = stats.hit_rate();
        Self {
            hit_ratio,
            evictions: stats.evictions,
            low_hit_ratio: hit_ratio.map_or(false, |r| r < LOW_HIT_RATIO_THRESHOLD),
            eviction_alarm: stats.evictions > eviction_alarm_threshold,
        }
    }

    /// Returns `true` if no alarm is raised.
    pub fn is_healthy(&self) -> bool {
        !self.low_hit_ratio && !self.eviction_alarm
    }
}

/// Uniform metrics reporting.
///
/// Reports use `BTreeMap` so keys come out in a stable order.
pub trait CacheMetrics {
    /// Returns all metrics as key/value pairs.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Name of the eviction algorithm, for labelling reports.
    fn algorithm_name(&self) -> &'static str;
}
