//! Eviction Policy
//!
//! Decides what leaves the cache and when the next background sweep runs.
//!
//! # Capacity eviction
//!
//! [`EvictionPolicy::evict_lfu`] removes the tail of the lowest non-empty
//! frequency bucket: the least frequently used entry, and among equals the
//! one touched longest ago.
//!
//! # Adaptive sweep interval
//!
//! After each sweep the next interval is
//!
//! ```text
//! interval = base × (1 − fill_ratio − load / cores)
//! ```
//!
//! clamped to `[min_interval, base]`. A full cache or a busy host sweeps more
//! often; the lower clamp keeps the sweeper from spinning when the factor
//! reaches zero or goes negative.
//!
//! # Early expiration
//!
//! A read that finds an entry in the last `window × ttl` of its life treats
//! it as expired with probability `probability`. Spreading refreshes over
//! that window keeps many readers from missing on the same key at the same
//! instant.

use core::fmt::Debug;
use core::hash::{BuildHasher, Hash};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::index::FrequencyIndex;
use crate::load::LoadSample;

/// Eviction, expiry and sweep scheduling rules derived from a [`CacheConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvictionPolicy {
    base_interval: Duration,
    min_interval: Duration,
    window: f64,
    probability: f64,
    batch_size: usize,
}

impl EvictionPolicy {
    /// Builds the policy from a validated configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            base_interval: config.base_sweep_interval,
            min_interval: config.min_sweep_interval,
            window: config.early_expiration_window,
            probability: config.early_expiration_probability,
            batch_size: config.sweep_batch_size.max(1),
        }
    }

    /// Interval used before the first sweep has run.
    #[inline]
    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// Number of arena slots examined per lock acquisition during a sweep.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Computes the interval until the next sweep.
    pub fn next_interval(&self, len: usize, max_size: usize, load: LoadSample) -> Duration {
        let fill_ratio = if max_size == 0 {
            0.0
        } else {
            len as f64 / max_size as f64
        };
        let factor = 1.0 - fill_ratio - load.normalized();
        let secs = self.base_interval.as_secs_f64() * factor;
        if !secs.is_finite() || secs <= self.min_interval.as_secs_f64() {
            return self.min_interval;
        }
        if secs >= self.base_interval.as_secs_f64() {
            return self.base_interval;
        }
        Duration::from_secs_f64(secs)
    }

    /// Decides whether a live entry close to its deadline should be treated
    /// as expired on this read.
    ///
    /// Entries without a TTL are never expired early.
    pub fn should_expire_early<K, V, R>(&self, entry: &Entry<K, V>, now: Instant, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        if self.window <= 0.0 || self.probability <= 0.0 {
            return false;
        }
        let (Some(ttl), Some(remaining)) = (entry.ttl(), entry.remaining_ttl(now)) else {
            return false;
        };
        remaining < ttl.mul_f64(self.window) && rng.gen_bool(self.probability)
    }

    /// Removes up to `count` entries in LFU order; returns how many were
    /// removed.
    pub fn evict_lfu<K, V, S>(&self, index: &mut FrequencyIndex<K, V, S>, count: usize) -> Result<usize>
    where
        K: Hash + Eq + Clone + Debug,
        S: BuildHasher,
    {
        let mut evicted = 0;
        while evicted < count {
            match index.pop_lfu()? {
                Some((key, _)) => {
                    debug!(key = ?key, "evicted least frequently used entry");
                    evicted += 1;
                }
                None => break,
            }
        }
        Ok(evicted)
    }

    /// Expires every entry past its deadline in the slot range
    /// `start..start + batch_size`; returns how many were removed.
    pub fn expire_batch<K, V, S>(
        &self,
        index: &mut FrequencyIndex<K, V, S>,
        start: usize,
        now: Instant,
    ) -> Result<usize>
    where
        K: Hash + Eq + Clone + Debug,
        S: BuildHasher,
    {
        let expired = index.expired_in_range(start, start.saturating_add(self.batch_size), now);
        for &id in &expired {
            let (key, _) = index.detach(id)?;
            debug!(key = ?key, "expired entry removed by sweep");
        }
        Ok(expired.len())
    }
}
