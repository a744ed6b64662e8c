//! Configuration for the cache engine.
//!
//! [`CacheConfig`] is a plain struct with public fields. Start from
//! [`CacheConfig::default`] (or [`CacheConfig::new`] for a given capacity) and
//! adjust fields directly or through the `with_*` setters. The engine validates
//! the configuration once in [`CacheEngine::new`](crate::CacheEngine::new);
//! nothing is re-checked on the hot path.
//!
//! # Examples
//!
//! ```
//! use freqcache::config::CacheConfig;
//! use std::time::Duration;
//!
//! let config = CacheConfig::new(1_000)
//!     .with_default_ttl(Some(Duration::from_secs(60)))
//!     .with_base_sweep_interval(Duration::from_secs(5));
//! assert!(config.validate().is_ok());
//!
//! // Probabilities outside [0, 1] are rejected
//! let bad = CacheConfig::new(10).with_early_expiration(0.2, 1.5);
//! assert!(bad.validate().is_err());
//! ```

use core::fmt;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default number of entries the cache holds.
pub const DEFAULT_MAX_SIZE: usize = 5000;

/// Default base interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Default lower bound for the adaptive sweep interval.
pub const DEFAULT_MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Default fraction of an entry's TTL during which early expiration applies.
pub const DEFAULT_EARLY_EXPIRATION_WINDOW: f64 = 0.2;

/// Default probability of expiring an entry inside the early window.
pub const DEFAULT_EARLY_EXPIRATION_PROBABILITY: f64 = 0.5;

/// Default number of arena slots scanned per sweep lock acquisition.
pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 1024;

/// Default eviction count above which `monitor_performance` raises an alarm.
pub const DEFAULT_EVICTION_ALARM_THRESHOLD: u64 = 100;

/// Configuration for a [`CacheEngine`](crate::CacheEngine).
///
/// # Fields
///
/// - `max_size`: maximum number of live entries; `0` disables the cache
///   (every write becomes a no-op)
/// - `default_ttl`: TTL applied by `put`/`mset` when no explicit TTL is given;
///   `None` means entries never expire
/// - `base_sweep_interval`: the interval the adaptive sweep scales down from
/// - `min_sweep_interval`: the floor for the adaptive interval
/// - `early_expiration_window`: fraction of an entry's TTL, counted back from
///   its deadline, inside which reads may expire it early
/// - `early_expiration_probability`: probability of such an early expiry
/// - `sweep_batch_size`: arena slots scanned per lock acquisition while sweeping
/// - `eviction_alarm_threshold`: evictions above which `monitor_performance`
///   warns
#[derive(Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries; `0` disables writes.
    pub max_size: usize,
    /// TTL used when an operation does not supply one.
    pub default_ttl: Option<Duration>,
    /// Base interval of the background sweep.
    pub base_sweep_interval: Duration,
    /// Lower clamp for the adaptive sweep interval.
    pub min_sweep_interval: Duration,
    /// Early-expiration window as a fraction of the entry TTL, in `[0, 1]`.
    pub early_expiration_window: f64,
    /// Early-expiration probability, in `[0, 1]`.
    pub early_expiration_probability: f64,
    /// Number of arena slots scanned per sweep batch.
    pub sweep_batch_size: usize,
    /// Eviction count that triggers a performance warning.
    pub eviction_alarm_threshold: u64,
}

impl CacheConfig {
    /// Creates a configuration with the given capacity and default settings
    /// for everything else.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the base sweep interval.
    pub fn with_base_sweep_interval(mut self, interval: Duration) -> Self {
        self.base_sweep_interval = interval;
        self
    }

    /// Sets the minimum sweep interval.
    pub fn with_min_sweep_interval(mut self, interval: Duration) -> Self {
        self.min_sweep_interval = interval;
        self
    }

    /// Sets the early-expiration window and probability.
    pub fn with_early_expiration(mut self, window: f64, probability: f64) -> Self {
        self.early_expiration_window = window;
        self.early_expiration_probability = probability;
        self
    }

    /// Disables probabilistic early expiration.
    pub fn without_early_expiration(self) -> Self {
        self.with_early_expiration(0.0, 0.0)
    }

    /// Sets the number of arena slots scanned per sweep batch.
    pub fn with_sweep_batch_size(mut self, batch: usize) -> Self {
        self.sweep_batch_size = batch;
        self
    }

    /// Sets the eviction alarm threshold.
    pub fn with_eviction_alarm_threshold(mut self, threshold: u64) -> Self {
        self.eviction_alarm_threshold = threshold;
        self
    }

    /// Returns `true` if this configuration disables the cache.
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.max_size == 0
    }

    /// Checks every field, returning [`CacheError::Config`] for the first
    /// invalid one.
    pub fn validate(&self) -> Result<()> {
        if self.base_sweep_interval.is_zero() {
            return Err(CacheError::Config(
                "base_sweep_interval must be greater than zero".into(),
            ));
        }
        if self.min_sweep_interval.is_zero() {
            return Err(CacheError::Config(
                "min_sweep_interval must be greater than zero".into(),
            ));
        }
        if self.min_sweep_interval > self.base_sweep_interval {
            return Err(CacheError::Config(format!(
                "min_sweep_interval ({:?}) exceeds base_sweep_interval ({:?})",
                self.min_sweep_interval, self.base_sweep_interval
            )));
        }
        if matches!(self.default_ttl, Some(ttl) if ttl.is_zero()) {
            return Err(CacheError::Config(
                "default_ttl must be greater than zero when set".into(),
            ));
        }
        check_fraction("early_expiration_window", self.early_expiration_window)?;
        check_fraction(
            "early_expiration_probability",
            self.early_expiration_probability,
        )?;
        if self.sweep_batch_size == 0 {
            return Err(CacheError::Config(
                "sweep_batch_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CacheError::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: None,
            base_sweep_interval: DEFAULT_SWEEP_INTERVAL,
            min_sweep_interval: DEFAULT_MIN_SWEEP_INTERVAL,
            early_expiration_window: DEFAULT_EARLY_EXPIRATION_WINDOW,
            early_expiration_probability: DEFAULT_EARLY_EXPIRATION_PROBABILITY,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
            eviction_alarm_threshold: DEFAULT_EVICTION_ALARM_THRESHOLD,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("base_sweep_interval", &self.base_sweep_interval)
            .field("min_sweep_interval", &self.min_sweep_interval)
            .field("early_expiration_window", &self.early_expiration_window)
            .field(
                "early_expiration_probability",
                &self.early_expiration_probability,
            )
            .field("sweep_batch_size", &self.sweep_batch_size)
            .field("eviction_alarm_threshold", &self.eviction_alarm_threshold)
            .finish()
    }
}
