//! System load sampling for the adaptive sweep interval.
//!
//! The sweep shortens its interval when the host is busy. [`SystemLoad`]
//! reads the one-minute load average from `/proc/loadavg`; hosts without it
//! report zero load, which leaves the interval driven by fill ratio alone.
//! [`FixedLoad`] returns a constant sample and is what tests use.

use core::fmt;
use std::num::NonZeroUsize;
use std::thread;

use tracing::debug;

/// One reading of host load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    /// One-minute load average.
    pub load_average: f64,
    /// Number of logical CPUs.
    pub cpu_cores: usize,
}

impl LoadSample {
    /// An idle single-core host.
    pub const IDLE: LoadSample = LoadSample {
        load_average: 0.0,
        cpu_cores: 1,
    };

    /// Load average divided by core count.
    ///
    /// Zero cores is treated as one. The result is not clamped; a value of 1
    /// or more means every core is busy.
    pub fn normalized(&self) -> f64 {
        self.load_average / self.cpu_cores.max(1) as f64
    }
}

/// Source of [`LoadSample`]s.
///
/// Sampled once per sweep tick, outside the cache lock.
pub trait LoadSource: Send + Sync + fmt::Debug {
    /// Takes a sample.
    fn sample(&self) -> LoadSample;
}

/// Reads the host's load average and core count.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoad;

impl SystemLoad {
    fn load_average() -> Option<f64> {
        let raw = std::fs::read_to_string("/proc/loadavg").ok()?;
        raw.split_whitespace().next()?.parse().ok()
    }
}

impl LoadSource for SystemLoad {
    fn sample(&self) -> LoadSample {
        let cpu_cores = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let load_average = Self::load_average().unwrap_or_else(|| {
            debug!("load average unavailable, assuming idle host");
            0.0
        });
        LoadSample {
            load_average,
            cpu_cores,
        }
    }
}

/// Constant load, for tests and deterministic deployments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLoad(pub LoadSample);

impl LoadSource for FixedLoad {
    fn sample(&self) -> LoadSample {
        self.0
    }
}
