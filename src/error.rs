//! Error types for the cache engine.
//!
//! Three families of failure are kept apart so callers can react differently:
//!
//! - **Configuration and input errors** ([`CacheError::Config`],
//!   [`CacheError::Input`]) are rejected synchronously at the call that caused
//!   them and leave the cache untouched.
//! - **Invariant violations** ([`CacheError::Invariant`]) mean the frequency
//!   index no longer agrees with itself. The engine stops trusting its
//!   structure after the first one and answers every later structural
//!   operation with [`CacheError::Poisoned`].
//! - **Snapshot failures** ([`CacheError::Snapshot`]) come from the external
//!   persistence collaborator at `start`/`stop`.
//!
//! Absent keys and expired entries are not errors; they surface as `None` and
//! as misses in [`CacheStats`](crate::metrics::CacheStats).

use std::error::Error as StdError;

/// Boxed error returned by [`SnapshotStore`](crate::snapshot::SnapshotStore)
/// implementations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by the cache engine.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// A configuration value was rejected at construction time.
    #[error("invalid cache configuration: {0}")]
    Config(String),

    /// An operation was called with malformed input.
    #[error("invalid cache input: {0}")]
    Input(String),

    /// An internal invariant of the frequency index was found broken.
    #[error("cache invariant violated: {0}")]
    Invariant(String),

    /// The cache detected an invariant violation earlier and refuses further
    /// structural operations.
    #[error("cache is poisoned by an earlier invariant violation")]
    Poisoned,

    /// The snapshot collaborator failed to load or save.
    #[error("snapshot store failure: {0}")]
    Snapshot(#[source] BoxError),

    /// The background sweeper thread could not be spawned.
    #[error("failed to spawn sweeper thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl CacheError {
    /// Returns `true` for errors that indicate the cache instance can no
    /// longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CacheError::Invariant(_) | CacheError::Poisoned)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
