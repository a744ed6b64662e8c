//! Cache Entry Type
//!
//! An [`Entry`] is one cached record: the key and value, the access frequency
//! that decides its bucket, the nominal TTL it was written with, its absolute
//! deadline, and the arena links that place it inside its frequency bucket.
//!
//! # Memory Layout
//!
//! Link fields come first because every touch and eviction walks them; the
//! key and value are only read on lookup hits and eviction.
//!
//! ```text
//! ┌──────────────┬──────────────┬───────────┬──────────┬────────────┬─────┬───────┐
//! │ prev: SlotId │ next: SlotId │ frequency │ ttl      │ expires_at │ key │ value │
//! └──────────────┴──────────────┴───────────┴──────────┴────────────┴─────┴───────┘
//! ```
//!
//! # Expiry
//!
//! `expires_at` is absolute. An entry without a TTL never expires; renewing
//! with `None` clears the deadline rather than expiring the entry on the spot.

use core::fmt;
use std::time::{Duration, Instant};

use crate::arena::SlotId;

/// A cache record stored in the frequency index arena.
pub struct Entry<K, V> {
    /// Previous (more recently touched) entry in the same bucket.
    pub(crate) prev: Option<SlotId>,
    /// Next (less recently touched) entry in the same bucket.
    pub(crate) next: Option<SlotId>,
    /// Access frequency; starts at 1 and only grows while the entry lives.
    pub(crate) frequency: u64,
    /// TTL the entry was last written with.
    ttl: Option<Duration>,
    /// Absolute deadline, `None` for entries that never expire.
    expires_at: Option<Instant>,
    /// The cached key.
    pub key: K,
    /// The cached value.
    pub value: V,
}

impl<K, V> Entry<K, V> {
    /// Creates an unlinked entry with the given frequency whose deadline is
    /// `now + ttl`. A deadline past the range of [`Instant`] never expires.
    #[inline]
    pub fn new(key: K, value: V, frequency: u64, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            prev: None,
            next: None,
            frequency,
            ttl,
            expires_at: deadline(now, ttl),
            key,
            value,
        }
    }

    /// Returns the access frequency.
    #[inline]
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Returns the TTL the entry was last written with.
    #[inline]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the absolute deadline, if any.
    #[inline]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Returns `true` iff the entry has a deadline and `now` has reached it.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    /// Time left before the deadline; `None` for entries that never expire,
    /// `Some(Duration::ZERO)` once the deadline has passed.
    #[inline]
    pub fn remaining_ttl(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Restarts the TTL clock at `now`.
    ///
    /// `None` clears the deadline: the entry stops expiring.
    #[inline]
    pub fn renew_ttl(&mut self, ttl: Option<Duration>, now: Instant) {
        self.ttl = ttl;
        self.expires_at = deadline(now, ttl);
    }

    /// Restores a deadline from a snapshot: the nominal TTL is kept while the
    /// deadline is placed `remaining` after `now`.
    #[inline]
    pub(crate) fn restore_deadline(
        &mut self,
        ttl: Option<Duration>,
        remaining: Option<Duration>,
        now: Instant,
    ) {
        self.ttl = ttl;
        self.expires_at = deadline(now, remaining);
    }

    /// Returns `true` if the entry is not linked into any bucket.
    #[inline]
    pub(crate) fn is_unlinked(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}

fn deadline(now: Instant, ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| now.checked_add(ttl))
}

impl<K: Clone, V: Clone> Clone for Entry<K, V> {
    fn clone(&self) -> Self {
        Self {
            prev: self.prev,
            next: self.next,
            frequency: self.frequency,
            ttl: self.ttl,
            expires_at: self.expires_at,
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("frequency", &self.frequency)
            .field("ttl", &self.ttl)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
