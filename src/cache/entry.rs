//! Cache Entry Module
//!
//! Defines the record stored per cache key, with weight and TTL metadata.

use chrono::Utc;

// == Cache Entry ==
/// A single cached record: application data plus the bookkeeping the
/// eviction and staleness logic needs.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The cached key (the lookup index holds its own copy)
    pub key: K,
    /// The stored value
    pub value: V,
    /// Computed cost counted against the cache capacity
    pub weight: u64,
    /// Insertion timestamp (Unix milliseconds); refreshed on overwrite and,
    /// optionally, on read
    pub inserted_at: i64,
    /// TTL in milliseconds resolved at set time; 0 means "no TTL was in
    /// effect", which falls back to the cache-wide default at check time
    pub ttl_ms: i64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(key: K, value: V, weight: u64, ttl_ms: i64) -> Self {
        Self {
            key,
            value,
            weight,
            inserted_at: now_millis(),
            ttl_ms,
        }
    }

    // == Effective TTL ==
    /// Resolves the TTL governing this entry: its own if positive, else the
    /// cache-wide default.
    pub fn effective_ttl_ms(&self, default_ttl_ms: i64) -> i64 {
        if self.ttl_ms > 0 {
            self.ttl_ms
        } else {
            default_ttl_ms
        }
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived its effective TTL.
    ///
    /// Boundary condition: an entry is stale only when the elapsed time is
    /// strictly greater than the TTL; an entry read exactly at its TTL is
    /// still fresh. A zero effective TTL means the entry never goes stale.
    pub fn is_stale(&self, now_ms: i64, default_ttl_ms: i64) -> bool {
        let ttl = self.effective_ttl_ms(default_ttl_ms);
        if ttl <= 0 {
            return false;
        }
        now_ms - self.inserted_at > ttl
    }

    // == Expires At ==
    /// Returns the absolute expiry timestamp (Unix milliseconds), or 0 when
    /// the entry never expires. This is the value serialized by `dump`.
    pub fn expires_at(&self, default_ttl_ms: i64) -> i64 {
        let ttl = self.effective_ttl_ms(default_ttl_ms);
        if ttl <= 0 {
            0
        } else {
            self.inserted_at + ttl
        }
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
