//! Configuration Module
//!
//! Construction options for the cache and the pluggable callback types.

use std::fmt;

use chrono::Duration;

use crate::error::{CacheError, Result};

// == Callback Types ==
/// Per-entry weight function: `(value, key) -> weight`.
///
/// The returned weight counts against the cache capacity (e.g. a byte size).
/// When no weight function is configured every entry weighs 1, so capacity
/// is an entry count.
pub type WeightFn<K, V> = Box<dyn Fn(&V, &K) -> u64 + Send>;

/// Disposal callback: `(key, value)`, invoked exactly once per entry removal
/// (eviction, expiry, explicit delete, overwrite, reset).
///
/// Runs synchronously inside the triggering call and must not re-enter the
/// cache; doing so is a usage error.
pub type DisposeFn<K, V> = Box<dyn FnMut(&K, &V) + Send>;

// == Cache Config ==
/// Construction options for a [`CacheStore`](crate::cache::CacheStore).
///
/// All options have usable defaults: an unbounded cache with no expiry, no
/// weight function (constant weight 1) and no disposal callback.
pub struct CacheConfig<K, V> {
    /// Maximum total weight across all live entries; 0 means unbounded
    pub capacity: u64,
    /// Cache-wide TTL; zero disables expiry unless an entry sets its own
    pub default_ttl: Duration,
    /// Return expired values instead of treating them as misses
    pub allow_stale: bool,
    /// Refresh an entry's freshness timer on every successful `get`
    pub update_age_on_get: bool,
    /// Suppress the dispose callback when `set` overwrites a live key
    pub no_dispose_on_overwrite: bool,
    /// Per-entry weight function; `None` means constant weight 1
    pub weight_fn: Option<WeightFn<K, V>>,
    /// Callback invoked on every entry removal
    pub dispose: Option<DisposeFn<K, V>>,
}

impl<K, V> CacheConfig<K, V> {
    // == Constructor ==
    /// Creates a configuration with all defaults (same as `Default`).
    pub fn new() -> Self {
        Self::default()
    }

    // == Builder Setters ==
    /// Sets the maximum total weight (0 = unbounded).
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the cache-wide default TTL (zero = never expire).
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Expired entries are returned to `get`/`peek` callers instead of
    /// being treated as absent.
    pub fn with_allow_stale(mut self, allow_stale: bool) -> Self {
        self.allow_stale = allow_stale;
        self
    }

    /// A successful `get` resets the entry's freshness timer.
    pub fn with_update_age_on_get(mut self, update: bool) -> Self {
        self.update_age_on_get = update;
        self
    }

    /// Overwriting a live key does not invoke the dispose callback.
    pub fn with_no_dispose_on_overwrite(mut self, suppress: bool) -> Self {
        self.no_dispose_on_overwrite = suppress;
        self
    }

    /// Installs a per-entry weight function.
    pub fn with_weight_fn<F>(mut self, weight_fn: F) -> Self
    where
        F: Fn(&V, &K) -> u64 + Send + 'static,
    {
        self.weight_fn = Some(Box::new(weight_fn));
        self
    }

    /// Installs a disposal callback.
    pub fn with_dispose<F>(mut self, dispose: F) -> Self
    where
        F: FnMut(&K, &V) + Send + 'static,
    {
        self.dispose = Some(Box::new(dispose));
        self
    }

    // == Validation ==
    /// Checks the configuration for invalid values.
    ///
    /// The only rejectable option is a negative default TTL; capacity and
    /// weights are unsigned and cannot go negative.
    pub fn validate(&self) -> Result<()> {
        let ttl_ms = self.default_ttl.num_milliseconds();
        if ttl_ms < 0 {
            return Err(CacheError::InvalidTtl(ttl_ms));
        }
        Ok(())
    }
}

impl<K, V> Default for CacheConfig<K, V> {
    fn default() -> Self {
        Self {
            capacity: 0,
            default_ttl: Duration::zero(),
            allow_stale: false,
            update_age_on_get: false,
            no_dispose_on_overwrite: false,
            weight_fn: None,
            dispose: None,
        }
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("allow_stale", &self.allow_stale)
            .field("update_age_on_get", &self.update_age_on_get)
            .field("no_dispose_on_overwrite", &self.no_dispose_on_overwrite)
            .field("weight_fn", &self.weight_fn.as_ref().map(|_| ".."))
            .field("dispose", &self.dispose.as_ref().map(|_| ".."))
            .finish()
    }
}
