//! Cache Store Module
//!
//! Main cache engine combining an index map with the recency list, weight
//! accounting, TTL staleness checks, and LRU eviction.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::Duration;
use tracing::debug;

use crate::cache::entry::{now_millis, CacheEntry};
use crate::cache::list::{NodeHandle, RecencyList};
use crate::cache::CacheStats;
use crate::config::{CacheConfig, DisposeFn, WeightFn};
use crate::error::{CacheError, Result};
use crate::models::DumpRecord;

/// A configured capacity of zero disables the bound.
fn normalize_capacity(capacity: u64) -> u64 {
    if capacity == 0 {
        u64::MAX
    } else {
        capacity
    }
}

// == Cache Store ==
/// Bounded key/value store ordered by recency of use.
///
/// Every mutating or reading operation locates the entry through the index
/// in O(1), repositions it in the recency list in O(1), then re-evaluates
/// the capacity budget. Staleness is checked lazily on access; there are no
/// background timers, so an expired entry keeps counting against capacity
/// until an operation reaches it.
///
/// The store performs no locking. Callers that share it across threads must
/// serialize access themselves (e.g. one lock around the whole store). The
/// dispose callback runs synchronously inside the triggering call and must
/// not re-enter the store.
pub struct CacheStore<K, V> {
    /// Key → node handle lookup (keys unique)
    index: HashMap<K, NodeHandle>,
    /// Entries ordered head=most-recently-used … tail=least-recently-used
    list: RecencyList<CacheEntry<K, V>>,
    /// Running sum of all linked entries' weights
    total_weight: u64,
    /// Maximum total weight (normalized; `u64::MAX` = unbounded)
    capacity: u64,
    /// Cache-wide TTL in milliseconds; 0 = never expire
    default_ttl_ms: i64,
    /// Return expired values instead of treating them as misses
    allow_stale: bool,
    /// Successful reads refresh the freshness timer
    update_age_on_get: bool,
    /// Overwrites skip the dispose callback
    no_dispose_on_overwrite: bool,
    /// Per-entry weight strategy; `None` = constant weight 1
    weight_fn: Option<WeightFn<K, V>>,
    /// Invoked once per entry removal
    dispose: Option<DisposeFn<K, V>>,
    /// Performance counters
    stats: CacheStats,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore from a validated configuration.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidTtl` if the configured default TTL is
    /// negative.
    pub fn new(config: CacheConfig<K, V>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            index: HashMap::new(),
            list: RecencyList::new(),
            total_weight: 0,
            capacity: normalize_capacity(config.capacity),
            default_ttl_ms: config.default_ttl.num_milliseconds(),
            allow_stale: config.allow_stale,
            update_age_on_get: config.update_age_on_get,
            no_dispose_on_overwrite: config.no_dispose_on_overwrite,
            weight_fn: config.weight_fn,
            dispose: config.dispose,
            stats: CacheStats::new(),
        })
    }

    // == Set ==
    /// Stores a key-value pair with an optional per-entry TTL.
    ///
    /// The effective TTL is the override when positive, else the cache-wide
    /// default, resolved now and kept on the entry. An existing key is
    /// updated in place (disposing the old value unless suppressed) and
    /// marked most-recently-used; a new key is pushed to the head. Either
    /// way the cache is trimmed back to capacity afterwards.
    ///
    /// Returns `Ok(false)` without storing when the entry's weight alone
    /// exceeds the capacity; an existing entry under that key is removed.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidTtl` if `ttl` is negative.
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) -> Result<bool> {
        let override_ms = match ttl {
            Some(ttl) => {
                let ms = ttl.num_milliseconds();
                if ms < 0 {
                    return Err(CacheError::InvalidTtl(ms));
                }
                ms
            }
            None => 0,
        };

        Ok(self.set_resolved(key, value, override_ms))
    }

    /// Insertion logic shared by `set` and `load`; `override_ms` has been
    /// validated as non-negative.
    fn set_resolved(&mut self, key: K, value: V, override_ms: i64) -> bool {
        let effective_ttl_ms = if override_ms > 0 {
            override_ms
        } else {
            self.default_ttl_ms
        };
        let weight = self.compute_weight(&value, &key);

        if let Some(&handle) = self.index.get(&key) {
            if weight > self.capacity {
                // Oversized update: the slot is vacated, nothing is stored.
                let old = self.remove_node(handle);
                self.dispose_entry(&old);
                debug!(
                    "rejected oversized update: weight={} capacity={}",
                    weight, self.capacity
                );
                return false;
            }

            let old_value;
            let old_weight;
            {
                let entry = self.list.get_mut(handle);
                old_weight = entry.weight;
                old_value = std::mem::replace(&mut entry.value, value);
                entry.weight = weight;
                entry.ttl_ms = effective_ttl_ms;
                entry.inserted_at = now_millis();
            }
            self.total_weight = self.total_weight - old_weight + weight;

            if !self.no_dispose_on_overwrite {
                if let Some(dispose) = self.dispose.as_mut() {
                    dispose(&key, &old_value);
                }
            }

            // A freshly written entry is never stale; just mark it used.
            self.list.move_to_front(handle);
            self.trim();
            return true;
        }

        if weight > self.capacity {
            // Oversized entries fall out of the cache without being stored.
            if let Some(dispose) = self.dispose.as_mut() {
                dispose(&key, &value);
            }
            debug!(
                "rejected oversized insert: weight={} capacity={}",
                weight, self.capacity
            );
            return false;
        }

        let entry = CacheEntry::new(key.clone(), value, weight, effective_ttl_ms);
        let handle = self.list.push_front(entry);
        self.index.insert(key, handle);
        self.total_weight += weight;
        self.trim();
        true
    }

    // == Get ==
    /// Retrieves a value by key, marking it most-recently-used.
    ///
    /// A stale entry is removed and disposed unless `allow_stale` is set, in
    /// which case the expired value is returned as-is (without eviction or a
    /// recency update) and the caller is responsible for discarding it.
    /// This is the only read that reorders the recency list.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let handle = match self.index.get(key) {
            Some(&handle) => handle,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        let now = now_millis();
        if self.list.get(handle).is_stale(now, self.default_ttl_ms) {
            self.stats.record_miss();
            if self.allow_stale {
                return Some(&self.list.get(handle).value);
            }
            let entry = self.remove_node(handle);
            self.dispose_entry(&entry);
            self.stats.record_expiration();
            debug!("dropped expired entry on read");
            return None;
        }

        if self.update_age_on_get {
            self.list.get_mut(handle).inserted_at = now;
        }
        self.list.move_to_front(handle);
        self.stats.record_hit();
        Some(&self.list.get(handle).value)
    }

    // == Peek ==
    /// Retrieves a value by key without affecting its recency.
    ///
    /// Staleness handling matches `get`; the hit/miss counters are not
    /// touched. Used for introspection that must not bias eviction order.
    pub fn peek(&mut self, key: &K) -> Option<&V> {
        let handle = *self.index.get(key)?;

        let now = now_millis();
        if self.list.get(handle).is_stale(now, self.default_ttl_ms) {
            if self.allow_stale {
                return Some(&self.list.get(handle).value);
            }
            let entry = self.remove_node(handle);
            self.dispose_entry(&entry);
            self.stats.record_expiration();
            return None;
        }

        Some(&self.list.get(handle).value)
    }

    // == Has ==
    /// Returns true iff the key is present and not stale. Never mutates
    /// state and never disposes.
    pub fn has(&self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&handle) => {
                let entry = self.list.get(handle);
                !entry.is_stale(now_millis(), self.default_ttl_ms)
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes and disposes the entry if present. Returns whether an entry
    /// was removed; deleting an absent key is a no-op, not an error.
    pub fn delete(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&handle) => {
                let entry = self.remove_node(handle);
                self.dispose_entry(&entry);
                true
            }
            None => false,
        }
    }

    // == Pop ==
    /// Removes and returns the least-recently-used entry without invoking
    /// the dispose callback; the caller takes ownership. Used to drain the
    /// cache under caller control.
    pub fn pop(&mut self) -> Option<(K, V)> {
        let tail = self.list.back()?;
        let entry = self.remove_node(tail);
        Some((entry.key, entry.value))
    }

    // == Prune ==
    /// Removes every stale entry, regardless of the `allow_stale` policy.
    /// Proactive cleanup independent of access patterns.
    pub fn prune(&mut self) {
        let now = now_millis();
        let mut cursor = self.list.front();
        while let Some(handle) = cursor {
            // Snapshot the neighbor before a removal invalidates the handle.
            cursor = self.list.next(handle);
            if self.list.get(handle).is_stale(now, self.default_ttl_ms) {
                let entry = self.remove_node(handle);
                self.dispose_entry(&entry);
                self.stats.record_expiration();
            }
        }
    }

    // == Dump ==
    /// Serializes all currently fresh entries, most-recently-used first.
    /// Stale entries are silently excluded, not evicted.
    pub fn dump(&self) -> Vec<DumpRecord<K, V>>
    where
        V: Clone,
    {
        let now = now_millis();
        self.list
            .iter()
            .filter(|entry| !entry.is_stale(now, self.default_ttl_ms))
            .map(|entry| DumpRecord {
                key: entry.key.clone(),
                value: entry.value.clone(),
                expires_at: entry.expires_at(self.default_ttl_ms),
            })
            .collect()
    }

    // == Load ==
    /// Resets the cache and replays `records` oldest-first (dumps list the
    /// newest entry first), reproducing the dumped recency order. Records
    /// whose absolute expiry has already passed are skipped; records without
    /// an expiry are inserted with no explicit TTL.
    pub fn load(&mut self, records: Vec<DumpRecord<K, V>>) {
        self.reset();

        let now = now_millis();
        for record in records.into_iter().rev() {
            if record.expires_at == 0 {
                self.set_resolved(record.key, record.value, 0);
            } else {
                let remaining_ms = record.expires_at - now;
                if remaining_ms > 0 {
                    self.set_resolved(record.key, record.value, remaining_ms);
                }
            }
        }
    }

    // == Reset ==
    /// Disposes every entry in recency order (when a dispose callback is
    /// configured), then clears the index, the list, and the weight sum.
    /// The only bulk-teardown path; counters survive.
    pub fn reset(&mut self) {
        while let Some(entry) = self.list.pop_front() {
            if let Some(dispose) = self.dispose.as_mut() {
                dispose(&entry.key, &entry.value);
            }
        }
        self.index.clear();
        self.list.clear();
        self.total_weight = 0;
        debug!("cache reset");
    }

    // == Set Capacity ==
    /// Changes the maximum total weight (0 = unbounded) and immediately
    /// evicts down to the new budget.
    pub fn set_capacity(&mut self, capacity: u64) {
        self.capacity = normalize_capacity(capacity);
        debug!("capacity changed: capacity={}", self.capacity);
        self.trim();
    }

    // == Set Default TTL ==
    /// Changes the cache-wide TTL and re-runs eviction. Already-linked
    /// entries keep their resolved TTL; only entries that deferred to the
    /// default pick up the new value, lazily, at their next staleness check.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidTtl` if `ttl` is negative.
    pub fn set_default_ttl(&mut self, ttl: Duration) -> Result<()> {
        let ttl_ms = ttl.num_milliseconds();
        if ttl_ms < 0 {
            return Err(CacheError::InvalidTtl(ttl_ms));
        }
        self.default_ttl_ms = ttl_ms;
        self.trim();
        Ok(())
    }

    // == Set Weight Function ==
    /// Swaps the weight strategy (`None` restores constant weight 1),
    /// recomputes every entry's weight, rebuilds the weight sum from
    /// scratch, then evicts down to capacity.
    pub fn set_weight_fn(&mut self, weight_fn: Option<WeightFn<K, V>>) {
        self.weight_fn = weight_fn;
        self.total_weight = 0;

        let mut cursor = self.list.front();
        while let Some(handle) = cursor {
            cursor = self.list.next(handle);
            let weight = {
                let entry = self.list.get(handle);
                match &self.weight_fn {
                    Some(weight_fn) => weight_fn(&entry.value, &entry.key),
                    None => 1,
                }
            };
            self.list.get_mut(handle).weight = weight;
            self.total_weight += weight;
        }

        debug!("weight function changed: total_weight={}", self.total_weight);
        self.trim();
    }

    // == Introspection ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the running sum of all live entries' weights.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Returns the maximum total weight (`u64::MAX` when unbounded).
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns all keys, most-recently-used first. Includes entries whose
    /// expiry has not been observed yet; iteration never expires.
    pub fn keys(&self) -> Vec<K> {
        self.list.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Returns all values, most-recently-used first.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.list.iter().map(|entry| entry.value.clone()).collect()
    }

    /// Lazy iteration over `(key, value)` pairs, most-recently-used first.
    /// Does not touch recency and does not expire entries.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.list.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    // == Internals ==
    /// Evicts tail entries until the weight sum fits the capacity budget.
    fn trim(&mut self) {
        while self.total_weight > self.capacity {
            let tail = match self.list.back() {
                Some(tail) => tail,
                None => break,
            };
            let entry = self.remove_node(tail);
            self.dispose_entry(&entry);
            self.stats.record_eviction();
            debug!(
                "evicted least recently used entry: weight={} total_weight={}",
                entry.weight, self.total_weight
            );
        }
    }

    /// Unlinks, unindexes, and un-weights an entry. Disposal is left to the
    /// caller: `pop` hands the entry over undisposed.
    fn remove_node(&mut self, handle: NodeHandle) -> CacheEntry<K, V> {
        let entry = self.list.remove(handle);
        self.index.remove(&entry.key);
        self.total_weight -= entry.weight;
        entry
    }

    fn dispose_entry(&mut self, entry: &CacheEntry<K, V>) {
        if let Some(dispose) = self.dispose.as_mut() {
            dispose(&entry.key, &entry.value);
        }
    }

    fn compute_weight(&self, value: &V, key: &K) -> u64 {
        match &self.weight_fn {
            Some(weight_fn) => weight_fn(value, key),
            None => 1,
        }
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("total_weight", &self.total_weight)
            .field("stats", &self.stats)
            .finish()
    }
}
