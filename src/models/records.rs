//! Dump record DTO
//!
//! Defines the serialized shape of one cache entry, as produced by `dump`
//! and consumed by `load`.

use serde::{Deserialize, Serialize};

/// One serialized cache entry.
///
/// The expiry is an absolute timestamp rather than a relative TTL, so a dump
/// stays valid across a time gap before it is reloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpRecord<K, V> {
    /// The cached key
    pub key: K,
    /// The stored value
    pub value: V,
    /// Absolute expiry timestamp (Unix milliseconds); 0 = never expires
    pub expires_at: i64,
}
