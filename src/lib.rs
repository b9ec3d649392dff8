//! Recache - A bounded in-memory key/value cache
//!
//! Provides strict LRU eviction under a configurable weight budget, with
//! optional per-entry or cache-wide TTL expiration, disposal callbacks, and
//! dump/load serialization of the live contents.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use cache::{CacheEntry, CacheStats, CacheStore, NodeHandle, RecencyList};
pub use config::{CacheConfig, DisposeFn, WeightFn};
pub use error::{CacheError, Result};
pub use models::DumpRecord;
