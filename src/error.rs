//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Absence (a missing key, or a stale entry with `allow_stale` disabled) is
/// never an error; those surface as `None`/`false` return values. Internal
/// list-consistency faults (unlinking a node the list does not own) are bugs,
/// not recoverable errors, and panic instead of appearing here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A time-to-live was negative (construction, `set`, or `set_default_ttl`)
    #[error("TTL must be non-negative, got {0}ms")]
    InvalidTtl(i64),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
