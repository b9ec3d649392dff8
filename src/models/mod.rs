//! Data transfer models
//!
//! Serde-serializable shapes exchanged with callers.

mod records;

// Re-export public types
pub use records::DumpRecord;
