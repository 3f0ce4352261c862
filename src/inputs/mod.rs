//! Input feeds: record types, loading, and per-stay partitioning.

pub mod partition;
pub mod source;
pub mod timestamp;
pub mod types;
