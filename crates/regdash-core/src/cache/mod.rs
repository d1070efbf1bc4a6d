//! In-process memoization of table fetches.
//!
//! `RecordCache` remembers the outcome of each fetch, keyed by URL and
//! headers, for the lifetime of the process. Nothing is written to disk and
//! nothing expires; `clear` is the only way to force a refetch.

pub mod manager;

pub use manager::{CacheKey, CachedData, CachedOutcome, RecordCache};
