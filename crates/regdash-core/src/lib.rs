//! Core library for regdash.
//!
//! Fetches event-registration records from a paginated table API, memoizes
//! the result per endpoint and credentials, and aggregates records into the
//! tables and charts the dashboard shows.
//!
//! - `api`: paginated fetcher with an all-or-nothing `FetchOutcome`
//! - `cache`: in-process `RecordCache` with explicit `clear`
//! - `models`: the `Record` row type
//! - `summary`: gender normalization, age bands, group-by tallies
//! - `snapshot`: CSV exports as an alternate data source
//! - `config`: file + environment configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod snapshot;
pub mod summary;
pub mod utils;

pub use api::{ApiClient, ApiError, FetchOptions, FetchOutcome, Headers};
pub use cache::{CacheKey, CachedData, CachedOutcome, RecordCache};
pub use config::Config;
pub use models::Record;
pub use summary::{AgeBand, GroupTotal, Summary};
