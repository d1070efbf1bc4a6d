//! REST client for the registration table store.
//!
//! This module provides the `ApiClient` that walks the store's
//! `limit`/`offset` pagination and returns the complete record set.
//!
//! The store authenticates with a static API token sent as a request
//! header (`xc-token` by default).

pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{
    collect_pages, ApiClient, FetchOptions, FetchOutcome, Headers, DEFAULT_FIELDS,
    DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::ApiError;
