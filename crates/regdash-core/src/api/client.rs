//! Paginated client for the registration table API.
//!
//! The store exposes rows through `limit`/`offset` pagination. `ApiClient`
//! walks every page sequentially and returns the full collection, or a
//! failure with nothing partial attached.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client, RequestBuilder};
use tracing::{debug, error, info};

use crate::models::{
    PageResponse, Record, FIELD_AFFILIATION, FIELD_AGE, FIELD_FULL_NAME, FIELD_GENDER, FIELD_ID,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Rows requested per page.
/// 1000 is the largest limit the table API accepts without clamping.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// HTTP request timeout in seconds.
/// 30s allows for slow table scans while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Columns requested from the store, in request order
pub const DEFAULT_FIELDS: [&str; 5] = [
    FIELD_FULL_NAME,
    FIELD_AFFILIATION,
    FIELD_ID,
    FIELD_AGE,
    FIELD_GENDER,
];

/// Request headers keyed by name. Ordered so equal header sets compare and
/// hash identically regardless of insertion order.
pub type Headers = BTreeMap<String, String>;

/// Knobs for a paginated fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Rows per request; also the end-of-data threshold
    pub page_size: usize,
    /// Columns to select
    pub fields: Vec<String>,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Result of fetching a whole table.
///
/// An empty `Records` means the table has no rows; `Failed` means the fetch
/// was aborted and any pages already received were dropped.
#[derive(Debug)]
pub enum FetchOutcome {
    Records(Vec<Record>),
    Failed(ApiError),
}

impl FetchOutcome {
    /// Records for display. A failed fetch shows as empty.
    pub fn records(&self) -> &[Record] {
        match self {
            FetchOutcome::Records(records) => records,
            FetchOutcome::Failed(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            FetchOutcome::Records(_) => None,
            FetchOutcome::Failed(e) => Some(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// True for a successful fetch of an empty table
    pub fn is_empty_success(&self) -> bool {
        matches!(self, FetchOutcome::Records(records) if records.is_empty())
    }
}

impl From<Result<Vec<Record>, ApiError>> for FetchOutcome {
    fn from(result: Result<Vec<Record>, ApiError>) -> Self {
        match result {
            Ok(records) => FetchOutcome::Records(records),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Drive offset pagination until a short page signals the end of data.
///
/// `fetch_page` receives the offset of the page to load. Pages are requested
/// one at a time; the first error aborts the walk and discards everything
/// collected so far.
pub async fn collect_pages<F, Fut>(page_size: usize, mut fetch_page: F) -> Result<Vec<Record>, ApiError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<Record>, ApiError>>,
{
    if page_size == 0 {
        return Err(ApiError::InvalidPageSize);
    }

    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = fetch_page(offset).await?;
        let page_len = page.len();
        debug!(offset, page_len, "Fetched page");

        // A store that ignores `limit` would make the next offset overlap this page
        if page_len > page_size {
            return Err(ApiError::InvalidResponse(format!(
                "Page at offset {} has {} rows, more than the limit of {}",
                offset, page_len, page_size
            )));
        }

        records.extend(page);
        if page_len < page_size {
            break;
        }
        offset += page_size;
    }

    Ok(records)
}

/// API client for the registration table.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    options: FetchOptions,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(options: FetchOptions) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    fn header_map(headers: &Headers) -> Result<header::HeaderMap, ApiError> {
        let mut map = header::HeaderMap::new();
        for (name, value) in headers {
            let header_name = header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ApiError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let mut header_value =
                header::HeaderValue::from_str(value).map_err(|e| ApiError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            header_value.set_sensitive(true);
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    /// Build the GET request for the page starting at `offset`
    fn page_request(&self, url: &str, headers: &Headers, offset: usize) -> Result<RequestBuilder, ApiError> {
        let limit = self.options.page_size.to_string();
        let offset = offset.to_string();
        let fields = self.options.fields.join(",");

        Ok(self
            .client
            .get(url)
            .headers(Self::header_map(headers)?)
            .query(&[
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
                ("fields", fields.as_str()),
            ]))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Fetch a single page of records
    pub async fn fetch_page(&self, url: &str, headers: &Headers, offset: usize) -> Result<Vec<Record>, ApiError> {
        let response = self.page_request(url, headers, offset)?.send().await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let page: PageResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse page at offset {}: {}", offset, e))
        })?;

        Ok(page.list)
    }

    /// Fetch every page behind `url`, propagating the first error
    pub async fn fetch_all(&self, url: &str, headers: &Headers) -> Result<Vec<Record>, ApiError> {
        // Reject bad headers before the first request rather than on it
        Self::header_map(headers)?;

        collect_pages(self.options.page_size, move |offset| {
            self.fetch_page(url, headers, offset)
        })
        .await
    }

    /// Fetch every page behind `url`. Errors are logged and returned as
    /// `FetchOutcome::Failed`; partial results are never returned.
    pub async fn fetch_records(&self, url: &str, headers: &Headers) -> FetchOutcome {
        match self.fetch_all(url, headers).await {
            Ok(records) => {
                info!(url = url, count = records.len(), "Fetched registration records");
                FetchOutcome::Records(records)
            }
            Err(e) => {
                error!(url = url, error = %e, "Error fetching data");
                FetchOutcome::Failed(e)
            }
        }
    }
}
