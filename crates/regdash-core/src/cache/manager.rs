use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::{ApiClient, FetchOutcome, Headers};

#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Identity of a fetch: the endpoint plus every header sent with it.
///
/// Two fetches share an entry only if URL and all header values (the API
/// token included) match exactly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub headers: Headers,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, headers: Headers) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }
}

// Header values carry the API token; keep them out of logs.
impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        f.debug_struct("CacheKey")
            .field("url", &self.url)
            .field("headers", &names)
            .finish()
    }
}

pub type CachedOutcome = Arc<CachedData<FetchOutcome>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CachedOutcome>,
    /// Bumped by every `clear`; fetches started under an older generation
    /// are not stored.
    generation: u64,
}

/// In-memory memo of fetch outcomes, keyed by `CacheKey`.
///
/// Entries never expire. Failed fetches are stored like successful ones and
/// served until `clear` is called.
#[derive(Default)]
pub struct RecordCache {
    state: Mutex<CacheState>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The map stays consistent even if a holder panicked, so poisoning is ignored
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedOutcome> {
        self.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Return the stored outcome for `key`, running `fetch` on a miss.
    ///
    /// The lock is not held while `fetch` runs. If `clear` is called before
    /// `fetch` finishes, the outcome is returned to this caller but not stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> CachedOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        let generation = {
            let state = self.lock();
            if let Some(hit) = state.entries.get(key) {
                debug!(key = ?key, "Record cache hit");
                return hit.clone();
            }
            state.generation
        };

        debug!(key = ?key, "Record cache miss");
        let cached = Arc::new(CachedData::new(fetch().await));

        let mut state = self.lock();
        if state.generation == generation {
            state.entries.insert(key.clone(), cached.clone());
        } else {
            debug!(key = ?key, "Cache cleared while fetching, not storing result");
        }
        cached
    }

    /// Fetch through `api`, memoized by URL and headers
    pub async fn fetch_records(&self, api: &ApiClient, url: &str, headers: &Headers) -> CachedOutcome {
        let key = CacheKey::new(url, headers.clone());
        self.get_or_fetch(&key, move || api.fetch_records(url, headers))
            .await
    }

    /// Drop every entry. The next fetch for any key goes to the network.
    pub fn clear(&self) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.generation += 1;
        info!(dropped, "Cleared record cache");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{page_body, serve};
    use crate::api::{ApiError, FetchOptions};
    use crate::models::Record;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(token: &str) -> CacheKey {
        let mut headers = Headers::new();
        headers.insert("accept".to_string(), "application/json".to_string());
        headers.insert("xc-token".to_string(), token.to_string());
        CacheKey::new("https://db.example.com/records", headers)
    }

    fn records(n: usize) -> FetchOutcome {
        FetchOutcome::Records(vec![Record::default(); n])
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(cached.age_display(), "1d ago");

        cached.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }

    #[tokio::test]
    async fn test_hit_does_not_refetch() {
        let cache = RecordCache::new();
        let calls = &AtomicUsize::new(0);
        let k = key("secret");

        let first = cache
            .get_or_fetch(&k, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                records(3)
            })
            .await;
        let second = cache
            .get_or_fetch(&k, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                records(99)
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.data.records().len(), 3);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let cache = RecordCache::new();
        let calls = &AtomicUsize::new(0);
        let k = key("secret");
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            records(2)
        };

        cache.get_or_fetch(&k, fetch).await;
        assert!(cache.contains(&k));

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&k).is_none());

        cache.get_or_fetch(&k, fetch).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_is_global() {
        let cache = RecordCache::new();
        cache.get_or_fetch(&key("a"), || async { records(1) }).await;
        cache.get_or_fetch(&key("b"), || async { records(1) }).await;
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(!cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
    }

    #[tokio::test]
    async fn test_token_is_part_of_the_key() {
        let cache = RecordCache::new();
        let calls = &AtomicUsize::new(0);
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            records(1)
        };

        cache.get_or_fetch(&key("old-token"), fetch).await;
        cache.get_or_fetch(&key("new-token"), fetch).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_cached_until_clear() {
        let cache = RecordCache::new();
        let calls = &AtomicUsize::new(0);
        let k = key("secret");
        let failing = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            FetchOutcome::Failed(ApiError::Unauthorized)
        };

        let first = cache.get_or_fetch(&k, failing).await;
        let second = cache.get_or_fetch(&k, || async { records(5) }).await;

        assert!(first.data.is_failed());
        assert!(second.data.is_failed());
        assert!(second.data.records().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.clear();
        let third = cache.get_or_fetch(&k, || async { records(5) }).await;
        assert_eq!(third.data.records().len(), 5);
    }

    #[tokio::test]
    async fn test_clear_during_fetch_keeps_stale_result_out() {
        let cache = &RecordCache::new();
        let k = key("secret");

        let outcome = cache
            .get_or_fetch(&k, move || async move {
                cache.clear();
                records(4)
            })
            .await;

        assert_eq!(outcome.data.records().len(), 4);
        assert!(!cache.contains(&k));

        // The next fetch after the clear is stored normally
        cache.get_or_fetch(&k, || async { records(1) }).await;
        assert!(cache.contains(&k));
    }

    #[test]
    fn test_cache_key_debug_redacts_header_values() {
        let rendered = format!("{:?}", key("super-secret-token"));
        assert!(rendered.contains("xc-token"));
        assert!(rendered.contains("db.example.com"));
        assert!(!rendered.contains("super-secret-token"));
    }

    #[test]
    fn test_header_order_does_not_affect_key() {
        let mut a = Headers::new();
        a.insert("xc-token".to_string(), "t".to_string());
        a.insert("accept".to_string(), "application/json".to_string());
        let mut b = Headers::new();
        b.insert("accept".to_string(), "application/json".to_string());
        b.insert("xc-token".to_string(), "t".to_string());

        assert_eq!(CacheKey::new("u", a), CacheKey::new("u", b));
    }

    #[tokio::test]
    async fn test_fetch_records_through_client_hits_network_once() {
        let (url, handled) = serve(6, |offset| ("200 OK", page_body(offset, 25, 10)));
        let api = ApiClient::new(FetchOptions {
            page_size: 10,
            ..Default::default()
        })
        .expect("client");
        let cache = RecordCache::new();
        let headers = key("secret").headers;

        let first = cache.fetch_records(&api, &url, &headers).await;
        assert_eq!(first.data.records().len(), 25);
        assert_eq!(handled.load(Ordering::SeqCst), 3);

        let second = cache.fetch_records(&api, &url, &headers).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(handled.load(Ordering::SeqCst), 3);

        cache.clear();
        let third = cache.fetch_records(&api, &url, &headers).await;
        assert_eq!(third.data.records().len(), 25);
        assert_eq!(handled.load(Ordering::SeqCst), 6);
    }
}
