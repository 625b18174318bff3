//! In-memory query cache. Entries never expire on their own; they are marked
//! stale by `invalidate` after a mutation and refetched on the next read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::Movie;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Movies,
    CurrentUser,
}

impl QueryKey {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKey::Movies => "movies",
            QueryKey::CurrentUser => "user",
        }
    }
}

struct Entry<V> {
    value: Arc<V>,
    stale: bool,
    fetched_at: Instant,
}

pub struct QueryCache<V> {
    entries: Mutex<HashMap<QueryKey, Entry<V>>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }
}

impl<V> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value if present and not invalidated.
    pub fn fresh(&self, key: QueryKey) -> Option<Arc<V>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).filter(|e| !e.stale).map(|e| e.value.clone())
    }

    /// Last known value, stale or not.
    pub fn snapshot(&self, key: QueryKey) -> Option<Arc<V>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).map(|e| e.value.clone())
    }

    pub fn store(&self, key: QueryKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Entry { value: value.clone(), stale: false, fetched_at: Instant::now() });
        value
    }

    pub fn invalidate(&self, key: QueryKey) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(e) = entries.get_mut(&key) {
            debug!(key = key.as_str(), age_ms = e.fetched_at.elapsed().as_millis() as u64, "invalidated");
            e.stale = true;
        }
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, key: QueryKey) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).map_or(true, |e| e.stale)
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Anything that can produce the full movie list.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn fetch_movies(&self) -> Result<Vec<Movie>, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("login required")]
    RequiresLogin,
    #[error(transparent)]
    Failed(ApiError),
}

impl From<ApiError> for CatalogError {
    fn from(e: ApiError) -> Self {
        if e.requires_login() { CatalogError::RequiresLogin } else { CatalogError::Failed(e) }
    }
}

/// The movie list behind the fixed `movies` key.
pub struct Catalog<S> {
    source: S,
    cache: QueryCache<Vec<Movie>>,
}

impl<S: MovieSource> Catalog<S> {
    pub fn new(source: S) -> Self {
        Self { source, cache: QueryCache::new() }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get_movies(&self) -> Result<Arc<Vec<Movie>>, CatalogError> {
        if let Some(movies) = self.cache.fresh(QueryKey::Movies) {
            return Ok(movies);
        }
        match self.source.fetch_movies().await {
            Ok(movies) => {
                debug!(count = movies.len(), "catalog refreshed");
                Ok(self.cache.store(QueryKey::Movies, movies))
            }
            Err(e) => {
                warn!("catalog refresh failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn snapshot(&self) -> Option<Arc<Vec<Movie>>> {
        self.cache.snapshot(QueryKey::Movies)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate(QueryKey::Movies);
    }

    pub fn is_stale(&self) -> bool {
        self.cache.is_stale(QueryKey::Movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        calls: AtomicUsize,
        outcomes: Mutex<Vec<Result<Vec<Movie>, ApiError>>>,
    }

    impl FakeSource {
        fn new(outcomes: Vec<Result<Vec<Movie>, ApiError>>) -> Self {
            Self { calls: AtomicUsize::new(0), outcomes: Mutex::new(outcomes) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MovieSource for FakeSource {
        async fn fetch_movies(&self) -> Result<Vec<Movie>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() { Ok(Vec::new()) } else { outcomes.remove(0) }
        }
    }

    fn movies(ids: &[i64]) -> Vec<Movie> {
        ids.iter().map(|&id| Movie { id, title: format!("m{}", id), ..Movie::default() }).collect()
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let catalog = Catalog::new(FakeSource::new(vec![Ok(movies(&[1, 2]))]));
        assert_eq!(catalog.get_movies().await.unwrap().len(), 2);
        assert_eq!(catalog.get_movies().await.unwrap().len(), 2);
        assert_eq!(catalog.source().calls(), 1);
        assert!(!catalog.is_stale());
    }

    #[tokio::test]
    async fn unauthorized_list_requires_login_and_caches_nothing() {
        let catalog = Catalog::new(FakeSource::new(vec![Err(ApiError::AuthenticationRequired)]));
        assert_eq!(catalog.get_movies().await, Err(CatalogError::RequiresLogin));
        assert!(catalog.snapshot().is_none());
        assert!(catalog.is_stale());
    }

    #[tokio::test]
    async fn invalidate_after_delete_refetches() {
        let catalog = Catalog::new(FakeSource::new(vec![Ok(movies(&[1, 2, 3])), Ok(movies(&[1, 3]))]));
        catalog.get_movies().await.unwrap();
        catalog.invalidate();
        assert!(catalog.is_stale());
        let ids: Vec<i64> = catalog.get_movies().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(catalog.source().calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_snapshot() {
        let catalog = Catalog::new(FakeSource::new(vec![
            Ok(movies(&[7])),
            Err(ApiError::Network("offline".into())),
        ]));
        catalog.get_movies().await.unwrap();
        catalog.invalidate();
        assert_eq!(catalog.get_movies().await, Err(CatalogError::Failed(ApiError::Network("offline".into()))));
        assert_eq!(catalog.snapshot().map(|m| m[0].id), Some(7));
        assert!(catalog.is_stale());
    }

    #[test]
    fn query_cache_keys_are_independent() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.store(QueryKey::CurrentUser, 5);
        cache.invalidate(QueryKey::Movies);
        assert_eq!(cache.fresh(QueryKey::CurrentUser).as_deref(), Some(&5));
        cache.invalidate(QueryKey::CurrentUser);
        assert!(cache.fresh(QueryKey::CurrentUser).is_none());
        assert_eq!(cache.snapshot(QueryKey::CurrentUser).as_deref(), Some(&5));
        cache.clear();
        assert!(cache.snapshot(QueryKey::CurrentUser).is_none());
    }
}
