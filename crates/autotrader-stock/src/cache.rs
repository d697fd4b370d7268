//! TTL caching for provider data
//!
//! Each data kind gets its own store so the `cache_timeout` configured per
//! provider section applies independently.

use cached::{Cached, TimedCache};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::api::{Candle, FundamentalSnapshot, NewsArticle};
use autotrader_core::AppConfig;

/// Thread-safe store whose entries expire after a fixed TTL
pub struct TtlStore<K, V> {
    inner: Arc<RwLock<TimedCache<K, V>>>,
}

impl<K, V> TtlStore<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut cache = self.inner.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value or run `fetcher` and cache its result
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetcher: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(?key, "cache hit");
            return Ok(value);
        }
        tracing::debug!(?key, "cache miss");

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    pub async fn invalidate(&self, key: &K) {
        let mut cache = self.inner.write().await;
        let _ = cache.cache_remove(key);
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.inner.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Clone for TtlStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// The three provider caches, keyed by symbol
pub struct DataCaches {
    pub market: TtlStore<String, Vec<Candle>>,
    pub fundamentals: TtlStore<String, FundamentalSnapshot>,
    pub news: TtlStore<String, Vec<NewsArticle>>,
}

impl DataCaches {
    /// TTLs come from each section's `cache_timeout`
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            market: TtlStore::new(config.market_data.cache_ttl()),
            fundamentals: TtlStore::new(config.fundamental_data.cache_ttl()),
            news: TtlStore::new(config.news_data.cache_ttl()),
        }
    }

    pub async fn clear_all(&self) {
        self.market.clear().await;
        self.fundamentals.clear().await;
        self.news.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(symbol: &str, close: f64) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
            adjclose: close,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store: TtlStore<String, Vec<Candle>> = TtlStore::new(Duration::from_secs(60));
        store
            .insert("EQNR.OL".to_string(), vec![candle("EQNR.OL", 300.0)])
            .await;

        let hit = store.get(&"EQNR.OL".to_string()).await.unwrap();
        assert_eq!(hit.len(), 1);
        assert!(store.get(&"DNB.OL".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_fetch_only_fetches_once() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(60));
        let mut calls = 0;

        let value = store
            .get_or_fetch("key".to_string(), || {
                calls += 1;
                async { Ok::<_, String>(7) }
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls, 1);

        let value = store
            .get_or_fetch("key".to_string(), || {
                calls += 1;
                async { Ok::<_, String>(9) }
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(60));

        let err = store
            .get_or_fetch("key".to_string(), || async {
                Err::<u32, _>("boom".to_string())
            })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(60));
        store.insert("a".to_string(), 1).await;
        store.insert("b".to_string(), 2).await;
        assert_eq!(store.len().await, 2);

        store.invalidate(&"a".to_string()).await;
        assert!(store.get(&"a".to_string()).await.is_none());

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_caches_from_config_ttls() {
        let config = AppConfig::default();
        let caches = DataCaches::from_config(&config);
        caches
            .fundamentals
            .insert("EQNR.OL".to_string(), FundamentalSnapshot::empty("EQNR.OL"))
            .await;
        assert_eq!(caches.fundamentals.len().await, 1);
        caches.clear_all().await;
        assert!(caches.fundamentals.is_empty().await);
    }
}
