//! In-memory result cache keyed by `(domain, size)`
//!
//! Bounded by entry count (least recently used entries are evicted first) and
//! optionally by age. Lives for as long as the resolver that owns it.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::models::{ResolutionKey, ResolvedIcon};

#[derive(Debug, Clone)]
struct CacheEntry {
    icon: ResolvedIcon,
    stored_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: LruCache<ResolutionKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Counters reported on the health endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug)]
pub struct ResultCache {
    state: Mutex<CacheState>,
    ttl: Option<Duration>,
}

impl ResultCache {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl)
    }

    /// Cached icon for `key`, refreshing its recency
    ///
    /// Expired entries are dropped and reported as a miss.
    pub async fn get(&self, key: &ResolutionKey) -> Option<ResolvedIcon> {
        let mut state = self.state.lock().await;

        let expired = match state.entries.get(key) {
            Some(entry) => self.is_expired(entry),
            None => {
                state.misses += 1;
                return None;
            }
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            state.entries.pop(key);
            state.evictions += 1;
            state.misses += 1;
            return None;
        }

        state.hits += 1;
        state.entries.get(key).map(|entry| entry.icon.clone())
    }

    /// Cached icon for `key` without touching recency or hit/miss counters
    pub async fn peek(&self, key: &ResolutionKey) -> Option<ResolvedIcon> {
        let mut state = self.state.lock().await;

        let expired = self.is_expired(state.entries.peek(key)?);
        if expired {
            state.entries.pop(key);
            state.evictions += 1;
            return None;
        }

        state.entries.peek(key).map(|entry| entry.icon.clone())
    }

    /// Store `icon` under `key`, replacing any previous entry
    pub async fn insert(&self, key: ResolutionKey, icon: ResolvedIcon) {
        let mut state = self.state.lock().await;
        let entry = CacheEntry {
            icon,
            stored_at: Instant::now(),
        };

        if let Some((evicted_key, _)) = state.entries.push(key.clone(), entry)
            && evicted_key != key
        {
            debug!("Cache evicted least recently used entry: {}", evicted_key);
            state.evictions += 1;
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            size: state.entries.len(),
            capacity: state.entries.cap().get(),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn key(domain: &str, size: u32) -> ResolutionKey {
        ResolutionKey {
            domain: domain.to_string(),
            size,
        }
    }

    fn icon(tag: &'static str) -> ResolvedIcon {
        ResolvedIcon::remote(Bytes::from_static(tag.as_bytes()), "image/png", "https://x/")
    }

    #[tokio::test]
    async fn test_get_after_insert() {
        let cache = ResultCache::new(8, None);
        assert!(cache.get(&key("a.com", 32)).await.is_none());

        cache.insert(key("a.com", 32), icon("a")).await;
        assert_eq!(cache.get(&key("a.com", 32)).await, Some(icon("a")));

        // Size is part of the identity
        assert!(cache.get(&key("a.com", 64)).await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 8);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = ResultCache::new(2, None);
        cache.insert(key("a.com", 32), icon("a")).await;
        cache.insert(key("b.com", 32), icon("b")).await;

        // Touch a so b becomes the eviction victim
        assert!(cache.get(&key("a.com", 32)).await.is_some());
        cache.insert(key("c.com", 32), icon("c")).await;

        assert!(cache.get(&key("a.com", 32)).await.is_some());
        assert!(cache.get(&key("b.com", 32)).await.is_none());
        assert!(cache.get(&key("c.com", 32)).await.is_some());
        assert_eq!(cache.stats().await.evictions, 1);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_replacing_a_key_is_not_an_eviction() {
        let cache = ResultCache::new(1, None);
        cache.insert(key("a.com", 32), icon("a")).await;
        cache.insert(key("a.com", 32), icon("b")).await;

        assert_eq!(cache.get(&key("a.com", 32)).await, Some(icon("b")));
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = ResultCache::new(8, Some(Duration::from_secs(60)));
        cache.insert(key("a.com", 32), icon("a")).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(&key("a.com", 32)).await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key("a.com", 32)).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_peek_leaves_counters_and_recency_alone() {
        let cache = ResultCache::new(2, None);
        cache.insert(key("a.com", 32), icon("a")).await;
        cache.insert(key("b.com", 32), icon("b")).await;

        assert_eq!(cache.peek(&key("a.com", 32)).await, Some(icon("a")));
        assert!(cache.peek(&key("z.com", 32)).await.is_none());

        // a was only peeked, so it is still the eviction victim
        cache.insert(key("c.com", 32), icon("c")).await;
        assert!(cache.peek(&key("a.com", 32)).await.is_none());

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (0, 0));
    }

    #[tokio::test]
    async fn test_zero_capacity_still_holds_one_entry() {
        let cache = ResultCache::new(0, None);
        cache.insert(key("a.com", 32), icon("a")).await;
        assert_eq!(cache.len().await, 1);
    }
}
