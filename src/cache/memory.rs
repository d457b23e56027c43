use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::Cache;
use crate::errors::EngineError;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache backend on a concurrent map, with per-entry TTLs and
/// lazy eviction on read. Used in tests and single-node deployments.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all expired entries. Eviction is otherwise lazy on read, so
    /// entries that are written but never read again stay resident until
    /// this is called.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() < entry.expires_at {
                return Ok(Some(entry.value.clone()));
            }
            // expired: drop the ref before removing
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), EngineError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), EngineError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, EngineError> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - self.entries.len()) as u64)
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        cache.del("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_evict_expired_reclaims_unread_entries() {
        let cache = MemoryCache::new();
        cache.set("stale", "v", 0).await.unwrap();
        cache.set("fresh", "v", 60).await.unwrap();
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = MemoryCache::new();
        cache.set("pattern:a:1", "x", 60).await.unwrap();
        cache.set("pattern:a:2", "y", 60).await.unwrap();
        cache.set("benchmark:a", "z", 60).await.unwrap();
        let removed = cache.invalidate_prefix("pattern:a:").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
    }
}
