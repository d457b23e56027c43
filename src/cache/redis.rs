use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::Cache;
use crate::errors::EngineError;

/// Networked cache backend on Redis. The `ConnectionManager` reconnects
/// transparently; individual command failures surface as infrastructure
/// errors for the caller to propagate.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| EngineError::cache("cache.get", e))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| EngineError::cache("cache.set", e))
    }

    async fn del(&self, key: &str) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| EngineError::cache("cache.del", e))
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, EngineError> {
        // SCAN instead of KEYS so a large keyspace does not block the server.
        let mut scan_conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter: redis::AsyncIter<String> = scan_conn
                .scan_match(&pattern)
                .await
                .map_err(|e| EngineError::cache("cache.invalidate_prefix", e))?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        conn.del::<_, u64>(keys)
            .await
            .map_err(|e| EngineError::cache("cache.invalidate_prefix", e))
    }

    async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}
