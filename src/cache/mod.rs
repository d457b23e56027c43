pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::errors::EngineError;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

/// Narrow cache-store interface so the backing store (in-process vs
/// networked) is swappable without touching analytics logic.
///
/// Values are JSON strings; serialization stays with the callers. The store
/// provides a staleness bound (TTL) but no read-after-write consistency
/// across concurrent callers.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), EngineError>;
    async fn del(&self, key: &str) -> Result<(), EngineError>;
    /// Removes every key starting with `prefix`; returns the number removed.
    async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, EngineError>;
    async fn ping(&self) -> bool;
}

/// Reads and JSON-decodes a cached value. An entry that no longer decodes
/// (stale schema) is dropped and treated as a miss, not a fault.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, EngineError> {
    match cache.get(key).await? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "Discarding undecodable cache entry");
                cache.del(key).await?;
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// JSON-encodes and stores a value with the given TTL.
pub async fn put_json<T: Serialize>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), EngineError> {
    let raw =
        serde_json::to_string(value).map_err(|e| EngineError::serialization("cache.put", e))?;
    cache.set(key, &raw, ttl_secs).await
}

/// Deterministic cache keys, shared by every service so invalidation by
/// prefix stays reliable.
pub mod keys {
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn branch_part(branch_id: Option<Uuid>) -> String {
        branch_id.map_or_else(|| "all".into(), |b| b.to_string())
    }

    pub fn pattern(item_id: Uuid, branch_id: Option<Uuid>) -> String {
        format!("pattern:{item_id}:{}", branch_part(branch_id))
    }

    pub fn anomalies(item_id: Uuid, branch_id: Option<Uuid>) -> String {
        format!("anomalies:{item_id}:{}", branch_part(branch_id))
    }

    pub fn price_variance(item_id: Uuid, vendor_id: Option<Uuid>) -> String {
        format!(
            "price_variance:{item_id}:{}",
            vendor_id.map_or_else(|| "all".into(), |v| v.to_string())
        )
    }

    pub fn benchmark(item_id: Uuid) -> String {
        format!("benchmark:{item_id}")
    }

    pub fn branch_spending(start: NaiveDate, end: NaiveDate, item_id: Option<Uuid>) -> String {
        format!(
            "branch_spending:{start}:{end}:{}",
            item_id.map_or_else(|| "all".into(), |i| i.to_string())
        )
    }

    pub fn consolidation() -> String {
        "consolidation:all".into()
    }

    pub fn item_prefixes(item_id: Uuid) -> [String; 4] {
        [
            format!("pattern:{item_id}:"),
            format!("anomalies:{item_id}:"),
            format!("price_variance:{item_id}:"),
            format!("benchmark:{item_id}"),
        ]
    }
}
