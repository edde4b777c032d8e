use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("conflicting record")]
    Conflict,
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Networked key-value store with per-key expiry.
///
/// Every method is a single atomic round trip. Implementations carry their
/// own connection-level timeouts; request-level cancellation is layered on
/// top through [`RequestContext`](crate::domain_port::RequestContext).
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, expiring after `ttl`. Overwrites any previous value and TTL.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove every listed key. Returns how many keys actually existed.
    async fn delete(&self, keys: &[&str]) -> Result<u64, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}
