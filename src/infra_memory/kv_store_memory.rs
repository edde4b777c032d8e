use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Minimum clock time between two full sweeps of expired entries.
const SWEEP_INTERVAL_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local [`KvStore`]. Expiry is evaluated against the injected clock:
/// lazily per key on access, and for the whole map at most once a minute on writes.
pub struct MemoryKvStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
    next_sweep_at: AtomicI64,
}

impl MemoryKvStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let next_sweep_at = AtomicI64::new(clock.now().timestamp() + SWEEP_INTERVAL_SECS);
        MemoryKvStore {
            entries: DashMap::new(),
            clock,
            next_sweep_at,
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn sweep_if_due(&self) {
        let now = self.clock.now().timestamp();
        let due = self.next_sweep_at.load(Ordering::Relaxed);
        if now < due {
            return;
        }
        // Only the writer that moves the mark sweeps.
        if self
            .next_sweep_at
            .compare_exchange(due, now + SWEEP_INTERVAL_SECS, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            let removed = self.sweep_expired();
            if removed > 0 {
                debug!(removed, "swept expired entries");
            }
        }
    }

    fn purge_expired(&self, key: &str) {
        let now = self.clock.now();
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
    }

    /// When `key` will expire, if it is live.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.purge_expired(key);
        self.entries.get(key).map(|entry| entry.expires_at)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.sweep_expired();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.purge_expired(key);
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.sweep_if_due();

        // A TTL past the representable range never expires.
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, StoreError> {
        let mut removed = 0;
        for key in keys {
            self.purge_expired(key);
            if self.entries.remove(*key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.purge_expired(key);
        Ok(self.entries.contains_key(key))
    }
}
