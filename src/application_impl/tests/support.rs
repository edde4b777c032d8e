use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new("test-signing-key", TimeDelta::minutes(15), TimeDelta::hours(720)).unwrap()
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub memory: Arc<MemoryKvStore>,
    pub codec: Arc<JwtHs256Codec>,
    pub sessions: Arc<RealSessionManager>,
}

pub fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(start_time()));
    let memory = Arc::new(MemoryKvStore::new(clock.clone()));
    harness_over(clock, memory.clone(), memory)
}

/// Session manager whose store is `store`, with `memory` being what it eventually writes to.
pub fn harness_over(
    clock: Arc<ManualClock>,
    memory: Arc<MemoryKvStore>,
    store: Arc<dyn KvStore>,
) -> Harness {
    let cfg = jwt_config();
    let codec = Arc::new(JwtHs256Codec::new(&cfg, clock.clone()));
    let sessions = Arc::new(RealSessionManager::new(
        &cfg,
        codec.clone(),
        store,
        clock.clone(),
    ));
    Harness {
        clock,
        memory,
        codec,
        sessions,
    }
}

/// Counts writes passing through to the inner store.
pub struct CountingStore {
    pub inner: Arc<dyn KvStore>,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        CountingStore {
            inner,
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl KvStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(keys).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }
}

/// Fails the `fail_on`-th write (1-based) and every one after it.
pub struct FailingWritesStore {
    pub inner: Arc<dyn KvStore>,
    pub fail_on: usize,
    calls: AtomicUsize,
}

impl FailingWritesStore {
    pub fn new(inner: Arc<dyn KvStore>, fail_on: usize) -> Self {
        FailingWritesStore {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl KvStore for FailingWritesStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_on {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, StoreError> {
        self.inner.delete(keys).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }
}

/// Every call errors as if the store were down.
pub struct DownStore;

#[async_trait::async_trait]
impl KvStore for DownStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _keys: &[&str]) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Every call hangs forever, like a black-holed connection.
pub struct StalledStore;

#[async_trait::async_trait]
impl KvStore for StalledStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        std::future::pending().await
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn delete(&self, _keys: &[&str]) -> Result<u64, StoreError> {
        std::future::pending().await
    }

    async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
        std::future::pending().await
    }
}

/// Reversible stand-in for Argon2 so service tests stay fast.
pub struct PlainHasher;

#[async_trait::async_trait]
impl CredentialHasher for PlainHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        Ok(password_hash.strip_prefix("plain:") == Some(password))
    }
}

/// [`PlainHasher`] that counts how often each direction runs.
#[derive(Default)]
pub struct CountingHasher {
    pub hashes: AtomicUsize,
    pub verifies: AtomicUsize,
}

#[async_trait::async_trait]
impl CredentialHasher for CountingHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        PlainHasher.hash_password(password).await
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        PlainHasher.verify_password(password, password_hash).await
    }
}
