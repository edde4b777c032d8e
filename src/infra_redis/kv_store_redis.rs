use crate::domain_port::*;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RedisOptions {
    pub url: String,
    pub connection_timeout: Duration,
    pub response_timeout: Duration,
    pub retries: usize,
}

/// [`KvStore`] over a shared, auto-reconnecting Redis connection.
///
/// Clones share the underlying multiplexed connection; build one per process.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    pub fn new(conn: ConnectionManager) -> Self {
        RedisKvStore { conn }
    }

    pub async fn connect(options: &RedisOptions) -> anyhow::Result<Self> {
        let client = redis::Client::open(options.url.as_str())?;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(options.connection_timeout)
            .set_response_timeout(options.response_timeout)
            .set_number_of_retries(options.retries);
        let conn = client.get_connection_manager_with_config(config).await?;
        info!("redis connected");
        Ok(RedisKvStore::new(conn))
    }
}

fn unavailable(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait::async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(unavailable)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        // SET EX rejects zero.
        let secs = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, secs).await.map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        conn.del(keys.to_vec()).await.map_err(unavailable)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(unavailable)
    }
}
