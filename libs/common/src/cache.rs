//! Redis access
//!
//! The backend only keeps short-lived markers in Redis (revoked token ids), so
//! the surface is limited to expiring writes, presence checks and removal.

use anyhow::{Context, Result};
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info};

use crate::settings::RedisConfig;

/// Handle to the Redis server; cheap to clone
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Validate the URL and build a client. No connection is opened yet.
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .with_context(|| "Invalid Redis URL".to_string())?;
        info!("Redis client ready for {}", client.get_connection_info().addr);
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }

    /// Store `value` under `key` for `ttl_seconds`
    pub async fn set_expiring(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        // SETEX rejects a zero expiry
        let _: () = conn.set_ex(key, value, ttl_seconds.max(1)).await?;
        debug!("Stored {} for {}s", key, ttl_seconds);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.get(key).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.exists(key).await?)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
