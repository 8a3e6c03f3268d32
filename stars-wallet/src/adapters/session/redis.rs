//! Redis-backed session store for multi-instance deployments
//!
//! Requires Redis 6.2+ for `GETDEL` and `SET ... GET`. Every operation is a
//! single command, so take/restore are atomic without client-side locking.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;

use crate::config::SessionConfig;
use crate::core::{SessionStore, StorageError, UserId, WalletError, WalletResult};
use crate::domain::deposit::PendingDeposit;

pub struct RedisSessionStore {
    pool: Pool,
    ttl_secs: u64,
    namespace: String,
}

impl RedisSessionStore {
    pub fn new(redis_url: &str, ttl_secs: u64) -> WalletResult<Self> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| WalletError::Storage(StorageError::Cache(e.to_string())))?;

        info!("Redis session store configured");
        Ok(Self {
            pool,
            ttl_secs,
            namespace: "stars_wallet".to_string(),
        })
    }

    pub fn from_config(config: &SessionConfig) -> WalletResult<Self> {
        Self::new(&config.redis_url, config.ttl_secs)
    }

    /// Prefix keys with a custom namespace (used to isolate tests)
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn key(&self, user_id: UserId) -> String {
        format!("{}:deposit:{}", self.namespace, user_id)
    }
}

fn decode(raw: Option<String>) -> WalletResult<Option<PendingDeposit>> {
    raw.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(WalletError::from)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, pending: PendingDeposit) -> WalletResult<Option<PendingDeposit>> {
        let mut conn = self.pool.get().await?;
        let payload = serde_json::to_string(&pending)?;

        let previous: Option<String> = redis::cmd("SET")
            .arg(self.key(pending.user_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .arg("GET")
            .query_async(&mut conn)
            .await?;
        decode(previous)
    }

    async fn get(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key(user_id))
            .query_async(&mut conn)
            .await?;
        decode(raw)
    }

    async fn take(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(self.key(user_id))
            .query_async(&mut conn)
            .await?;
        decode(raw)
    }

    async fn restore(&self, pending: PendingDeposit) -> WalletResult<bool> {
        let mut conn = self.pool.get().await?;
        let payload = serde_json::to_string(&pending)?;

        // NX: a session started after the take wins
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(pending.user_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn clear(&self, user_id: UserId) -> WalletResult<()> {
        let mut conn = self.pool.get().await?;
        redis::cmd("DEL")
            .arg(self.key(user_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> WalletResult<()> {
        let mut conn = self.pool.get().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(WalletError::Storage(StorageError::Cache(format!(
                "unexpected PING reply: {}",
                pong
            ))));
        }
        Ok(())
    }
}
