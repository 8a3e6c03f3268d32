//! Pending-deposit session stores

pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{SessionBackend, SessionConfig};
use crate::core::{SessionStore, WalletResult};

pub use self::memory::InMemorySessionStore;
pub use self::redis::RedisSessionStore;

/// Build the session store selected in config
pub fn build(config: &SessionConfig) -> WalletResult<Arc<dyn SessionStore>> {
    match config.backend {
        SessionBackend::Memory => {
            info!("Keeping pending deposits in process memory");
            Ok(Arc::new(InMemorySessionStore::with_ttl(Duration::from_secs(
                config.ttl_secs,
            ))))
        }
        SessionBackend::Redis => {
            info!("Keeping pending deposits in Redis");
            Ok(Arc::new(RedisSessionStore::from_config(config)?))
        }
    }
}
