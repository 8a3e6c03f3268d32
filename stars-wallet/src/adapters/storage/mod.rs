//! Account ledger backends
//!
//! RocksDB is the embedded default; PostgreSQL serves deployments that
//! share one ledger between several bot instances.

pub mod postgres;
pub mod rocksdb;

use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::{AccountStore, WalletResult};

pub use self::postgres::PostgresAccountStore;
pub use self::rocksdb::{ColumnFamilies, RocksAccountStore, RocksDBManager};

/// Build the ledger backend selected in config
pub async fn connect(config: &StorageConfig) -> WalletResult<Arc<dyn AccountStore>> {
    match config.backend {
        StorageBackend::Rocksdb => {
            info!("Using RocksDB account store");
            Ok(Arc::new(RocksAccountStore::open(config.rocksdb.clone())?))
        }
        StorageBackend::Postgres => {
            info!("Using PostgreSQL account store");
            Ok(Arc::new(PostgresAccountStore::connect(&config.postgres).await?))
        }
    }
}
