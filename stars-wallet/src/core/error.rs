//! Centralized error types for the stars wallet

use thiserror::Error;

/// Main wallet error type
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Deposit error: {0}")]
    Deposit(#[from] DepositError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Account not found: {user_id}")]
    AccountNotFound { user_id: i64 },

    #[error("Invalid credit amount: {0}")]
    InvalidCredit(rust_decimal::Decimal),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Session cache error: {0}")]
    Cache(String),

    #[error("RocksDB error: {0}")]
    RocksDB(String),
}

/// Failures of the deposit conversation that are reported back to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    /// Input was not a positive amount the wallet accepts
    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Confirm arrived with nothing to confirm (stale or duplicate)
    #[error("no pending deposit to confirm")]
    NoPendingDeposit,

    /// The ledger could not be credited after the configured retries
    #[error("account store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DepositError {
    /// Stable machine-readable name used by the messaging surface
    pub fn kind(&self) -> ErrorKind {
        match self {
            DepositError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            DepositError::NoPendingDeposit => ErrorKind::NoPendingDeposit,
            DepositError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Error classification carried by outbound error effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    NoPendingDeposit,
    StoreUnavailable,
    AccountNotFound,
    Internal,
}

/// Result type alias for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    /// Whether retrying the same storage call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WalletError::Storage(StorageError::Database(_))
                | WalletError::Storage(StorageError::PoolExhausted)
                | WalletError::Storage(StorageError::Cache(_))
                | WalletError::Storage(StorageError::RocksDB(_))
        )
    }
}

/// Helper to convert sqlx errors
impl From<sqlx::Error> for WalletError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => WalletError::Storage(StorageError::PoolExhausted),
            other => WalletError::Storage(StorageError::Database(other.to_string())),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for WalletError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        WalletError::Storage(StorageError::MigrationFailed(err.to_string()))
    }
}

/// Helper to convert redis errors
impl From<redis::RedisError> for WalletError {
    fn from(err: redis::RedisError) -> Self {
        WalletError::Storage(StorageError::Cache(err.to_string()))
    }
}

impl From<deadpool_redis::PoolError> for WalletError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        WalletError::Storage(StorageError::Cache(err.to_string()))
    }
}

/// Helper to convert rocksdb errors
impl From<rocksdb::Error> for WalletError {
    fn from(err: rocksdb::Error) -> Self {
        WalletError::Storage(StorageError::RocksDB(err.to_string()))
    }
}

/// Helper to convert serialization errors
impl From<bincode::Error> for WalletError {
    fn from(err: bincode::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Serialization(err.to_string())
    }
}
