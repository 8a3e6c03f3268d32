//! Adapters layer - Infrastructure implementations
//!
//! Implementations of the ports defined in the core layer: the account
//! ledger backends and the pending-deposit session stores.

pub mod session;
pub mod storage;

// Re-export commonly used adapters
pub use session::{InMemorySessionStore, RedisSessionStore};
pub use storage::{PostgresAccountStore, RocksAccountStore};
