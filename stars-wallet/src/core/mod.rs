//! Core domain abstractions and types
//!
//! Foundational types, ports and error definitions. Nothing in here knows
//! about a specific storage engine or transport.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{DepositError, ErrorKind, StorageError, WalletError, WalletResult};
pub use traits::{AccountStore, SessionStore};
pub use types::{Account, AccountPolicy, DepositReceipt, PaymentRecord, UserId};
