//! Stars Wallet Library
//!
//! Balance bookkeeping for a chat-bot "stars wallet": per-user accounts
//! with an auto-buy flag, and a deposit conversation that charges a
//! commission before atomically crediting the ledger.

pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod metrics;
pub mod services;

// Re-export commonly used types
pub use config::WalletConfig;
pub use crate::core::{Account, AccountStore, DepositError, SessionStore, WalletError, WalletResult};
pub use domain::{CommissionPolicy, DepositQuote, DepositWorkflow, InboundEvent, OutboundEffect};
pub use infrastructure::ServiceContainer;
pub use services::WalletService;
