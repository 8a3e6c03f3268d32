//! Core trait abstractions (ports between the wallet and its backends)

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::error::WalletResult;
use super::types::*;
use crate::domain::commission::DepositQuote;
use crate::domain::deposit::PendingDeposit;

/// Durable per-user account ledger.
///
/// Every mutation is atomic at the store layer: callers never read a
/// balance and write it back themselves.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a zero-balance account on first contact, otherwise return the
    /// existing record untouched (display name included)
    async fn get_or_create(&self, user_id: UserId, display_name: &str) -> WalletResult<Account>;

    /// Fetch an account if it exists
    async fn get_account(&self, user_id: UserId) -> WalletResult<Option<Account>>;

    /// Atomically add a non-negative amount to the balance
    async fn credit(&self, user_id: UserId, amount: Decimal) -> WalletResult<Account>;

    /// Atomically credit `quote.net` and append the matching payment record
    async fn apply_deposit(&self, user_id: UserId, quote: &DepositQuote) -> WalletResult<DepositReceipt>;

    /// Current balance
    async fn get_balance(&self, user_id: UserId) -> WalletResult<Decimal>;

    /// Atomically flip the auto-buy flag, returning the new value
    async fn toggle_auto_buy(&self, user_id: UserId) -> WalletResult<bool>;

    /// Most recent payment records, newest first
    async fn list_payments(&self, user_id: UserId, limit: usize) -> WalletResult<Vec<PaymentRecord>>;

    /// Health check
    async fn health_check(&self) -> WalletResult<()>;
}

/// Owner of the ephemeral per-user deposit conversation state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace whatever is pending for the user, returning the previous entry
    async fn put(&self, pending: PendingDeposit) -> WalletResult<Option<PendingDeposit>>;

    /// Read the pending deposit without consuming it
    async fn get(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>>;

    /// Atomically remove and return the pending deposit.
    ///
    /// Two concurrent takes for the same user never both see the entry.
    async fn take(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>>;

    /// Put back a deposit taken earlier unless a newer one exists.
    /// Returns whether the entry was restored.
    async fn restore(&self, pending: PendingDeposit) -> WalletResult<bool>;

    /// Drop any pending deposit for the user
    async fn clear(&self, user_id: UserId) -> WalletResult<()>;

    /// Health check
    async fn health_check(&self) -> WalletResult<()>;
}
