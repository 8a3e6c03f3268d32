//! Core ledger types shared by every storage backend

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// External chat platform user id
pub type UserId = i64;

/// Per-user auto-buy policy bounds.
///
/// These are carried as opaque configuration; nothing in the wallet
/// validates them against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPolicy {
    pub min_price: i64,
    pub max_price: i64,
    pub max_per_drop: i64,
    pub min_drop_size: i64,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            min_price: 5,
            max_price: 50,
            max_per_drop: 3,
            min_drop_size: 20,
        }
    }
}

/// Wallet account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub display_name: String,
    pub balance: Decimal,
    pub auto_buy_enabled: bool,
    pub policy: AccountPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Fresh zero-balance account with default settings
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            display_name: display_name.into(),
            balance: Decimal::ZERO,
            auto_buy_enabled: true,
            policy: AccountPolicy::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only audit row written for every confirmed deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub user_id: UserId,
    pub gross_amount: Decimal,
    pub commission: Decimal,
    pub net_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Result of an applied deposit: the updated account and its audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub account: Account,
    pub payment: PaymentRecord,
}
