//! API response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Account, PaymentRecord, UserId};
use crate::domain::deposit::{DepositState, PendingDeposit};
use crate::domain::events::OutboundEffect;

/// Effects produced by one inbound event
#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub effects: Vec<OutboundEffect>,
}

/// Response for a single account
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: Account,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoBuyResponse {
    pub user_id: UserId,
    pub auto_buy_enabled: bool,
}

/// Response for payment history
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentsResponse {
    pub payments: Vec<PaymentRecord>,
    pub limit: usize,
}

/// Where the user's deposit conversation currently stands
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositStateResponse {
    pub state: DepositState,
    pub pending: Option<PendingDeposit>,
}
