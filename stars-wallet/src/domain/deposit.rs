//! Deposit conversation state machine
//!
//! ```text
//! Idle --initiate--> AwaitingAmount --valid amount--> AwaitingConfirmation
//!                        ^   |                               |
//!                        +---+ invalid amount                +--confirm--> Idle (credited)
//! any state --cancel / navigate away--> Idle
//! ```
//!
//! Idle is represented by the absence of a [`PendingDeposit`] in the
//! session store. Confirmation takes the pending deposit out of the store
//! before touching the ledger, so a duplicate confirm racing the first one
//! finds nothing and cannot credit twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::commission::{CommissionPolicy, DepositQuote};
use super::events::{DepositEvent, OutboundEffect};
use crate::config::DepositConfig;
use crate::core::{
    AccountStore, DepositError, DepositReceipt, ErrorKind, SessionStore, UserId, WalletError,
    WalletResult,
};
use crate::metrics::WalletMetrics;

/// Stage of an in-flight deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStage {
    AwaitingAmount,
    AwaitingConfirmation,
}

/// Ephemeral per-user deposit request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeposit {
    pub user_id: UserId,
    pub stage: DepositStage,
    /// Present once an amount was accepted
    pub quote: Option<DepositQuote>,
    pub created_at: DateTime<Utc>,
}

impl PendingDeposit {
    pub fn awaiting_amount(user_id: UserId) -> Self {
        Self {
            user_id,
            stage: DepositStage::AwaitingAmount,
            quote: None,
            created_at: Utc::now(),
        }
    }

    /// Same deposit with an accepted amount, ready for confirmation
    pub fn with_quote(self, quote: DepositQuote) -> Self {
        Self {
            stage: DepositStage::AwaitingConfirmation,
            quote: Some(quote),
            ..self
        }
    }
}

/// Conversation state of one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositState {
    Idle,
    AwaitingAmount,
    AwaitingConfirmation,
}

impl From<Option<&PendingDeposit>> for DepositState {
    fn from(pending: Option<&PendingDeposit>) -> Self {
        match pending.map(|p| p.stage) {
            None => DepositState::Idle,
            Some(DepositStage::AwaitingAmount) => DepositState::AwaitingAmount,
            Some(DepositStage::AwaitingConfirmation) => DepositState::AwaitingConfirmation,
        }
    }
}

/// Bounded retry of ledger credits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(200),
        }
    }
}

/// Outcome of starting a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initiated {
    /// A previous unfinished deposit was discarded
    pub replaced: bool,
}

/// Drives the per-user deposit conversation
pub struct DepositWorkflow {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
    policy: CommissionPolicy,
    retry: RetryPolicy,
    metrics: Arc<WalletMetrics>,
}

impl DepositWorkflow {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        policy: CommissionPolicy,
        retry: RetryPolicy,
        metrics: Arc<WalletMetrics>,
    ) -> Self {
        Self {
            accounts,
            sessions,
            policy,
            retry,
            metrics,
        }
    }

    /// Build from the `[deposit]` config section
    pub fn from_config(
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        config: &DepositConfig,
        metrics: Arc<WalletMetrics>,
    ) -> Self {
        let retry = RetryPolicy {
            attempts: config.credit_retry_attempts,
            delay: Duration::from_millis(config.credit_retry_delay_ms),
        };
        Self::new(accounts, sessions, CommissionPolicy::from_config(config), retry, metrics)
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    /// Current conversation state for a user
    pub async fn state(&self, user_id: UserId) -> WalletResult<DepositState> {
        let pending = self.sessions.get(user_id).await?;
        Ok(DepositState::from(pending.as_ref()))
    }

    /// Pending deposit for a user, if any
    pub async fn pending(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>> {
        self.sessions.get(user_id).await
    }

    /// Idle/any -> AwaitingAmount. Replaces an unfinished deposit.
    pub async fn initiate(&self, user_id: UserId) -> WalletResult<Initiated> {
        if self.accounts.get_account(user_id).await?.is_none() {
            return Err(WalletError::AccountNotFound { user_id });
        }

        let previous = self.sessions.put(PendingDeposit::awaiting_amount(user_id)).await?;
        self.metrics.deposit_initiated();

        let replaced = previous.is_some();
        if replaced {
            debug!(user_id, "Deposit re-initiated, previous pending deposit discarded");
        } else {
            debug!(user_id, "Deposit initiated");
        }
        Ok(Initiated { replaced })
    }

    /// AwaitingAmount/AwaitingConfirmation -> AwaitingConfirmation on a valid
    /// amount. Invalid input leaves the pending deposit as it was.
    pub async fn submit_amount(&self, user_id: UserId, raw_text: &str) -> WalletResult<DepositQuote> {
        let pending = self
            .sessions
            .get(user_id)
            .await?
            .ok_or(DepositError::NoPendingDeposit)?;

        let amount = match self.policy.parse_amount(raw_text) {
            Ok(amount) => amount,
            Err(e) => {
                self.metrics.invalid_amount();
                warn!(user_id, input = raw_text, "Rejected deposit amount: {}", e);
                return Err(e.into());
            }
        };

        let quote = self.policy.quote(amount);
        self.sessions.put(pending.with_quote(quote)).await?;

        debug!(
            user_id,
            amount = %quote.amount,
            commission = %quote.commission,
            net = %quote.net,
            "Deposit awaiting confirmation"
        );
        Ok(quote)
    }

    /// AwaitingConfirmation -> Idle, crediting the ledger exactly once.
    ///
    /// On store failure the pending deposit is put back so the user can
    /// confirm again without re-entering the amount.
    pub async fn confirm(&self, user_id: UserId) -> WalletResult<DepositReceipt> {
        // Consume first: a concurrent duplicate confirm now sees nothing.
        let Some(pending) = self.sessions.take(user_id).await? else {
            self.metrics.stale_confirm();
            return Err(DepositError::NoPendingDeposit.into());
        };

        let Some(quote) = pending.quote else {
            self.metrics.stale_confirm();
            debug!(user_id, "Confirm received before an amount was entered");
            return Err(DepositError::NoPendingDeposit.into());
        };

        match self.credit_with_retry(user_id, &quote).await {
            Ok(receipt) => {
                self.metrics.deposit_confirmed(quote.net);
                info!(
                    user_id,
                    payment_id = receipt.payment.id,
                    net = %quote.net,
                    commission = %quote.commission,
                    balance = %receipt.account.balance,
                    "Deposit credited"
                );
                Ok(receipt)
            }
            Err(e) if e.is_transient() => {
                self.metrics.store_failure();
                let restored = self.sessions.restore(pending).await.unwrap_or_else(|re| {
                    error!(user_id, "Failed to restore pending deposit: {}", re);
                    false
                });
                error!(user_id, restored, "Deposit credit failed: {}", e);
                Err(DepositError::StoreUnavailable(e.to_string()).into())
            }
            Err(e) => {
                error!(user_id, "Deposit credit rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Any -> Idle. Returns whether a pending deposit was discarded.
    pub async fn cancel(&self, user_id: UserId) -> WalletResult<bool> {
        let discarded = self.sessions.take(user_id).await?.is_some();
        if discarded {
            self.metrics.deposit_cancelled();
            debug!(user_id, "Pending deposit discarded");
        }
        Ok(discarded)
    }

    async fn credit_with_retry(&self, user_id: UserId, quote: &DepositQuote) -> WalletResult<DepositReceipt> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.accounts.apply_deposit(user_id, quote).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(user_id, attempt, "Credit attempt failed, retrying: {}", e);
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run one deposit event and render the effects for the surface
    pub async fn handle(&self, event: &DepositEvent) -> Vec<OutboundEffect> {
        let user_id = event.user_id();
        match event {
            DepositEvent::InitiateDeposit { .. } => match self.initiate(user_id).await {
                Ok(initiated) => {
                    let mut effects = Vec::with_capacity(2);
                    if initiated.replaced {
                        effects.push(OutboundEffect::Notice {
                            text: "Your previous unfinished deposit was discarded.".to_string(),
                        });
                    }
                    effects.push(OutboundEffect::prompt(self.amount_prompt()));
                    effects
                }
                Err(e) => vec![error_effect(&e)],
            },
            DepositEvent::TextInput { raw_text, .. } => {
                match self.sessions.get(user_id).await {
                    Ok(None) => return vec![OutboundEffect::prompt("Use the buttons below.")],
                    Ok(Some(_)) => {}
                    Err(e) => return vec![error_effect(&e)],
                }
                match self.submit_amount(user_id, raw_text).await {
                    Ok(quote) => vec![OutboundEffect::ConfirmationPrompt {
                        amount: quote.amount,
                        net: quote.net,
                        commission: quote.commission,
                    }],
                    Err(WalletError::Deposit(DepositError::InvalidAmount { .. })) => {
                        vec![OutboundEffect::ValidationError {
                            text: "Enter a valid positive number.".to_string(),
                        }]
                    }
                    Err(e) => vec![error_effect(&e)],
                }
            }
            DepositEvent::ConfirmDeposit { .. } => match self.confirm(user_id).await {
                Ok(receipt) => vec![OutboundEffect::SuccessMessage {
                    net: receipt.payment.net_amount,
                    commission: receipt.payment.commission,
                }],
                Err(e) => vec![error_effect(&e)],
            },
            DepositEvent::CancelOrNavigateAway { .. } => match self.cancel(user_id).await {
                Ok(_) => vec![OutboundEffect::prompt("Action cancelled.")],
                Err(e) => vec![error_effect(&e)],
            },
        }
    }

    fn amount_prompt(&self) -> String {
        format!(
            "Deposit with stars. We charge a {}% commission.\nEnter the number of stars to deposit:",
            self.policy.rate_percent()
        )
    }
}

/// Map a failure to the short message shown to the user
pub fn error_effect(err: &WalletError) -> OutboundEffect {
    match err {
        WalletError::Deposit(e @ DepositError::InvalidAmount { .. }) => {
            OutboundEffect::error(e.kind(), "Enter a valid positive number.")
        }
        WalletError::Deposit(DepositError::NoPendingDeposit) => OutboundEffect::error(
            ErrorKind::NoPendingDeposit,
            "There is no deposit to confirm. Start a new deposit.",
        ),
        WalletError::Deposit(DepositError::StoreUnavailable(_)) => OutboundEffect::error(
            ErrorKind::StoreUnavailable,
            "Could not complete the deposit right now. Press confirm to try again.",
        ),
        WalletError::AccountNotFound { .. } => OutboundEffect::error(
            ErrorKind::AccountNotFound,
            "Account not found. Send /start first.",
        ),
        _ => OutboundEffect::error(ErrorKind::Internal, "Something went wrong. Try again later."),
    }
}
