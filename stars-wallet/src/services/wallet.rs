//! Wallet facade: main menu actions plus routing into the deposit workflow

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{Account, AccountStore, PaymentRecord, UserId, WalletError, WalletResult};
use crate::domain::deposit::{error_effect, DepositWorkflow};
use crate::domain::events::{InboundEvent, MenuEvent, OutboundEffect};

/// Entry point for every event the messaging surface delivers
pub struct WalletService {
    accounts: Arc<dyn AccountStore>,
    deposits: Arc<DepositWorkflow>,
}

impl WalletService {
    pub fn new(accounts: Arc<dyn AccountStore>, deposits: Arc<DepositWorkflow>) -> Self {
        Self { accounts, deposits }
    }

    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    pub fn deposits(&self) -> &Arc<DepositWorkflow> {
        &self.deposits
    }

    /// First contact: register the user if needed
    pub async fn start(&self, user_id: UserId, display_name: &str) -> WalletResult<Account> {
        let account = self.accounts.get_or_create(user_id, display_name).await?;
        info!(user_id, "User started the bot");
        Ok(account)
    }

    pub async fn payments(&self, user_id: UserId, limit: usize) -> WalletResult<Vec<PaymentRecord>> {
        self.accounts.list_payments(user_id, limit).await
    }

    /// Run one inbound event and return what to display
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundEffect> {
        debug!(user_id = event.user_id(), ?event, "Handling event");
        match event {
            InboundEvent::Deposit(event) => self.deposits.handle(&event).await,
            InboundEvent::Menu(event) => self
                .handle_menu(event)
                .await
                .unwrap_or_else(|e| vec![error_effect(&e)]),
        }
    }

    async fn handle_menu(&self, event: MenuEvent) -> WalletResult<Vec<OutboundEffect>> {
        match event {
            MenuEvent::Start {
                user_id,
                display_name,
            } => {
                self.start(user_id, &display_name).await?;
                // Going back to the main menu abandons any deposit in progress
                self.deposits.cancel(user_id).await?;
                Ok(vec![OutboundEffect::prompt("Welcome!")])
            }
            MenuEvent::ShowBalance { user_id } => {
                let amount = self.accounts.get_balance(user_id).await?;
                Ok(vec![OutboundEffect::Balance { amount }])
            }
            MenuEvent::ShowProfile { user_id } => {
                let account = self
                    .accounts
                    .get_account(user_id)
                    .await?
                    .ok_or(WalletError::AccountNotFound { user_id })?;
                Ok(vec![OutboundEffect::Profile { account }])
            }
            MenuEvent::ToggleAutoBuy { user_id } => {
                let enabled = self.accounts.toggle_auto_buy(user_id).await?;
                info!(user_id, enabled, "Auto-buy toggled");
                Ok(vec![OutboundEffect::AutoBuy { enabled }])
            }
        }
    }
}
