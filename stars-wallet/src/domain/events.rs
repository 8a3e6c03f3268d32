//! Inbound events from the messaging surface and the effects sent back

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Account, ErrorKind, UserId};

/// Events that drive the deposit conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DepositEvent {
    InitiateDeposit { user_id: UserId },
    TextInput { user_id: UserId, raw_text: String },
    ConfirmDeposit { user_id: UserId },
    CancelOrNavigateAway { user_id: UserId },
}

impl DepositEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            DepositEvent::InitiateDeposit { user_id }
            | DepositEvent::TextInput { user_id, .. }
            | DepositEvent::ConfirmDeposit { user_id }
            | DepositEvent::CancelOrNavigateAway { user_id } => *user_id,
        }
    }
}

/// Main menu actions outside the deposit flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuEvent {
    Start { user_id: UserId, display_name: String },
    ShowBalance { user_id: UserId },
    ShowProfile { user_id: UserId },
    ToggleAutoBuy { user_id: UserId },
}

impl MenuEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            MenuEvent::Start { user_id, .. }
            | MenuEvent::ShowBalance { user_id }
            | MenuEvent::ShowProfile { user_id }
            | MenuEvent::ToggleAutoBuy { user_id } => *user_id,
        }
    }
}

/// Anything the messaging surface can deliver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundEvent {
    Deposit(DepositEvent),
    Menu(MenuEvent),
}

impl InboundEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            InboundEvent::Deposit(event) => event.user_id(),
            InboundEvent::Menu(event) => event.user_id(),
        }
    }
}

impl From<DepositEvent> for InboundEvent {
    fn from(event: DepositEvent) -> Self {
        InboundEvent::Deposit(event)
    }
}

impl From<MenuEvent> for InboundEvent {
    fn from(event: MenuEvent) -> Self {
        InboundEvent::Menu(event)
    }
}

/// Display updates handed back to the messaging surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEffect {
    Prompt { text: String },
    ValidationError { text: String },
    ConfirmationPrompt {
        amount: Decimal,
        net: Decimal,
        commission: Decimal,
    },
    SuccessMessage { net: Decimal, commission: Decimal },
    ErrorMessage { kind: ErrorKind, text: String },
    Notice { text: String },
    Balance { amount: Decimal },
    Profile { account: Account },
    AutoBuy { enabled: bool },
}

impl OutboundEffect {
    pub fn prompt(text: impl Into<String>) -> Self {
        OutboundEffect::Prompt { text: text.into() }
    }

    pub fn error(kind: ErrorKind, text: impl Into<String>) -> Self {
        OutboundEffect::ErrorMessage {
            kind,
            text: text.into(),
        }
    }
}
