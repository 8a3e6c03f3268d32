//! Wallet domain: commission math, events and the deposit state machine

pub mod commission;
pub mod deposit;
pub mod events;

pub use commission::{CommissionPolicy, DepositQuote};
pub use deposit::{DepositStage, DepositState, DepositWorkflow, PendingDeposit, RetryPolicy};
pub use events::{DepositEvent, InboundEvent, MenuEvent, OutboundEffect};
