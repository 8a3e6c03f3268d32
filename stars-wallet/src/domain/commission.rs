//! Commission math for deposits
//!
//! One rule everywhere: `commission = round_half_up(amount * rate)` at the
//! configured amount scale, and `net = amount - commission`. Computing the
//! net as a difference keeps `commission + net == amount` exact.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::DepositConfig;
use crate::core::DepositError;

/// Amount split of a single deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositQuote {
    pub amount: Decimal,
    pub commission: Decimal,
    pub net: Decimal,
}

/// Commission rate and amount acceptance rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionPolicy {
    rate: Decimal,
    scale: u32,
    max_amount: Decimal,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            rate: Decimal::new(3, 2),
            scale: 0,
            max_amount: Decimal::from(1_000_000_000u64),
        }
    }
}

impl CommissionPolicy {
    pub fn new(rate: Decimal, scale: u32, max_amount: Decimal) -> Self {
        Self {
            rate,
            scale,
            max_amount,
        }
    }

    /// Build from the `[deposit]` config section
    pub fn from_config(config: &DepositConfig) -> Self {
        Self::new(config.commission_rate, config.amount_scale, config.max_amount)
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Rate as a display percentage, e.g. `3` for 0.03
    pub fn rate_percent(&self) -> Decimal {
        (self.rate * Decimal::ONE_HUNDRED).normalize()
    }

    /// Commission owed on `amount`
    pub fn commission(&self, amount: Decimal) -> Decimal {
        (amount * self.rate).round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Split an accepted amount into commission and net credit
    pub fn quote(&self, amount: Decimal) -> DepositQuote {
        let commission = self.commission(amount);
        DepositQuote {
            amount,
            commission,
            net: amount - commission,
        }
    }

    /// Parse raw user text into an accepted deposit amount
    pub fn parse_amount(&self, raw: &str) -> Result<Decimal, DepositError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(invalid("empty input"));
        }

        // Plain digits only: from_str also takes exponents, signs and separators
        if !is_plain_decimal(text) {
            return Err(invalid("not a number"));
        }
        let amount = Decimal::from_str(text).map_err(|_| invalid("not a number"))?;
        if amount <= Decimal::ZERO {
            return Err(invalid("amount must be positive"));
        }
        if amount.normalize().scale() > self.scale {
            return Err(invalid(format!(
                "at most {} fractional digits allowed",
                self.scale
            )));
        }
        if amount > self.max_amount {
            return Err(invalid(format!("amount exceeds {}", self.max_amount)));
        }

        Ok(amount.normalize())
    }
}

/// ASCII digits with at most one `.` that has digits on both sides
fn is_plain_decimal(text: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match text.split_once('.') {
        Some((whole, fraction)) => digits(whole) && digits(fraction),
        None => digits(text),
    }
}

fn invalid(reason: impl Into<String>) -> DepositError {
    DepositError::InvalidAmount {
        reason: reason.into(),
    }
}
