//! Prometheus counters for deposit bookkeeping

use anyhow::Result;
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Wallet metrics, registered on a private registry
pub struct WalletMetrics {
    registry: Registry,
    deposits_initiated: IntCounter,
    deposits_confirmed: IntCounter,
    deposits_cancelled: IntCounter,
    invalid_amounts: IntCounter,
    stale_confirms: IntCounter,
    store_failures: IntCounter,
    stars_credited: IntCounter,
}

impl WalletMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("stars_wallet".to_string()), None)?;

        let counter = |name: &str, help: &str| -> Result<IntCounter> {
            let c = IntCounter::with_opts(Opts::new(name, help))?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        let deposits_initiated = counter("deposits_initiated_total", "Deposit conversations started")?;
        let deposits_confirmed = counter("deposits_confirmed_total", "Deposits credited to the ledger")?;
        let deposits_cancelled = counter("deposits_cancelled_total", "Pending deposits discarded")?;
        let invalid_amounts = counter("invalid_amounts_total", "Rejected deposit amount inputs")?;
        let stale_confirms = counter("stale_confirms_total", "Confirms with no pending deposit")?;
        let store_failures = counter("store_failures_total", "Deposits that failed to credit after retries")?;
        let stars_credited = counter("stars_credited_total", "Net whole stars credited by deposits")?;

        Ok(Self {
            registry,
            deposits_initiated,
            deposits_confirmed,
            deposits_cancelled,
            invalid_amounts,
            stale_confirms,
            store_failures,
            stars_credited,
        })
    }

    pub fn deposit_initiated(&self) {
        self.deposits_initiated.inc();
    }

    pub fn deposit_confirmed(&self, net: Decimal) {
        self.deposits_confirmed.inc();
        if let Some(whole) = net.trunc().to_u64() {
            self.stars_credited.inc_by(whole);
        }
    }

    pub fn deposit_cancelled(&self) {
        self.deposits_cancelled.inc();
    }

    pub fn invalid_amount(&self) {
        self.invalid_amounts.inc();
    }

    pub fn stale_confirm(&self) {
        self.stale_confirms.inc();
    }

    pub fn store_failure(&self) {
        self.store_failures.inc();
    }

    pub fn confirmed_count(&self) -> u64 {
        self.deposits_confirmed.get()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let metrics = WalletMetrics::new().unwrap();
        metrics.deposit_initiated();
        metrics.deposit_confirmed(Decimal::from(97));

        let text = metrics.render().unwrap();
        assert!(text.contains("stars_wallet_deposits_confirmed_total 1"));
        assert!(text.contains("stars_wallet_stars_credited_total 97"));
        assert_eq!(metrics.confirmed_count(), 1);
    }
}
