//! PostgreSQL ledger backend with runtime queries (no compile-time checking)
//!
//! Balance changes are single `UPDATE ... SET balance = balance + $2`
//! statements; the row lock taken by the update serializes concurrent
//! credits for the same user inside the database.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use crate::config::PostgresConfig;
use crate::core::{
    Account, AccountPolicy, AccountStore, DepositReceipt, PaymentRecord, UserId, WalletError,
    WalletResult,
};
use crate::domain::commission::DepositQuote;

const ACCOUNT_COLUMNS: &str = "user_id, display_name, balance, auto_buy_enabled, min_price, \
     max_price, max_per_drop, min_drop_size, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, user_id, gross_amount, commission, net_amount, timestamp";

#[derive(Clone)]
pub struct PostgresAccountStore {
    pub pool: PgPool,
}

impl PostgresAccountStore {
    /// Connect the pool and optionally apply pending migrations
    pub async fn connect(config: &PostgresConfig) -> WalletResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        let store = Self { pool };
        if config.run_migrations {
            store.migrate().await?;
        }
        Ok(store)
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> WalletResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("PostgreSQL migrations applied");
        Ok(())
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        user_id: row.try_get("user_id")?,
        display_name: row.try_get("display_name")?,
        balance: row.try_get::<Decimal, _>("balance")?.normalize(),
        auto_buy_enabled: row.try_get("auto_buy_enabled")?,
        policy: AccountPolicy {
            min_price: row.try_get("min_price")?,
            max_price: row.try_get("max_price")?,
            max_per_drop: row.try_get("max_per_drop")?,
            min_drop_size: row.try_get("min_drop_size")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<PaymentRecord, sqlx::Error> {
    Ok(PaymentRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        gross_amount: row.try_get::<Decimal, _>("gross_amount")?.normalize(),
        commission: row.try_get::<Decimal, _>("commission")?.normalize(),
        net_amount: row.try_get::<Decimal, _>("net_amount")?.normalize(),
        timestamp: row.try_get("timestamp")?,
    })
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn get_or_create(&self, user_id: UserId, display_name: &str) -> WalletResult<Account> {
        let inserted = sqlx::query(
            "INSERT INTO accounts (user_id, display_name) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            info!(user_id, "Created account");
        }

        self.get_account(user_id)
            .await?
            .ok_or(WalletError::AccountNotFound { user_id })
    }

    async fn get_account(&self, user_id: UserId) -> WalletResult<Option<Account>> {
        let query = format!("SELECT {} FROM accounts WHERE user_id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    async fn credit(&self, user_id: UserId, amount: Decimal) -> WalletResult<Account> {
        if amount < Decimal::ZERO {
            return Err(WalletError::InvalidCredit(amount));
        }

        let query = format!(
            "UPDATE accounts SET balance = balance + $2, updated_at = NOW() \
             WHERE user_id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(amount)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(WalletError::AccountNotFound { user_id })?;

        Ok(account_from_row(&row)?)
    }

    async fn apply_deposit(&self, user_id: UserId, quote: &DepositQuote) -> WalletResult<DepositReceipt> {
        if quote.net < Decimal::ZERO {
            return Err(WalletError::InvalidCredit(quote.net));
        }

        let mut tx = self.pool.begin().await?;

        let update = format!(
            "UPDATE accounts SET balance = balance + $2, updated_at = NOW() \
             WHERE user_id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let account_row = sqlx::query(&update)
            .bind(user_id)
            .bind(quote.net)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(WalletError::AccountNotFound { user_id })?;

        let insert = format!(
            "INSERT INTO payments (user_id, gross_amount, commission, net_amount) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            PAYMENT_COLUMNS
        );
        let payment_row = sqlx::query(&insert)
            .bind(user_id)
            .bind(quote.amount)
            .bind(quote.commission)
            .bind(quote.net)
            .fetch_one(&mut *tx)
            .await?;

        let receipt = DepositReceipt {
            account: account_from_row(&account_row)?,
            payment: payment_from_row(&payment_row)?,
        };
        tx.commit().await?;

        Ok(receipt)
    }

    async fn get_balance(&self, user_id: UserId) -> WalletResult<Decimal> {
        let balance: Option<Decimal> = sqlx::query_scalar("SELECT balance FROM accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        balance
            .map(|b| b.normalize())
            .ok_or(WalletError::AccountNotFound { user_id })
    }

    async fn toggle_auto_buy(&self, user_id: UserId) -> WalletResult<bool> {
        let enabled: Option<bool> = sqlx::query_scalar(
            "UPDATE accounts SET auto_buy_enabled = NOT auto_buy_enabled, updated_at = NOW() \
             WHERE user_id = $1 RETURNING auto_buy_enabled",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        enabled.ok_or(WalletError::AccountNotFound { user_id })
    }

    async fn list_payments(&self, user_id: UserId, limit: usize) -> WalletResult<Vec<PaymentRecord>> {
        let query = format!(
            "SELECT {} FROM payments WHERE user_id = $1 ORDER BY id DESC LIMIT $2",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(payment_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn health_check(&self) -> WalletResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
