//! RocksDB account store tests

use anyhow::Result;
use rust_decimal::Decimal;
use stars_wallet::adapters::storage::{ColumnFamilies, RocksAccountStore};
use stars_wallet::config::RocksDBConfig;
use stars_wallet::core::{AccountPolicy, AccountStore, WalletError};
use stars_wallet::domain::CommissionPolicy;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_config(temp_dir: &TempDir) -> RocksDBConfig {
    RocksDBConfig {
        path: temp_dir.path().to_path_buf(),
        enable_compression: true,
        max_open_files: 100,
        write_buffer_size_mb: 16,
        max_write_buffer_number: 2,
        block_cache_size_mb: 32,
    }
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;

    let created = store.get_or_create(7, "Alice").await?;
    assert_eq!(created.balance, Decimal::ZERO);
    assert!(created.auto_buy_enabled);
    assert_eq!(created.policy, AccountPolicy::default());

    store.credit(7, Decimal::from(12)).await?;

    // A second start never resets the account
    let again = store.get_or_create(7, "Renamed").await?;
    assert_eq!(again.display_name, "Alice");
    assert_eq!(again.balance, Decimal::from(12));
    assert_eq!(again.created_at, created.created_at);

    Ok(())
}

#[tokio::test]
async fn test_missing_account() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;

    assert!(store.get_account(99).await?.is_none());
    assert!(matches!(
        store.get_balance(99).await,
        Err(WalletError::AccountNotFound { user_id: 99 })
    ));
    assert!(matches!(
        store.credit(99, Decimal::ONE).await,
        Err(WalletError::AccountNotFound { user_id: 99 })
    ));
    assert!(matches!(
        store.toggle_auto_buy(99).await,
        Err(WalletError::AccountNotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_credit_rejects_negative_amount() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;
    store.get_or_create(1, "Alice").await?;

    let result = store.credit(1, Decimal::from(-5)).await;
    assert!(matches!(result, Err(WalletError::InvalidCredit(_))));
    assert_eq!(store.get_balance(1).await?, Decimal::ZERO);

    // Zero is a valid no-op credit
    let account = store.credit(1, Decimal::ZERO).await?;
    assert_eq!(account.balance, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn test_credit_overflow_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;
    store.get_or_create(1, "Alice").await?;

    store.credit(1, Decimal::MAX).await?;
    let result = store.credit(1, Decimal::ONE).await;
    assert!(matches!(result, Err(WalletError::InvalidCredit(_))));
    assert_eq!(store.get_balance(1).await?, Decimal::MAX);

    let quote = CommissionPolicy::default().quote(Decimal::from(100));
    let result = store.apply_deposit(1, &quote).await;
    assert!(matches!(result, Err(WalletError::InvalidCredit(_))));
    assert_eq!(store.get_balance(1).await?, Decimal::MAX);
    assert!(store.list_payments(1, 10).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_toggle_auto_buy_flips_flag() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;
    store.get_or_create(3, "Carol").await?;

    assert!(!store.toggle_auto_buy(3).await?);
    assert!(!store.get_account(3).await?.map(|a| a.auto_buy_enabled).unwrap_or(true));
    assert!(store.toggle_auto_buy(3).await?);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_credits_are_not_lost() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(RocksAccountStore::open(create_test_config(&temp_dir))?);
    store.get_or_create(5, "Dave").await?;

    let handles: Vec<_> = (1..=50)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.credit(5, Decimal::from(i)).await })
        })
        .collect();

    for handle in handles {
        handle.await??;
    }

    // 1 + 2 + ... + 50
    assert_eq!(store.get_balance(5).await?, Decimal::from(1275));

    Ok(())
}

#[tokio::test]
async fn test_apply_deposit_records_payment() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;
    store.get_or_create(1, "Alice").await?;
    store.get_or_create(2, "Bob").await?;

    let policy = CommissionPolicy::default();
    for amount in [100, 50, 10] {
        store.apply_deposit(1, &policy.quote(Decimal::from(amount))).await?;
    }
    store.apply_deposit(2, &policy.quote(Decimal::from(1))).await?;

    // 97 + 48 + 10
    assert_eq!(store.get_balance(1).await?, Decimal::from(155));
    assert_eq!(store.get_balance(2).await?, Decimal::ONE);

    let payments = store.list_payments(1, 10).await?;
    assert_eq!(payments.len(), 3);
    let gross: Vec<_> = payments.iter().map(|p| p.gross_amount).collect();
    assert_eq!(gross, vec![Decimal::from(10), Decimal::from(50), Decimal::from(100)]);
    for payment in &payments {
        assert_eq!(payment.user_id, 1);
        assert_eq!(payment.commission + payment.net_amount, payment.gross_amount);
    }
    assert!(payments.windows(2).all(|w| w[0].id > w[1].id));

    let limited = store.list_payments(1, 2).await?;
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, payments[0].id);

    assert_eq!(store.list_payments(2, 10).await?.len(), 1);
    assert!(store.list_payments(3, 10).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_payment_sequence_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let policy = CommissionPolicy::default();

    let first_id = {
        let store = RocksAccountStore::open(create_test_config(&temp_dir))?;
        store.get_or_create(1, "Alice").await?;
        store.apply_deposit(1, &policy.quote(Decimal::from(100))).await?;
        let receipt = store.apply_deposit(1, &policy.quote(Decimal::from(20))).await?;
        store.manager().flush()?;
        receipt.payment.id
    };

    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;
    let receipt = store.apply_deposit(1, &policy.quote(Decimal::from(30))).await?;
    assert!(receipt.payment.id > first_id);

    // 97 + 20 (0.6 rounds up to 1 -> 19) + 29
    assert_eq!(store.get_balance(1).await?, Decimal::from(145));
    assert_eq!(store.list_payments(1, 10).await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_manager_stats_and_column_families() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = RocksAccountStore::open(create_test_config(&temp_dir))?;

    assert_eq!(ColumnFamilies::all().len(), 3);
    store.health_check().await?;
    let stats = store.manager().get_stats()?;
    assert!(!stats.is_empty());

    Ok(())
}
