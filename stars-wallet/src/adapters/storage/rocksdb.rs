//! RocksDB ledger backend
//!
//! Accounts, payments and a per-user payment index live in separate column
//! families. Mutations of one account are serialized by a striped lock and
//! land in a single atomic write batch, so a credit and its audit row are
//! never observed apart.

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{
    ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options,
    WriteBatch,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::RocksDBConfig;
use crate::core::{
    Account, AccountStore, DepositReceipt, PaymentRecord, StorageError, UserId, WalletError,
    WalletResult,
};
use crate::domain::commission::DepositQuote;

/// Type alias for the RocksDB instance
pub type RocksDB = DBWithThreadMode<MultiThreaded>;

/// Column family names for different data types
pub struct ColumnFamilies;

impl ColumnFamilies {
    pub const ACCOUNTS: &'static str = "accounts";
    pub const PAYMENTS: &'static str = "payments";
    pub const USER_PAYMENTS: &'static str = "user_payments";

    /// Get all column family names
    pub fn all() -> Vec<&'static str> {
        vec![Self::ACCOUNTS, Self::PAYMENTS, Self::USER_PAYMENTS]
    }
}

fn rocks_err(e: impl std::fmt::Display) -> WalletError {
    WalletError::Storage(StorageError::RocksDB(e.to_string()))
}

/// RocksDB storage manager with serde support
#[derive(Clone)]
pub struct RocksDBManager {
    db: Arc<RocksDB>,
}

impl RocksDBManager {
    /// Open (or create) the database with all column families
    pub fn open(config: RocksDBConfig) -> WalletResult<Self> {
        info!("Initializing RocksDB at path: {}", config.path.display());

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Performance tuning
        db_opts.set_max_open_files(config.max_open_files);
        db_opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.max_write_buffer_number);

        if config.enable_compression {
            db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        }

        let cache = rocksdb::Cache::new_lru_cache(config.block_cache_size_mb * 1024 * 1024);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_block_cache(&cache);
        db_opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ColumnFamilies::all()
            .into_iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                if config.enable_compression {
                    cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
                }
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = RocksDB::open_cf_descriptors(&db_opts, &config.path, cf_descriptors)
            .map_err(|e| rocks_err(format!("Failed to open RocksDB: {}", e)))?;

        info!("RocksDB initialized successfully");

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle
    fn get_cf(&self, name: &str) -> WalletResult<Arc<rocksdb::BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| rocks_err(format!("Column family '{}' not found", name)))
    }

    /// Put a serializable value into a column family
    pub fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> WalletResult<()> {
        let cf = self.get_cf(cf_name)?;
        let serialized = bincode::serialize(value)?;
        self.db.put_cf(&cf, key, serialized)?;
        Ok(())
    }

    /// Get and deserialize a value from a column family
    pub fn get<T: for<'de> Deserialize<'de>>(&self, cf_name: &str, key: &[u8]) -> WalletResult<Option<T>> {
        let cf = self.get_cf(cf_name)?;
        match self.db.get_cf(&cf, key)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// Create a write batch for atomic operations
    pub fn create_batch(&self) -> RocksDBBatch {
        RocksDBBatch {
            batch: WriteBatch::default(),
            manager: self.clone(),
        }
    }

    /// Last key of a column family in byte order
    pub fn last_key(&self, cf_name: &str) -> WalletResult<Option<Vec<u8>>> {
        let cf = self.get_cf(cf_name)?;
        match self.db.iterator_cf(&cf, IteratorMode::End).next() {
            Some(item) => Ok(Some(item?.0.into_vec())),
            None => Ok(None),
        }
    }

    /// Keys sharing `prefix`, walking backwards from `start`, at most `limit`
    pub fn keys_with_prefix_rev(
        &self,
        cf_name: &str,
        prefix: &[u8],
        start: &[u8],
        limit: usize,
    ) -> WalletResult<Vec<Vec<u8>>> {
        let cf = self.get_cf(cf_name)?;
        let mut keys = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(start, Direction::Reverse))
        {
            let (key, _) = item?;
            if !key.starts_with(prefix) || keys.len() >= limit {
                break;
            }
            keys.push(key.into_vec());
        }
        Ok(keys)
    }

    /// Get database statistics
    pub fn get_stats(&self) -> WalletResult<HashMap<String, String>> {
        let mut stats = HashMap::new();

        for cf_name in ColumnFamilies::all() {
            let cf = self.get_cf(cf_name)?;

            if let Ok(Some(count)) = self.db.property_value_cf(&cf, "rocksdb.estimate-num-keys") {
                stats.insert(format!("{}_keys", cf_name), count);
            }
        }

        Ok(stats)
    }

    /// Flush all memtables
    pub fn flush(&self) -> WalletResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// Write batch for atomic operations
pub struct RocksDBBatch {
    batch: WriteBatch,
    manager: RocksDBManager,
}

impl RocksDBBatch {
    /// Put a serializable value into the batch
    pub fn put<T: Serialize>(&mut self, cf_name: &str, key: &[u8], value: &T) -> WalletResult<()> {
        let cf = self.manager.get_cf(cf_name)?;
        let serialized = bincode::serialize(value)?;
        self.batch.put_cf(&cf, key, serialized);
        Ok(())
    }

    /// Write the batch atomically
    pub fn write(self) -> WalletResult<()> {
        self.manager.db.write(self.batch)?;
        Ok(())
    }
}

const LOCK_STRIPES: usize = 64;

/// Account ledger on top of [`RocksDBManager`]
pub struct RocksAccountStore {
    db: RocksDBManager,
    locks: Vec<Mutex<()>>,
    last_payment_id: AtomicI64,
}

impl RocksAccountStore {
    pub fn new(db: RocksDBManager) -> WalletResult<Self> {
        let last_payment_id = match db.last_key(ColumnFamilies::PAYMENTS)? {
            Some(key) => decode_id(&key)?,
            None => 0,
        };
        debug!(last_payment_id, "Recovered payment sequence");

        Ok(Self {
            db,
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            last_payment_id: AtomicI64::new(last_payment_id),
        })
    }

    /// Open the database described by `config` and wrap it
    pub fn open(config: RocksDBConfig) -> WalletResult<Self> {
        Self::new(RocksDBManager::open(config)?)
    }

    pub fn manager(&self) -> &RocksDBManager {
        &self.db
    }

    fn lock(&self, user_id: UserId) -> MutexGuard<'_, ()> {
        let stripe = (user_id as u64 % LOCK_STRIPES as u64) as usize;
        // The guarded value is (), so a poisoned lock carries no broken state.
        self.locks[stripe].lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, user_id: UserId) -> WalletResult<Account> {
        self.db
            .get(ColumnFamilies::ACCOUNTS, &user_id.to_be_bytes())?
            .ok_or(WalletError::AccountNotFound { user_id })
    }

    fn save(&self, account: &Account) -> WalletResult<()> {
        self.db
            .put(ColumnFamilies::ACCOUNTS, &account.user_id.to_be_bytes(), account)
    }
}

fn payment_index_key(user_id: UserId, payment_id: i64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&user_id.to_be_bytes());
    key[8..].copy_from_slice(&payment_id.to_be_bytes());
    key
}

fn add_balance(balance: Decimal, amount: Decimal) -> WalletResult<Decimal> {
    balance
        .checked_add(amount)
        .ok_or(WalletError::InvalidCredit(amount))
}

fn decode_id(bytes: &[u8]) -> WalletResult<i64> {
    let raw: [u8; 8] = bytes
        .get(bytes.len().saturating_sub(8)..)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| rocks_err("Malformed payment key"))?;
    Ok(i64::from_be_bytes(raw))
}

#[async_trait]
impl AccountStore for RocksAccountStore {
    async fn get_or_create(&self, user_id: UserId, display_name: &str) -> WalletResult<Account> {
        let _guard = self.lock(user_id);
        if let Some(existing) = self
            .db
            .get::<Account>(ColumnFamilies::ACCOUNTS, &user_id.to_be_bytes())?
        {
            return Ok(existing);
        }

        let account = Account::new(user_id, display_name);
        self.save(&account)?;
        info!(user_id, "Created account");
        Ok(account)
    }

    async fn get_account(&self, user_id: UserId) -> WalletResult<Option<Account>> {
        self.db.get(ColumnFamilies::ACCOUNTS, &user_id.to_be_bytes())
    }

    async fn credit(&self, user_id: UserId, amount: Decimal) -> WalletResult<Account> {
        if amount < Decimal::ZERO {
            return Err(WalletError::InvalidCredit(amount));
        }

        let _guard = self.lock(user_id);
        let mut account = self.load(user_id)?;
        account.balance = add_balance(account.balance, amount)?;
        account.updated_at = Utc::now();
        self.save(&account)?;
        Ok(account)
    }

    async fn apply_deposit(&self, user_id: UserId, quote: &DepositQuote) -> WalletResult<DepositReceipt> {
        if quote.net < Decimal::ZERO {
            return Err(WalletError::InvalidCredit(quote.net));
        }

        let _guard = self.lock(user_id);
        let mut account = self.load(user_id)?;
        let now = Utc::now();
        account.balance = add_balance(account.balance, quote.net)?;
        account.updated_at = now;

        let payment = PaymentRecord {
            id: self.last_payment_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            gross_amount: quote.amount,
            commission: quote.commission,
            net_amount: quote.net,
            timestamp: now,
        };

        let mut batch = self.db.create_batch();
        batch.put(ColumnFamilies::ACCOUNTS, &user_id.to_be_bytes(), &account)?;
        batch.put(ColumnFamilies::PAYMENTS, &payment.id.to_be_bytes(), &payment)?;
        batch.put(
            ColumnFamilies::USER_PAYMENTS,
            &payment_index_key(user_id, payment.id),
            &(),
        )?;
        batch.write()?;

        Ok(DepositReceipt { account, payment })
    }

    async fn get_balance(&self, user_id: UserId) -> WalletResult<Decimal> {
        Ok(self.load(user_id)?.balance)
    }

    async fn toggle_auto_buy(&self, user_id: UserId) -> WalletResult<bool> {
        let _guard = self.lock(user_id);
        let mut account = self.load(user_id)?;
        account.auto_buy_enabled = !account.auto_buy_enabled;
        account.updated_at = Utc::now();
        self.save(&account)?;
        Ok(account.auto_buy_enabled)
    }

    async fn list_payments(&self, user_id: UserId, limit: usize) -> WalletResult<Vec<PaymentRecord>> {
        let prefix = user_id.to_be_bytes();
        let start = payment_index_key(user_id, i64::MAX);
        let keys = self
            .db
            .keys_with_prefix_rev(ColumnFamilies::USER_PAYMENTS, &prefix, &start, limit)?;

        let mut payments = Vec::with_capacity(keys.len());
        for key in keys {
            let id = decode_id(&key)?;
            if let Some(payment) = self
                .db
                .get::<PaymentRecord>(ColumnFamilies::PAYMENTS, &id.to_be_bytes())?
            {
                payments.push(payment);
            }
        }
        Ok(payments)
    }

    async fn health_check(&self) -> WalletResult<()> {
        self.db.get_stats().map(|_| ())
    }
}
