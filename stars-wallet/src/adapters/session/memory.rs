//! In-process session store
//!
//! Pending deposits live in a sharded map. Each shard is a plain mutex held
//! only for the map operation itself, never across an await. With a TTL,
//! entries expire relative to their last write, like the Redis `EX` option.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::core::{SessionStore, UserId, WalletResult};
use crate::domain::deposit::PendingDeposit;

const SHARDS: usize = 16;

struct Entry {
    pending: PendingDeposit,
    written_at: Instant,
}

impl Entry {
    fn new(pending: PendingDeposit) -> Self {
        Self {
            pending,
            written_at: Instant::now(),
        }
    }
}

type Shard = HashMap<UserId, Entry>;

pub struct InMemorySessionStore {
    shards: Vec<Mutex<Shard>>,
    ttl: Option<Duration>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    /// Store whose entries never expire
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
            ttl: None,
        }
    }

    /// Store that drops entries `ttl` after their last write
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new()
        }
    }

    fn shard(&self, user_id: UserId) -> MutexGuard<'_, Shard> {
        let index = (user_id as u64 % SHARDS as u64) as usize;
        // Map operations cannot leave a shard half-updated, so recover from poisoning.
        self.shards[index].lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_live(&self, entry: &Entry) -> bool {
        self.ttl.map_or(true, |ttl| entry.written_at.elapsed() < ttl)
    }

    /// Number of users with a live pending deposit
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .values()
                    .filter(|e| self.is_live(e))
                    .count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, pending: PendingDeposit) -> WalletResult<Option<PendingDeposit>> {
        let user_id = pending.user_id;
        let mut shard = self.shard(user_id);
        let previous = shard
            .insert(user_id, Entry::new(pending))
            .filter(|e| self.is_live(e))
            .map(|e| e.pending);
        // Abandoned deposits are reclaimed whenever their shard is written
        shard.retain(|_, e| self.is_live(e));
        Ok(previous)
    }

    async fn get(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>> {
        let mut shard = self.shard(user_id);
        if shard.get(&user_id).is_some_and(|e| !self.is_live(e)) {
            shard.remove(&user_id);
        }
        Ok(shard.get(&user_id).map(|e| e.pending.clone()))
    }

    async fn take(&self, user_id: UserId) -> WalletResult<Option<PendingDeposit>> {
        Ok(self
            .shard(user_id)
            .remove(&user_id)
            .filter(|e| self.is_live(e))
            .map(|e| e.pending))
    }

    async fn restore(&self, pending: PendingDeposit) -> WalletResult<bool> {
        let mut shard = self.shard(pending.user_id);
        if shard.get(&pending.user_id).is_some_and(|e| self.is_live(e)) {
            return Ok(false);
        }
        shard.insert(pending.user_id, Entry::new(pending));
        Ok(true)
    }

    async fn clear(&self, user_id: UserId) -> WalletResult<()> {
        self.shard(user_id).remove(&user_id);
        Ok(())
    }

    async fn health_check(&self) -> WalletResult<()> {
        Ok(())
    }
}
