//! Expiring key-value counters backing rate limiting and login protection.
//!
//! The admission gate and brute-force guard only talk to [`CounterStore`].
//! [`MemoryCounterStore`] keeps everything in process; a deployment running
//! several instances needs a shared implementation behind the same trait.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use crate::{clock::Clock, error::AppError};

/// Key-value store with per-key expiry.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter at `key` and return the new value.
    ///
    /// A missing or expired counter starts from zero. Every increment
    /// pushes the expiry out to `now + ttl`.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, AppError>;

    /// Set a presence flag that expires after `ttl`.
    async fn set_flag(&self, key: &str, ttl: Duration) -> Result<(), AppError>;

    /// Whether an unexpired entry exists at `key`.
    async fn contains(&self, key: &str) -> Result<bool, AppError>;

    /// Delete `key` if present.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: u64,
    expires_at: DateTime<Utc>,
}

/// Process-local [`CounterStore`].
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Drop every expired entry and return how many were removed.
    ///
    /// Lookups already ignore expired entries; this only bounds memory.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_utc();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn expiry(&self, ttl: Duration) -> DateTime<Utc> {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        self.clock
            .now_utc()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, AppError> {
        let now = self.clock.now_utc();
        let expires_at = self.expiry(ttl);
        let mut entries = self.entries.lock();

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at,
        });
        if entry.expires_at <= now {
            entry.value = 0;
        }
        entry.value += 1;
        entry.expires_at = expires_at;

        Ok(entry.value)
    }

    async fn set_flag(&self, key: &str, ttl: Duration) -> Result<(), AppError> {
        let expires_at = self.expiry(ttl);
        self.entries
            .lock()
            .insert(key.to_string(), Entry { value: 1, expires_at });
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, AppError> {
        let now = self.clock.now_utc();
        Ok(self
            .entries
            .lock()
            .get(key)
            .is_some_and(|entry| entry.expires_at > now))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
