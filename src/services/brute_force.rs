//! Login brute-force protection.
//!
//! Failures are counted per (API client, source IP, normalized account).
//! The fifth failure inside a rolling 10-minute window blocks that key for
//! 15 minutes; a successful login clears both counters.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{error::AppError, services::counter_store::CounterStore};

pub const MAX_FAILURES: u64 = 5;
pub const FAILURE_WINDOW: Duration = Duration::from_secs(10 * 60);
pub const BLOCK_DURATION: Duration = Duration::from_secs(15 * 60);

/// Identifies one stream of login attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptKey {
    fail_key: String,
    block_key: String,
}

impl AttemptKey {
    /// Build the key; the account identifier is trimmed and lowercased.
    pub fn new(client_id: Uuid, source_ip: &str, account: &str) -> Self {
        let account = normalize_identifier(account);
        Self {
            fail_key: format!("login:fail:{client_id}:{source_ip}:{account}"),
            block_key: format!("login:block:{client_id}:{source_ip}:{account}"),
        }
    }
}

/// Canonical form of a login identifier.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

#[derive(Clone)]
pub struct BruteForceGuard {
    store: Arc<dyn CounterStore>,
}

impl BruteForceGuard {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn is_blocked(&self, key: &AttemptKey) -> Result<bool, AppError> {
        self.store.contains(&key.block_key).await
    }

    /// Record a failed attempt and return the failure count.
    ///
    /// Sets the block flag once the count reaches [`MAX_FAILURES`].
    pub async fn register_failure(&self, key: &AttemptKey) -> Result<u64, AppError> {
        let failures = self.store.increment(&key.fail_key, FAILURE_WINDOW).await?;
        if failures >= MAX_FAILURES {
            self.store.set_flag(&key.block_key, BLOCK_DURATION).await?;
            tracing::warn!(failures, "login blocked after repeated failures");
        }
        Ok(failures)
    }

    pub async fn clear(&self, key: &AttemptKey) -> Result<(), AppError> {
        self.store.remove(&key.fail_key).await?;
        self.store.remove(&key.block_key).await
    }
}
