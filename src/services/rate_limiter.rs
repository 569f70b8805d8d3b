//! Per-minute request counters for API clients.
//!
//! Windows are calendar minutes (UTC): every request increments the counter
//! of the bucket it falls in, and the bucket expires one minute later.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{clock::Clock, error::AppError, services::counter_store::CounterStore};

const BUCKET_TTL: Duration = Duration::from_secs(60);

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u64 },
    Exceeded { count: u64 },
}

impl RateDecision {
    fn from_count(count: u64, limit: u64) -> Self {
        if count > limit {
            RateDecision::Exceeded { count }
        } else {
            RateDecision::Allowed { count }
        }
    }

    pub fn is_exceeded(&self) -> bool {
        matches!(self, RateDecision::Exceeded { .. })
    }
}

/// Fixed-window limiter over a [`CounterStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    login_limit: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>, login_limit: u64) -> Self {
        Self {
            store,
            clock,
            login_limit,
        }
    }

    /// Count a request against the client's general quota.
    ///
    /// The counter is incremented even when the request is rejected.
    pub async fn hit_client(&self, client_id: Uuid, quota: u64) -> Result<RateDecision, AppError> {
        let key = format!("rl:{}:{}", client_id, self.bucket());
        let count = self.store.increment(&key, BUCKET_TTL).await?;
        Ok(RateDecision::from_count(count, quota))
    }

    /// Count a login request from `source_ip` for this client.
    pub async fn hit_login(&self, client_id: Uuid, source_ip: &str) -> Result<RateDecision, AppError> {
        let key = format!("rl:login:{}:{}:{}", client_id, source_ip, self.bucket());
        let count = self.store.increment(&key, BUCKET_TTL).await?;
        Ok(RateDecision::from_count(count, self.login_limit))
    }

    fn bucket(&self) -> String {
        self.clock.now_utc().format("%Y%m%d%H%M").to_string()
    }
}
