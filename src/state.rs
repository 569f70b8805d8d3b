//! Shared application state handed to every handler and middleware.

use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;

use crate::{
    clock::Clock,
    config::Config,
    db::DbPool,
    error::AppError,
    services::{
        account_store::PgAccountStore,
        attendance_service::AttendanceService,
        auth_service::AuthService,
        brute_force::BruteForceGuard,
        counter_store::CounterStore,
        credential_store::{CredentialStore, PgCredentialStore},
        employee_service::PgEmployeeDirectory,
        ledger::PgLedger,
        monitor_service::DeviceMonitor,
        rate_limiter::RateLimiter,
        session_token::TokenIssuer,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub clock: Arc<dyn Clock>,
    pub credentials: Arc<dyn CredentialStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth: Arc<AuthService>,
    pub attendance: Arc<AttendanceService>,
    pub monitor: DeviceMonitor,
}

impl AppState {
    /// Wire the Postgres-backed stores around `counters`.
    pub fn new(
        pool: DbPool,
        config: &Config,
        counters: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let tokens = TokenIssuer::new(&config.jwt_key, &config.jwt_issuer, &config.jwt_audience);
        let auth = AuthService::new(
            Arc::new(PgAccountStore::new(pool.clone())),
            BruteForceGuard::new(counters.clone()),
            tokens,
        );
        let attendance = AttendanceService::new(
            Arc::new(PgEmployeeDirectory::new(pool.clone())),
            Arc::new(PgLedger::new(pool.clone())),
            clock.clone(),
        );
        let monitor = DeviceMonitor::new(
            config.monitor_max_concurrency,
            Duration::from_millis(config.monitor_probe_timeout_ms),
        )?;

        Ok(Self {
            credentials: Arc::new(PgCredentialStore::new(pool.clone())),
            rate_limiter: Arc::new(RateLimiter::new(counters, clock.clone(), config.login_rate_limit)),
            auth: Arc::new(auth),
            attendance: Arc::new(attendance),
            monitor,
            clock,
            pool,
        })
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
