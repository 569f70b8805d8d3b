//! Login and password change.
//!
//! # Login flow
//!
//! 1. Build the brute-force key from client, source IP and normalized identifier
//! 2. Short-circuit with 429 while the key is blocked (no account lookup)
//! 3. Resolve the account and check active/verified status
//! 4. Verify the secret against the stored digest
//! 5. On success clear the failure counters and issue a session token
//!
//! Every failure in steps 3 and 4 registers a failed attempt and returns the
//! same message; only the status code differs.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::employee::{ChangePasswordRequest, LoginRequest, LoginResponse, LoginUser},
    services::{
        account_store::AccountStore,
        brute_force::{AttemptKey, BruteForceGuard, normalize_identifier},
        password::{hash_password, verify_password},
        session_token::{SessionClaims, TokenIssuer},
    },
};

pub const LOGIN_REJECTED: &str = "Invalid credentials";
pub const LOGIN_BLOCKED: &str = "Too many login attempts. Try again later.";
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    guard: BruteForceGuard,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, guard: BruteForceGuard, tokens: TokenIssuer) -> Self {
        Self {
            accounts,
            guard,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Authenticate a login request.
    ///
    /// # Arguments
    ///
    /// * `client_id` - API client resolved by the admission gate
    /// * `source_ip` - Caller address, or `"unknown"`
    /// * `request` - Submitted identifier and secret
    ///
    /// # Errors
    ///
    /// - `RateLimitExceeded`: the key is blocked
    /// - `Authentication`: unknown account or wrong secret
    /// - `Authorization`: account inactive or not verified
    pub async fn login(
        &self,
        client_id: Uuid,
        source_ip: &str,
        request: &LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let identifier = normalize_identifier(&request.identifier);
        let key = AttemptKey::new(client_id, source_ip, &identifier);

        if self.guard.is_blocked(&key).await? {
            tracing::warn!(%client_id, source_ip, "login attempt while blocked");
            return Err(AppError::RateLimitExceeded(LOGIN_BLOCKED.to_string()));
        }

        let Some(account) = self.accounts.find_by_email(&identifier).await? else {
            return self.reject(&key, AppError::Authentication(LOGIN_REJECTED.to_string())).await;
        };

        if !account.is_active || !account.is_verified {
            return self.reject(&key, AppError::Authorization(LOGIN_REJECTED.to_string())).await;
        }

        if !verify_password(&request.secret, &account.password_digest)? {
            return self.reject(&key, AppError::Authentication(LOGIN_REJECTED.to_string())).await;
        }

        self.guard.clear(&key).await?;
        let token = self.tokens.issue(&account)?;
        tracing::info!(user_id = account.user_id, %client_id, "login succeeded");

        Ok(LoginResponse {
            token,
            user: LoginUser::from(&account),
        })
    }

    async fn reject(&self, key: &AttemptKey, error: AppError) -> Result<LoginResponse, AppError> {
        let failures = self.guard.register_failure(key).await?;
        tracing::debug!(failures, "login rejected");
        Err(error)
    }

    /// Change the password of the session's account.
    ///
    /// # Errors
    ///
    /// - `Validation`: missing fields, new password too short or unchanged
    /// - `Authentication`: no account for the session pin, or old password wrong
    /// - `Internal`: the update touched no row
    pub async fn change_password(
        &self,
        session: &SessionClaims,
        request: &ChangePasswordRequest,
    ) -> Result<(), AppError> {
        if request.old_password.trim().is_empty() || request.new_password.trim().is_empty() {
            return Err(AppError::Validation(
                "old_password and new_password are required".to_string(),
            ));
        }
        if request.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if request.new_password == request.old_password {
            return Err(AppError::Validation(
                "New password must differ from the old password".to_string(),
            ));
        }

        let account = self
            .accounts
            .find_by_pin(session.employee_code)
            .await?
            .ok_or_else(|| AppError::Authentication("Unauthorized".to_string()))?;

        if !verify_password(&request.old_password, &account.password_digest)? {
            return Err(AppError::Authentication("Old password is incorrect".to_string()));
        }

        let digest = hash_password(&request.new_password)?;
        if !self.accounts.update_password(account.user_id, &digest).await? {
            return Err(AppError::Internal(format!(
                "password update affected no rows for user {}",
                account.user_id
            )));
        }

        tracing::info!(user_id = account.user_id, "password changed");
        Ok(())
    }
}
