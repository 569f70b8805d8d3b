//! Signed session tokens issued at login.
//!
//! Tokens are HS256 JWTs valid for six hours. Validation checks signature,
//! issuer, audience and expiry with a 30-second leeway.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::employee::UserAccount};

pub const TOKEN_LIFETIME_SECS: u64 = 6 * 60 * 60;
pub const VALIDATION_LEEWAY_SECS: u64 = 30;

/// Wire claims of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    pin: i32,
    tenant_id: i64,
    level: i32,
    email: String,
    iss: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// Identity of the caller, attached to requests by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub subject_id: i64,
    /// Employee pin.
    pub employee_code: i32,
    pub tenant_id: i64,
    /// 0 is a regular employee.
    pub privilege_level: i32,
    pub contact: String,
}

/// Issues and validates session tokens with one shared HMAC key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Sign a token for `account`.
    pub fn issue(&self, account: &UserAccount) -> Result<String, AppError> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = TokenClaims {
            sub: account.user_id.to_string(),
            pin: account.pin,
            tenant_id: account.tenant_id,
            level: account.level,
            email: account.email.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Validate a bearer token and extract the caller's identity.
    ///
    /// # Errors
    ///
    /// - `Token`: bad signature, wrong issuer/audience, or expired
    /// - `Authentication`: the subject is not a numeric user id
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = VALIDATION_LEEWAY_SECS;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)?.claims;
        let subject_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Authentication("Invalid session token".to_string()))?;

        Ok(SessionClaims {
            subject_id,
            employee_code: claims.pin,
            tenant_id: claims.tenant_id,
            privilege_level: claims.level,
            contact: claims.email,
        })
    }
}
