//! Employee and login account models.

use serde::{Deserialize, Serialize};

/// An employee as seen by the attendance core.
///
/// `pin` is the short numeric code printed on badges and enrolled on the
/// biometric devices; it is the external attendance identifier.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Employee {
    pub id: i64,
    pub pin: i32,
    pub name: String,
    /// Device the employee's mobile app is bound to, if any.
    pub device_id: Option<String>,
    pub is_active: bool,
}

impl Employee {
    /// Device binding check.
    ///
    /// Fails when no device is registered or when it differs; callers only
    /// report a generic mismatch either way.
    pub fn device_matches(&self, device_id: &str) -> bool {
        self.device_id.as_deref() == Some(device_id)
    }
}

/// Roster entry returned by the employee endpoints.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct EmployeeProfile {
    pub id: i64,
    pub pin: i32,
    pub nip: Option<String>,
    pub name: String,
    pub birth_place: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub privilege: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub unit: Option<String>,
    pub division: Option<String>,
    pub employed_since: Option<chrono::NaiveDate>,
    pub gender: Option<String>,
    pub photo_path: Option<String>,
    pub device_id: Option<String>,
    pub is_active: bool,
}

/// Query string of `GET /api/employees/device-check`.
#[derive(Debug, Deserialize)]
pub struct DeviceCheckQuery {
    pub pin: Option<String>,
    pub device_id: Option<String>,
}

/// A login account.
///
/// # Database Table
///
/// Maps to the `users` table. `tenant_id` is the organizational unit the
/// user belongs to and ends up in the session token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAccount {
    pub user_id: i64,
    pub tenant_id: i64,
    pub pin: i32,
    pub email: String,
    /// Stored credential digest, see `services::password`.
    pub password_digest: String,
    pub level: i32,
    pub is_active: bool,
    pub is_verified: bool,
    pub device_id: Option<String>,
}

/// Request body for `POST /api/auth/login`.
///
/// Accepts the legacy `email`/`password` field names as aliases.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub identifier: String,

    #[serde(alias = "password")]
    pub secret: String,
}

/// Request body for `PUT /api/auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,

    #[serde(default)]
    pub new_password: String,
}

/// User section of the login response.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub user_id: i64,
    pub email: String,
    pub pin: i32,
    pub tenant_id: i64,
    pub level: i32,
    pub device_id: Option<String>,
}

impl From<&UserAccount> for LoginUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.user_id,
            email: account.email.clone(),
            pin: account.pin,
            tenant_id: account.tenant_id,
            level: account.level,
            device_id: account.device_id.clone(),
        }
    }
}

/// `data` section of a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}
