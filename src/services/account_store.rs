//! Login account storage.

use async_trait::async_trait;

use crate::{db::DbPool, error::AppError, models::employee::UserAccount};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by its normalized (trimmed, lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError>;

    async fn find_by_pin(&self, pin: i32) -> Result<Option<UserAccount>, AppError>;

    /// Replace the stored digest. Returns whether a row was updated.
    async fn update_password(&self, user_id: i64, password_digest: &str) -> Result<bool, AppError>;
}

const ACCOUNT_COLUMNS: &str = r#"
    SELECT u.user_id, u.tenant_id, u.pin, u.email, u.password_digest, u.level,
           u.is_active, u.is_verified, e.device_id
    FROM users u
    LEFT JOIN employees e ON e.pin = u.pin
"#;

/// [`AccountStore`] backed by the `users` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: DbPool,
}

impl PgAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        let sql = format!("{ACCOUNT_COLUMNS} WHERE LOWER(u.email) = $1 LIMIT 1");
        let account = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_pin(&self, pin: i32) -> Result<Option<UserAccount>, AppError> {
        let sql = format!("{ACCOUNT_COLUMNS} WHERE u.pin = $1 ORDER BY u.user_id LIMIT 1");
        let account = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(pin)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn update_password(&self, user_id: i64, password_digest: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_digest = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(password_digest)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
