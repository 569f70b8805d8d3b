//! API key lookup for the admission gate.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::{db::DbPool, error::AppError, models::api_client::ApiClient};

/// Resolves a hashed API key to its client record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an active client by the SHA-256 hex digest of its key.
    async fn find_active_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiClient>, AppError>;
}

/// Hash a raw API key the way it is stored (lowercase hex SHA-256).
pub fn hash_api_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// [`CredentialStore`] backed by the `api_clients` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_active_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiClient>, AppError> {
        let client = sqlx::query_as::<_, ApiClient>(
            r#"
            SELECT id, name, prefix, key_hash, is_active, allowed_origins, allowed_ips,
                   rate_limit, created_at
            FROM api_clients
            WHERE key_hash = $1 AND is_active = true
            LIMIT 1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
