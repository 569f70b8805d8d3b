//! API client model for tenant authentication.
//!
//! Each organizational tenant receives its own API key. Keys are stored as
//! SHA-256 hashes together with the tenant's origin/IP policy and quota.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents an API client record from the database.
///
/// # Database Table
///
/// Maps to the `api_clients` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `name`: Display name of the tenant
/// - `prefix`: Route prefix assigned to the tenant
/// - `key_hash`: SHA-256 hash of the actual API key (hex)
/// - `is_active`: Whether the key is currently valid
/// - `allowed_origins` / `allowed_ips`: optional allow-lists
/// - `rate_limit`: requests per minute, 0 disables the quota
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiClient {
    pub id: Uuid,

    pub name: String,

    pub prefix: String,

    /// SHA-256 hash of the actual API key (64 hex characters)
    pub key_hash: String,

    /// Inactive clients are rejected during admission.
    pub is_active: bool,

    /// Either a JSON array (`["https://a", "https://b"]`) or a comma-separated list.
    pub allowed_origins: Option<String>,

    /// Addresses and CIDR blocks, same encoding as `allowed_origins`.
    pub allowed_ips: Option<String>,

    pub rate_limit: i32,

    pub created_at: DateTime<Utc>,
}

impl ApiClient {
    /// Parsed origin allow-list. Empty means any origin is accepted.
    pub fn origin_allowlist(&self) -> Vec<String> {
        self.allowed_origins
            .as_deref()
            .map(parse_list)
            .unwrap_or_default()
    }

    /// Parsed IP/CIDR allow-list. Empty means any address is accepted.
    pub fn ip_allowlist(&self) -> Vec<String> {
        self.allowed_ips.as_deref().map(parse_list).unwrap_or_default()
    }
}

/// Parse an allow-list column.
///
/// Values starting with `[` are read as a JSON string array; if that fails,
/// or for any other value, the text is split on commas. Entries are trimmed
/// and blanks dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if raw.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
            return items
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect();
        }
    }

    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let list = parse_list(r#"["https://a.example", " ", " https://b.example "]"#);
        assert_eq!(list, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn parses_comma_separated_list() {
        let list = parse_list("10.0.0.0/24, 192.168.1.7,,");
        assert_eq!(list, vec!["10.0.0.0/24", "192.168.1.7"]);
    }

    #[test]
    fn malformed_json_falls_back_to_commas() {
        let list = parse_list("[not json, 10.0.0.1");
        assert_eq!(list, vec!["[not json", "10.0.0.1"]);
    }

    #[test]
    fn blank_column_means_no_allowlist() {
        assert!(parse_list("   ").is_empty());
    }
}
