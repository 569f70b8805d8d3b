//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `JWT_KEY` (required): HMAC secret used to sign session tokens
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `JWT_ISSUER` / `JWT_AUDIENCE` (optional): token issuer and audience
/// - `LOGIN_RATE_LIMIT` (optional): login requests per client and IP per minute, defaults to 10
/// - `MONITOR_MAX_CONCURRENCY` (optional): simultaneous device probes, defaults to 50
/// - `MONITOR_PROBE_TIMEOUT_MS` (optional): timeout of a single probe, defaults to 1500
/// - `COUNTER_SWEEP_SECS` (optional): interval between expired-counter sweeps, defaults to 60
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    pub jwt_key: String,

    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,

    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u64,

    #[serde(default = "default_monitor_concurrency")]
    pub monitor_max_concurrency: usize,

    #[serde(default = "default_probe_timeout_ms")]
    pub monitor_probe_timeout_ms: u64,

    #[serde(default = "default_sweep_secs")]
    pub counter_sweep_secs: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_issuer() -> String {
    "attendance-api".to_string()
}

fn default_audience() -> String {
    "attendance-clients".to_string()
}

fn default_login_rate_limit() -> u64 {
    10
}

fn default_monitor_concurrency() -> usize {
    50
}

fn default_probe_timeout_ms() -> u64 {
    1500
}

fn default_sweep_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_KEY)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Build a configuration from explicit key/value pairs.
    ///
    /// Used by tests to exercise the same defaults as `from_env` without
    /// touching the process environment.
    #[cfg(test)]
    pub fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let config = Config::from_pairs([
            ("DATABASE_URL".to_string(), "postgres://localhost/attendance".to_string()),
            ("JWT_KEY".to_string(), "secret".to_string()),
        ])
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.login_rate_limit, 10);
        assert_eq!(config.monitor_max_concurrency, 50);
        assert_eq!(config.monitor_probe_timeout_ms, 1500);
        assert_eq!(config.jwt_issuer, "attendance-api");
    }

    #[test]
    fn missing_jwt_key_is_rejected() {
        let result = Config::from_pairs([(
            "DATABASE_URL".to_string(),
            "postgres://localhost/attendance".to_string(),
        )]);

        assert!(result.is_err());
    }
}
