//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Running database migrations automatically
//! - Normalizing legacy "zero" timestamps read back from the store

use chrono::{Datelike, NaiveDateTime};
use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each migration runs only once.
///
/// # Errors
///
/// Returns an error if:
/// - Migration files cannot be read
/// - SQL syntax errors in migration files
/// - Database errors during migration execution
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map the legacy "zero" timestamp sentinel to `None`.
///
/// Rows migrated from the old store carry `0000-00-00 00:00:00`-style values
/// (clamped to year 1 by the import) where no scan happened. Anything before
/// year 1000 is treated as absent.
pub fn normalize_timestamp(value: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    value.filter(|ts| ts.year() >= 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn zero_sentinel_reads_as_none() {
        let zero = NaiveDate::from_ymd_opt(1, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let real = NaiveDate::from_ymd_opt(2026, 1, 8)
            .unwrap()
            .and_hms_opt(8, 45, 0)
            .unwrap();

        assert_eq!(normalize_timestamp(Some(zero)), None);
        assert_eq!(normalize_timestamp(Some(real)), Some(real));
        assert_eq!(normalize_timestamp(None), None);
    }
}
