//! Employee roster queries.
//!
//! The attendance core only needs [`EmployeeDirectory::find_by_pin`]; the
//! roster endpoints read profiles directly from the pool.

use async_trait::async_trait;

use crate::{
    db::DbPool,
    error::AppError,
    models::employee::{Employee, EmployeeProfile},
};

/// Resolves employees for attendance transitions.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_by_pin(&self, pin: i32) -> Result<Option<Employee>, AppError>;
}

/// [`EmployeeDirectory`] backed by the `employees` table.
#[derive(Clone)]
pub struct PgEmployeeDirectory {
    pool: DbPool,
}

impl PgEmployeeDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for PgEmployeeDirectory {
    async fn find_by_pin(&self, pin: i32) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT id, pin, name, device_id, is_active FROM employees WHERE pin = $1 LIMIT 1",
        )
        .bind(pin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}

const PROFILE_COLUMNS: &str = r#"
    SELECT id, pin, nip, name, birth_place, birth_date, privilege, phone, position,
           unit, division, employed_since, gender, photo_path, device_id, is_active
    FROM employees
"#;

/// List every employee ordered by pin.
pub async fn list_profiles(pool: &DbPool) -> Result<Vec<EmployeeProfile>, AppError> {
    let sql = format!("{PROFILE_COLUMNS} ORDER BY pin");
    let profiles = sqlx::query_as::<_, EmployeeProfile>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(profiles)
}

pub async fn find_profile(pool: &DbPool, pin: i32) -> Result<Option<EmployeeProfile>, AppError> {
    let sql = format!("{PROFILE_COLUMNS} WHERE pin = $1 LIMIT 1");
    let profile = sqlx::query_as::<_, EmployeeProfile>(&sql)
        .bind(pin)
        .fetch_optional(pool)
        .await?;

    Ok(profile)
}

/// Find the employee bound to exactly this (pin, device) pair.
pub async fn find_by_device(
    pool: &DbPool,
    pin: i32,
    device_id: &str,
) -> Result<Option<Employee>, AppError> {
    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, pin, name, device_id, is_active
        FROM employees
        WHERE pin = $1 AND device_id = $2
        LIMIT 1
        "#,
    )
    .bind(pin)
    .bind(device_id)
    .fetch_optional(pool)
    .await?;

    Ok(employee)
}
