//! Field task storage.
//!
//! Time-of-day gating lives in `time_policy`; the handlers call it before
//! anything here.

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    db::DbPool,
    error::AppError,
    models::field_task::{
        CreateFieldTaskRequest, FieldTask, STATUS_NEW, UpdateFieldTaskRequest,
    },
};

const TASK_COLUMNS: &str = r#"
    SELECT id, employee_id, task_date, destination, description, address, latitude,
           longitude, status, file_name, file_extension, file_size, file_path
    FROM field_tasks
"#;

/// Tasks of `employee_id`, newest first. `end` is exclusive.
pub async fn list(
    pool: &DbPool,
    employee_id: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<FieldTask>, AppError> {
    let sql = format!(
        "{TASK_COLUMNS} WHERE employee_id = $1 \
         AND ($2::date IS NULL OR task_date >= $2) \
         AND ($3::date IS NULL OR task_date < $3) \
         ORDER BY task_date DESC"
    );
    let tasks = sqlx::query_as::<_, FieldTask>(&sql)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(tasks)
}

/// Whether the daily record for `date` carries a check-in or check-out event.
pub async fn has_attendance_on(
    pool: &DbPool,
    employee_id: i64,
    date: NaiveDate,
) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM daily_attendance
            WHERE employee_id = $1 AND shift_date = $2
              AND (COALESCE(check_in_event_id, '') NOT IN ('', '0')
                   OR COALESCE(check_out_event_id, '') NOT IN ('', '0'))
        )
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn has_task_on(pool: &DbPool, employee_id: i64, date: NaiveDate) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM field_tasks WHERE employee_id = $1 AND task_date::date = $2)",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Store a new task with status "new" and return its id.
pub async fn insert(
    pool: &DbPool,
    employee_id: i64,
    task_date: NaiveDateTime,
    request: &CreateFieldTaskRequest,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO field_tasks (
            employee_id, task_date, destination, description, address, latitude, longitude,
            status, file_name, file_extension, file_size, file_path
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(employee_id)
    .bind(task_date)
    .bind(&request.destination)
    .bind(&request.description)
    .bind(&request.address)
    .bind(&request.latitude)
    .bind(&request.longitude)
    .bind(STATUS_NEW)
    .bind(&request.photo.file_name)
    .bind(&request.photo.file_extension)
    .bind(request.photo.file_size.to_string())
    .bind(&request.photo.file_path)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn find_for_owner(
    pool: &DbPool,
    id: i64,
    employee_id: i64,
) -> Result<Option<FieldTask>, AppError> {
    let sql = format!("{TASK_COLUMNS} WHERE id = $1 AND employee_id = $2");
    let task = sqlx::query_as::<_, FieldTask>(&sql)
        .bind(id)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?;

    Ok(task)
}

/// Apply the present fields while the task is still "new".
///
/// Returns `false` when no row matched, i.e. the task was verified meanwhile.
pub async fn update_if_new(
    pool: &DbPool,
    id: i64,
    employee_id: i64,
    request: &UpdateFieldTaskRequest,
) -> Result<bool, AppError> {
    let photo = request.photo.as_ref();
    let updated = sqlx::query(
        r#"
        UPDATE field_tasks
        SET task_date = COALESCE($4, task_date),
            destination = COALESCE($5, destination),
            description = COALESCE($6, description),
            address = COALESCE($7, address),
            latitude = COALESCE($8, latitude),
            longitude = COALESCE($9, longitude),
            file_name = COALESCE($10, file_name),
            file_extension = COALESCE($11, file_extension),
            file_size = COALESCE($12, file_size),
            file_path = COALESCE($13, file_path)
        WHERE id = $1 AND employee_id = $2 AND status = $3
        "#,
    )
    .bind(id)
    .bind(employee_id)
    .bind(STATUS_NEW)
    .bind(request.task_date)
    .bind(request.destination.as_deref())
    .bind(request.description.as_deref())
    .bind(request.address.as_deref())
    .bind(request.latitude.as_deref())
    .bind(request.longitude.as_deref())
    .bind(photo.map(|p| p.file_name.as_str()))
    .bind(photo.map(|p| p.file_extension.as_str()))
    .bind(photo.map(|p| p.file_size.to_string()))
    .bind(photo.map(|p| p.file_path.as_str()))
    .execute(pool)
    .await?
    .rows_affected();

    Ok(updated > 0)
}
