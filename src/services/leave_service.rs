use crate::{db::DbPool, error::AppError, models::leave::LeaveEntry};

/// Latest revision of every leave request of `employee_id`, newest sequence first.
pub async fn list_for_employee(pool: &DbPool, employee_id: i64) -> Result<Vec<LeaveEntry>, AppError> {
    let entries = sqlx::query_as::<_, LeaveEntry>(
        r#"
        SELECT r.leave_id, r.employee_id, r.submitted_at, r.leave_date, r.leave_type_id,
               t.name AS leave_type_name, c.name AS category_name, r.note, r.status,
               r.left_from, r.left_until, r.annual_leave_id, r.other_reason,
               r.missed_scan_time, r.category_id, r.status_note, r.file_name,
               r.file_extension, r.file_size, r.file_path, r.sequence
        FROM leave_requests r
        INNER JOIN (
            SELECT MAX(leave_id) AS leave_id
            FROM leave_requests
            WHERE employee_id = $1
            GROUP BY sequence
        ) latest ON latest.leave_id = r.leave_id
        INNER JOIN leave_types t ON t.id = r.leave_type_id
        LEFT JOIN leave_categories c ON c.id = r.category_id
        ORDER BY r.sequence DESC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
