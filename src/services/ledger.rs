//! Attendance ledger: the append-only event log and the daily records.
//!
//! # Atomicity Guarantees
//!
//! Each `commit_*` operation appends one event and writes one daily record
//! inside a single PostgreSQL transaction. If the request future is dropped
//! mid-way the transaction is dropped with it and rolls back.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    db::{DbPool, normalize_timestamp},
    error::AppError,
    models::attendance::{
        AttendanceEvent, CheckInWrite, CheckOutWrite, DailyAttendanceRecord, ShiftSummary,
    },
};

#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Whether any scan exists for `pin` on `date`.
    async fn has_event_on(&self, pin: i32, date: NaiveDate) -> Result<bool, AppError>;

    async fn events_on(&self, pin: i32, date: NaiveDate) -> Result<Vec<AttendanceEvent>, AppError>;

    /// Check-out scans of `pin`, newest first, optionally limited to one date.
    async fn check_out_events(
        &self,
        pin: i32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEvent>, AppError>;

    async fn record_for(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<DailyAttendanceRecord>, AppError>;

    /// All daily records of `pin`, newest shift first.
    async fn history_for_pin(&self, pin: i32) -> Result<Vec<ShiftSummary>, AppError>;

    /// Earliest scan in `[start, end)`.
    async fn earliest_event_between(
        &self,
        pin: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, AppError>;

    /// Append the check-in event and upsert the daily record.
    async fn commit_check_in(
        &self,
        event: &AttendanceEvent,
        write: &CheckInWrite,
    ) -> Result<(), AppError>;

    /// Append the check-out event and update the existing daily record.
    async fn commit_check_out_update(
        &self,
        event: &AttendanceEvent,
        write: &CheckOutWrite,
    ) -> Result<(), AppError>;

    /// Append the check-out event and insert a record that starts checked out.
    async fn commit_check_out_insert(
        &self,
        event: &AttendanceEvent,
        write: &CheckOutWrite,
    ) -> Result<(), AppError>;
}

/// [`AttendanceLedger`] over `attendance_events` and `daily_attendance`.
#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str = r#"
    SELECT event_id, device_serial, pin, scanned_at, verify_mode, in_out_mode, reserved, work_code
    FROM attendance_events
"#;

async fn insert_event(
    conn: &mut sqlx::PgConnection,
    event: &AttendanceEvent,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO attendance_events (
            event_id, device_serial, pin, scanned_at, verify_mode, in_out_mode, reserved, work_code
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&event.event_id)
    .bind(&event.device_serial)
    .bind(event.pin)
    .bind(event.scanned_at)
    .bind(event.verify_mode)
    .bind(event.in_out_mode)
    .bind(event.reserved)
    .bind(event.work_code)
    .execute(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Event {} already recorded", event.event_id))
        }
        other => AppError::Database(other),
    })?;

    Ok(())
}

#[async_trait]
impl AttendanceLedger for PgLedger {
    async fn has_event_on(&self, pin: i32, date: NaiveDate) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM attendance_events WHERE pin = $1 AND scanned_at::date = $2)",
        )
        .bind(pin)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn events_on(&self, pin: i32, date: NaiveDate) -> Result<Vec<AttendanceEvent>, AppError> {
        let sql = format!("{EVENT_COLUMNS} WHERE pin = $1 AND scanned_at::date = $2 ORDER BY scanned_at");
        let events = sqlx::query_as::<_, AttendanceEvent>(&sql)
            .bind(pin)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn check_out_events(
        &self,
        pin: i32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEvent>, AppError> {
        let sql = format!(
            "{EVENT_COLUMNS} WHERE pin = $1 AND in_out_mode = 1 \
             AND ($2::date IS NULL OR scanned_at::date = $2) ORDER BY scanned_at DESC"
        );
        let events = sqlx::query_as::<_, AttendanceEvent>(&sql)
            .bind(pin)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn record_for(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<DailyAttendanceRecord>, AppError> {
        let record = sqlx::query_as::<_, DailyAttendanceRecord>(
            r#"
            SELECT employee_id, shift_date, check_in, check_out, check_in_event_id,
                   check_out_event_id, leave_type, late, late_minutes, worked_minutes
            FROM daily_attendance
            WHERE employee_id = $1 AND shift_date = $2
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(DailyAttendanceRecord::normalized))
    }

    async fn history_for_pin(&self, pin: i32) -> Result<Vec<ShiftSummary>, AppError> {
        let rows = sqlx::query_as::<_, ShiftSummary>(
            r#"
            SELECT d.employee_id, e.pin, d.shift_date, d.check_in, d.check_out
            FROM daily_attendance d
            INNER JOIN employees e ON e.id = d.employee_id
            WHERE e.pin = $1
            ORDER BY d.shift_date DESC
            "#,
        )
        .bind(pin)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ShiftSummary::normalized).collect())
    }

    async fn earliest_event_between(
        &self,
        pin: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, AppError> {
        let earliest = sqlx::query_scalar::<_, Option<NaiveDateTime>>(
            "SELECT MIN(scanned_at) FROM attendance_events WHERE pin = $1 AND scanned_at >= $2 AND scanned_at < $3",
        )
        .bind(pin)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(normalize_timestamp(earliest))
    }

    async fn commit_check_in(
        &self,
        event: &AttendanceEvent,
        write: &CheckInWrite,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        insert_event(&mut *tx, event).await?;

        sqlx::query(
            r#"
            INSERT INTO daily_attendance (
                employee_id, shift_date, check_in, check_in_event_id, late, late_minutes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (employee_id, shift_date) DO UPDATE
            SET check_in = EXCLUDED.check_in,
                check_in_event_id = EXCLUDED.check_in_event_id,
                late = EXCLUDED.late,
                late_minutes = EXCLUDED.late_minutes,
                updated_at = NOW()
            "#,
        )
        .bind(write.employee_id)
        .bind(write.shift_date)
        .bind(write.check_in)
        .bind(&write.event_id)
        .bind(write.late)
        .bind(write.late_minutes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn commit_check_out_update(
        &self,
        event: &AttendanceEvent,
        write: &CheckOutWrite,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        insert_event(&mut *tx, event).await?;

        let updated = sqlx::query(
            r#"
            UPDATE daily_attendance
            SET check_out = $1,
                check_out_event_id = $2,
                worked_minutes = $3,
                updated_at = NOW()
            WHERE employee_id = $4 AND shift_date = $5
              AND (check_out IS NULL OR check_out < '1000-01-01')
            "#,
        )
        .bind(write.check_out)
        .bind(&write.event_id)
        .bind(write.worked_minutes)
        .bind(write.employee_id)
        .bind(write.shift_date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict("Check-out already recorded".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_check_out_insert(
        &self,
        event: &AttendanceEvent,
        write: &CheckOutWrite,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        insert_event(&mut *tx, event).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO daily_attendance (
                employee_id, shift_date, check_out, check_out_event_id, worked_minutes
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, shift_date) DO NOTHING
            "#,
        )
        .bind(write.employee_id)
        .bind(write.shift_date)
        .bind(write.check_out)
        .bind(&write.event_id)
        .bind(write.worked_minutes)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict("Daily record already exists".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}
