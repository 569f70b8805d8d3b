//! Monthly attendance recap.
//!
//! Builds a calendar over the requested range, drops weekends when asked,
//! and aggregates holidays, daily records and approved leave per month.

use chrono::{Datelike, NaiveDate};

use crate::{
    db::DbPool,
    error::AppError,
    models::recap::{MonthlyRecap, RecapQuery},
};

/// Longest range accepted in one request.
pub const MAX_RANGE_DAYS: i64 = 1000;

/// Resolve the query into `(start, end, exclude_weekend)`.
///
/// Explicit `start` and `end` win when both are present; otherwise the whole
/// calendar `year` is used, defaulting to the year of `today`.
pub fn resolve_range(
    query: &RecapQuery,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate, bool), AppError> {
    let (start, end) = match (query.start, query.end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            let year = query.year.unwrap_or_else(|| today.year());
            let start = NaiveDate::from_ymd_opt(year, 1, 1);
            let end = NaiveDate::from_ymd_opt(year, 12, 31);
            match start.zip(end) {
                Some(range) => range,
                None => return Err(AppError::Validation(format!("Invalid year: {year}"))),
            }
        }
    };

    if end < start {
        return Err(AppError::Validation("end must not be before start".to_string()));
    }

    if (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "Range may not exceed {MAX_RANGE_DAYS} days"
        )));
    }

    Ok((start, end, query.exclude_weekend.unwrap_or(true)))
}

/// Per-month recap of one employee over `[start, end]`.
pub async fn monthly_recap(
    pool: &DbPool,
    employee_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    exclude_weekend: bool,
) -> Result<Vec<MonthlyRecap>, AppError> {
    let rows = sqlx::query_as::<_, MonthlyRecap>(
        r#"
        WITH calendar AS (
            SELECT day::date AS day
            FROM generate_series($2::date, $3::date, INTERVAL '1 day') AS day
            WHERE NOT $4 OR EXTRACT(ISODOW FROM day) < 6
        ),
        days AS (
            SELECT
                c.day,
                h.holiday_date IS NOT NULL AS is_holiday,
                CASE WHEN d.check_in < '1000-01-01' THEN NULL ELSE d.check_in END AS check_in,
                CASE WHEN d.check_out < '1000-01-01' THEN NULL ELSE d.check_out END AS check_out,
                COALESCE(d.worked_minutes, 0) AS worked_minutes,
                EXISTS (
                    SELECT 1 FROM leave_requests r
                    WHERE r.employee_id = $1 AND r.leave_date = c.day AND r.status = 1
                ) AS on_leave
            FROM calendar c
            LEFT JOIN holidays h ON h.holiday_date = c.day
            LEFT JOIN daily_attendance d ON d.employee_id = $1 AND d.shift_date = c.day
        ),
        months AS (
            SELECT
                to_char(day, 'YYYY-MM') AS period,
                COUNT(*)::bigint AS calendar_days,
                COUNT(*) FILTER (WHERE is_holiday)::bigint AS holidays,
                COUNT(*) FILTER (WHERE NOT is_holiday AND check_in IS NOT NULL)::bigint AS present,
                COUNT(*) FILTER (WHERE NOT is_holiday AND on_leave)::bigint AS on_leave,
                COUNT(*) FILTER (
                    WHERE NOT is_holiday AND check_in IS NULL AND NOT on_leave
                )::bigint AS absent,
                COALESCE(SUM(
                    CASE
                        WHEN worked_minutes > 0 THEN worked_minutes
                        WHEN check_in IS NOT NULL AND check_out IS NOT NULL
                            THEN (EXTRACT(EPOCH FROM (check_out - check_in)) / 60)::bigint
                        ELSE 0
                    END
                ), 0)::bigint AS worked_minutes
            FROM days
            GROUP BY to_char(day, 'YYYY-MM')
        )
        SELECT
            e.id AS employee_id,
            e.pin,
            e.name,
            m.period,
            m.calendar_days,
            m.holidays,
            (m.calendar_days - m.holidays) AS working_days,
            m.present,
            m.on_leave,
            m.absent,
            m.worked_minutes,
            ROUND(m.worked_minutes::numeric / 60, 2)::float8 AS worked_hours,
            ROUND(100 * m.present::numeric / NULLIF(m.calendar_days - m.holidays, 0), 2)::float8
                AS attendance_percentage
        FROM months m
        INNER JOIN employees e ON e.id = $1
        ORDER BY m.period
        "#,
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .bind(exclude_weekend)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn query(year: Option<i32>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> RecapQuery {
        RecapQuery {
            year,
            start,
            end,
            exclude_weekend: None,
        }
    }

    #[test]
    fn defaults_to_current_calendar_year() {
        let (start, end, exclude_weekend) =
            resolve_range(&query(None, None, None), date(2026, 3, 14)).unwrap();

        assert_eq!(start, date(2026, 1, 1));
        assert_eq!(end, date(2026, 12, 31));
        assert!(exclude_weekend);
    }

    #[test]
    fn explicit_range_wins_over_year() {
        let (start, end, _) = resolve_range(
            &query(Some(2020), Some(date(2026, 1, 1)), Some(date(2026, 1, 31))),
            date(2026, 3, 14),
        )
        .unwrap();

        assert_eq!((start, end), (date(2026, 1, 1), date(2026, 1, 31)));
    }

    #[test]
    fn half_open_range_falls_back_to_year() {
        let (start, end, _) =
            resolve_range(&query(Some(2025), Some(date(2026, 1, 1)), None), date(2026, 3, 14))
                .unwrap();

        assert_eq!((start, end), (date(2025, 1, 1), date(2025, 12, 31)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = resolve_range(
            &query(None, Some(date(2026, 2, 1)), Some(date(2026, 1, 1))),
            date(2026, 3, 14),
        );

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn oversized_range_is_rejected() {
        let result = resolve_range(
            &query(None, Some(date(2020, 1, 1)), Some(date(2026, 1, 1))),
            date(2026, 3, 14),
        );

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
