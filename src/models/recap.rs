//! Monthly attendance recap models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Query string of `GET /api/monthly-recap`.
///
/// Either `start` and `end` together, or a `year` (defaults to the current one).
#[derive(Debug, Deserialize)]
pub struct RecapQuery {
    pub year: Option<i32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub exclude_weekend: Option<bool>,
}

/// Aggregate for one employee and one calendar month.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MonthlyRecap {
    pub employee_id: i64,
    pub pin: i32,
    pub name: String,
    /// `yyyy-MM`
    pub period: String,
    pub calendar_days: i64,
    pub holidays: i64,
    pub working_days: i64,
    pub present: i64,
    pub on_leave: i64,
    pub absent: i64,
    pub worked_minutes: i64,
    pub worked_hours: f64,
    /// Present days over working days, in percent; `None` when there are no working days.
    pub attendance_percentage: Option<f64>,
}
