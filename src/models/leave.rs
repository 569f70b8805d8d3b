//! Leave request models.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Latest revision of one leave request.
///
/// # Database Table
///
/// Built from `leave_requests` joined with `leave_types` and
/// `leave_categories`. Several revisions of a request share a `sequence`;
/// only the newest one is listed.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LeaveEntry {
    pub leave_id: i64,
    pub employee_id: i64,
    pub submitted_at: Option<NaiveDateTime>,
    pub leave_date: Option<NaiveDate>,
    pub leave_type_id: i16,
    pub leave_type_name: String,
    pub category_name: Option<String>,
    pub note: Option<String>,
    /// 0 pending, 1 approved, 2 rejected.
    pub status: i16,
    pub left_from: Option<NaiveTime>,
    pub left_until: Option<NaiveTime>,
    pub annual_leave_id: Option<i32>,
    pub other_reason: Option<String>,
    pub missed_scan_time: Option<NaiveTime>,
    pub category_id: Option<i32>,
    pub status_note: Option<String>,
    pub file_name: Option<String>,
    pub file_extension: Option<String>,
    pub file_size: Option<String>,
    pub file_path: Option<String>,
    pub sequence: i64,
}
