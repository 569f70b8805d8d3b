//! Attendance data models and API request/response types.
//!
//! This module defines:
//! - `ResultCode`: the numeric codes clients branch on
//! - `AttendanceEvent`: one immutable raw scan
//! - `DailyAttendanceRecord`: the per-(employee, shift date) state
//! - Request bodies for check-in and check-out and the transition outcome

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::db::normalize_timestamp;

/// Numeric result code carried by every attendance transition response.
///
/// Check-in and check-out share the numeric space; a few numbers mean
/// different windows depending on the action (see the constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultCode(pub u8);

impl ResultCode {
    pub const SUCCESS: Self = Self(1);

    /// Check-in between 09:00 and 12:00.
    pub const CHECK_IN_LATE_MORNING: Self = Self(2);
    /// Check-out between 07:30 and 15:59.
    pub const CHECK_OUT_MORNING_MIDDAY: Self = Self(2);
    /// Check-in between 12:01 and 15:59.
    pub const CHECK_IN_MIDDAY: Self = Self(3);
    /// Check-in between 18:00 and 24:00; also the disabled check-out evening window.
    pub const OUTSIDE_NIGHT: Self = Self(4);
    /// Either action between 00:00 and 07:29.
    pub const OUTSIDE_PRE_DAWN: Self = Self(5);
    pub const EMPLOYEE_NOT_FOUND: Self = Self(6);
    /// Already checked in (check-in) or already checked out (check-out).
    pub const ALREADY_RECORDED: Self = Self(7);
    pub const ON_LEAVE: Self = Self(8);
    /// Check-in between 16:00 and 17:59.
    pub const CHECK_IN_EARLY_EVENING: Self = Self(9);
    pub const DEVICE_MISMATCH: Self = Self(10);
}

/// One raw scan, as appended to `attendance_events`.
///
/// Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct AttendanceEvent {
    /// Externally visible identifier consumed by other subsystems.
    pub event_id: String,
    /// Serial number of the scanning device (or the app's device id).
    pub device_serial: String,
    pub pin: i32,
    pub scanned_at: NaiveDateTime,
    pub verify_mode: i32,
    /// Direction flag: 0 in, 1 out.
    pub in_out_mode: i32,
    pub reserved: i32,
    pub work_code: i32,
}

/// Daily attendance state of one employee.
///
/// # Database Table
///
/// Maps to `daily_attendance`, unique on `(employee_id, shift_date)`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct DailyAttendanceRecord {
    pub employee_id: i64,
    pub shift_date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub check_in_event_id: Option<String>,
    pub check_out_event_id: Option<String>,
    /// 0 when no leave is granted for the date.
    pub leave_type: i16,
    pub late: bool,
    pub late_minutes: i32,
    pub worked_minutes: i32,
}

impl DailyAttendanceRecord {
    /// Apply zero-sentinel normalization to both timestamps.
    pub fn normalized(mut self) -> Self {
        self.check_in = normalize_timestamp(self.check_in);
        self.check_out = normalize_timestamp(self.check_out);
        self
    }

    pub fn on_leave(&self) -> bool {
        self.leave_type != 0
    }

    pub fn checked_out(&self) -> bool {
        self.check_out.is_some()
    }

    /// Either side of the shift already recorded.
    pub fn has_scan(&self) -> bool {
        self.check_in.is_some() || self.check_out.is_some()
    }
}

/// Check-in/check-out pair listed by `GET /api/checkin/{employee_code}`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct ShiftSummary {
    pub employee_id: i64,
    pub pin: i32,
    pub shift_date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
}

impl ShiftSummary {
    pub fn normalized(mut self) -> Self {
        self.check_in = normalize_timestamp(self.check_in);
        self.check_out = normalize_timestamp(self.check_out);
        self
    }
}

/// Request body for `POST /api/checkin`.
///
/// # JSON Example
///
/// ```json
/// {
///   "pin": 1813,
///   "device_serial": "A8N5230560263",
///   "verify_mode": 1,
///   "in_out_mode": 0,
///   "event_id": "",
///   "shift_date": "2026-01-08",
///   "scan_time": "2026-01-08T08:45:00"
/// }
/// ```
///
/// `shift_date` and `scan_time` default to the server's local date and time.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub pin: i32,

    #[serde(default, alias = "sn")]
    pub device_serial: String,

    #[serde(default)]
    pub verify_mode: i32,

    #[serde(default)]
    pub in_out_mode: i32,

    #[serde(default)]
    pub reserved: i32,

    #[serde(default)]
    pub work_code: i32,

    /// Client-generated event id; generated server-side when blank.
    #[serde(default)]
    pub event_id: String,

    pub shift_date: Option<NaiveDate>,

    pub scan_time: Option<NaiveDateTime>,
}

/// Request body for `POST /api/checkout`.
///
/// Identity always comes from the session token. Legacy clients still send
/// `pin`, `employee_id` and scan metadata; those fields are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckOutRequest {
    #[serde(default, alias = "sn")]
    pub device_serial: Option<String>,
}

/// Values written to the daily record by a successful check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInWrite {
    pub employee_id: i64,
    pub shift_date: NaiveDate,
    pub check_in: NaiveDateTime,
    pub event_id: String,
    pub late: bool,
    pub late_minutes: i32,
}

/// Values written to the daily record by a successful check-out.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutWrite {
    pub employee_id: i64,
    pub shift_date: NaiveDate,
    pub check_out: NaiveDateTime,
    pub event_id: String,
    /// Minutes since check-in, 0 when there was none.
    pub worked_minutes: i32,
}

/// Scan details echoed back on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedScan {
    pub event_id: String,
    pub recorded_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late: Option<bool>,
}

/// Response body of a check-in or check-out transition.
///
/// Always sent with HTTP 200; `success` and `result` carry the decision.
///
/// ```json
/// { "success": false, "result": 7, "message": "You have already checked in today" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceOutcome {
    pub success: bool,
    pub result: ResultCode,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RecordedScan>,
}

impl AttendanceOutcome {
    pub fn rejected(result: ResultCode, message: &'static str) -> Self {
        Self {
            success: false,
            result,
            message,
            data: None,
        }
    }

    pub fn accepted(message: &'static str, scan: RecordedScan) -> Self {
        Self {
            success: true,
            result: ResultCode::SUCCESS,
            message,
            data: Some(scan),
        }
    }
}

/// Query string of `GET /api/checkin/morning-checkin`.
#[derive(Debug, Deserialize)]
pub struct MorningCheckInQuery {
    pub pin: Option<i32>,
    /// `yyyy-MM-dd`
    pub date: Option<String>,
}

/// Response of `GET /api/checkin/morning-checkin`.
#[derive(Debug, Serialize)]
pub struct MorningCheckInResponse {
    pub success: bool,
    /// `yyyy-MM-dd HH:mm:ss`
    pub checkin_time: Option<String>,
}

/// Query string of `GET /api/checkout/{employee_code}`.
#[derive(Debug, Deserialize)]
pub struct CheckOutHistoryQuery {
    /// `yyyy-MM-dd`; all dates when absent.
    pub date: Option<NaiveDate>,
}
