//! Check-in HTTP handlers.
//!
//! - GET /api/checkin/{employee_code} - Shift history
//! - GET /api/checkin/{employee_code}/{scan_date} - Raw scans of one date (`yyyyMMdd`)
//! - GET /api/checkin/morning-checkin - Earliest scan between 06:00 and 09:00
//! - POST /api/checkin - Check-in transition

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde_json::json;

use crate::{
    error::AppError,
    models::attendance::{
        AttendanceOutcome, CheckInRequest, MorningCheckInQuery, MorningCheckInResponse,
    },
    services::{session_token::SessionClaims, time_policy::format_server_time},
    state::AppState,
};

pub const DEVICE_ID_HEADER: &str = "X-Device-Id";

/// Morning window as (hour, minute) pairs, end exclusive.
const MORNING_FROM: (u32, u32) = (6, 0);
const MORNING_UNTIL: (u32, u32) = (9, 0);

/// Non-blank `X-Device-Id` header value.
pub fn device_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(DEVICE_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// List every shift of an employee, newest first.
///
/// # Response
///
/// - **Success (200 OK)**: array of `{ employee_id, pin, shift_date, check_in, check_out }`
/// - **Not found (404)**: `{ "success": false, "result": 0, "message": "..." }`
pub async fn history(
    State(state): State<AppState>,
    Path(employee_code): Path<i32>,
) -> Result<Response, AppError> {
    let shifts = state.attendance.ledger().history_for_pin(employee_code).await?;
    if shifts.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "result": 0,
                "message": "Attendance data not found",
            })),
        )
            .into_response());
    }

    Ok(Json(shifts).into_response())
}

/// Raw scans of one employee on one date.
pub async fn events_on_date(
    State(state): State<AppState>,
    Path((employee_code, scan_date)): Path<(i32, String)>,
) -> Result<Response, AppError> {
    let date = NaiveDate::parse_from_str(&scan_date, "%Y%m%d")
        .map_err(|_| AppError::Validation("scan_date must be formatted as yyyyMMdd".to_string()))?;

    let events = state.attendance.ledger().events_on(employee_code, date).await?;
    if events.is_empty() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    Ok(Json(events).into_response())
}

/// Earliest scan in `[06:00, 09:00)` of the given date.
///
/// Missing or malformed parameters are not errors: the answer is simply
/// `{ "success": false, "checkin_time": null }`.
pub async fn morning_check_in(
    State(state): State<AppState>,
    Query(query): Query<MorningCheckInQuery>,
) -> Result<Json<MorningCheckInResponse>, AppError> {
    let not_found = Json(MorningCheckInResponse {
        success: false,
        checkin_time: None,
    });

    let Some(pin) = query.pin.filter(|pin| *pin > 0) else {
        return Ok(not_found);
    };
    let Some(date) = query
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    else {
        return Ok(not_found);
    };
    let (Some(from), Some(until)) = (
        date.and_hms_opt(MORNING_FROM.0, MORNING_FROM.1, 0),
        date.and_hms_opt(MORNING_UNTIL.0, MORNING_UNTIL.1, 0),
    ) else {
        return Ok(not_found);
    };

    let earliest = state
        .attendance
        .ledger()
        .earliest_event_between(pin, from, until)
        .await?;

    Ok(match earliest {
        Some(scanned_at) => Json(MorningCheckInResponse {
            success: true,
            checkin_time: Some(format_server_time(scanned_at)),
        }),
        None => not_found,
    })
}

/// Check in.
///
/// # Endpoint
///
/// `POST /api/checkin`
///
/// # Headers
///
/// - `X-Device-Id` (optional): must match the employee's bound device
///
/// # Response
///
/// Business outcomes are always `200 OK` with a numeric `result`:
///
/// ```json
/// { "success": true, "result": 1, "message": "Check-in recorded", "data": { ... } }
/// ```
///
/// A body `pin` different from the session's is `403`.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    headers: HeaderMap,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<AttendanceOutcome>, AppError> {
    let outcome = state
        .attendance
        .check_in(&session, device_id(&headers), request)
        .await?;

    Ok(Json(outcome))
}
