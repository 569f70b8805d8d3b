//! Check-out HTTP handlers.
//!
//! - GET /api/checkout/{employee_code} - Check-out scan history
//! - POST /api/checkout - Check-out transition

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};

use crate::{
    error::AppError,
    handlers::checkin::device_id,
    models::{
        ApiResponse,
        attendance::{AttendanceEvent, AttendanceOutcome, CheckOutHistoryQuery, CheckOutRequest},
    },
    services::session_token::SessionClaims,
    state::AppState,
};

/// Check-out scans of an employee, newest first, optionally for one `date`.
pub async fn history(
    State(state): State<AppState>,
    Path(employee_code): Path<i32>,
    Query(query): Query<CheckOutHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<AttendanceEvent>>>, AppError> {
    let events = state
        .attendance
        .ledger()
        .check_out_events(employee_code, query.date)
        .await?;

    Ok(Json(ApiResponse::ok("Check-out history loaded", events)))
}

/// Check out.
///
/// # Endpoint
///
/// `POST /api/checkout`
///
/// The employee is always the session's; the body only carries optional
/// scan metadata. Outcomes are `200 OK` with a numeric `result`, like check-in.
pub async fn check_out(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    headers: HeaderMap,
    request: Option<Json<CheckOutRequest>>,
) -> Result<Json<AttendanceOutcome>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let outcome = state
        .attendance
        .check_out(&session, device_id(&headers), request)
        .await?;

    Ok(Json(outcome))
}
