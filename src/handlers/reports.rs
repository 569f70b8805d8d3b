//! Read-only reporting handlers.
//!
//! - GET /api/leave/employee/{id} - Leave requests of an employee
//! - GET /api/monthly-recap - Monthly attendance recap of the session employee
//! - GET /api/monitor/devices - Device liveness

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::{
        ApiResponse,
        device::{DeviceStatus, MonitorQuery, MonitorResponse},
        recap::{MonthlyRecap, RecapQuery},
    },
    services::{leave_service, monitor_service, recap_service, session_token::SessionClaims},
    state::AppState,
};

/// Latest revision of each leave request.
///
/// - **400** when `id <= 0`
/// - **204** when the employee has no leave requests
pub async fn employee_leave(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> Result<Response, AppError> {
    if employee_id <= 0 {
        return Err(AppError::Validation("Invalid employee id".to_string()));
    }

    let entries = leave_service::list_for_employee(&state.pool, employee_id).await?;
    if entries.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(ApiResponse::ok("Leave requests loaded", entries)).into_response())
}

/// Per-month recap for the session's employee.
///
/// # Query
///
/// `start` and `end` (both required to take effect), otherwise `year`
/// (current year by default); `exclude_weekend` defaults to `true`.
pub async fn monthly_recap(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Query(query): Query<RecapQuery>,
) -> Result<Json<ApiResponse<Vec<MonthlyRecap>>>, AppError> {
    let today = state.clock.now_local().date();
    let (start, end, exclude_weekend) = recap_service::resolve_range(&query, today)?;

    let employee = state
        .attendance
        .employee_by_pin(session.employee_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let rows =
        recap_service::monthly_recap(&state.pool, employee.id, start, end, exclude_weekend).await?;

    Ok(Json(ApiResponse::ok("Monthly recap loaded", rows)))
}

/// Probe the devices of one tenant, or of all tenants when `tenant_id` is absent.
pub async fn monitor_devices(
    State(state): State<AppState>,
    Query(query): Query<MonitorQuery>,
) -> Result<Json<MonitorResponse>, AppError> {
    if query.tenant_id.is_some_and(|id| id <= 0) {
        return Err(AppError::Validation(
            "tenant_id must be greater than 0".to_string(),
        ));
    }

    let devices = monitor_service::list_devices(&state.pool, query.tenant_id).await?;
    let probes = state
        .monitor
        .probe(devices, state.clock.now_local())
        .await;

    let online = probes
        .iter()
        .filter(|p| p.status == DeviceStatus::Online)
        .count();
    tracing::info!(total = probes.len(), online, "device probe finished");

    Ok(Json(MonitorResponse {
        success: true,
        message: "Device status loaded",
        tenant_id: query.tenant_id,
        online,
        offline: probes.len() - online,
        total: probes.len(),
        data: probes,
    }))
}
