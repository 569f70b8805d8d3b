//! Employee roster HTTP handlers.
//!
//! - GET /api/employees - All employees
//! - GET /api/employees/{pin} - One employee
//! - GET /api/employees/device-check - Is this device bound to this pin?

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        ApiResponse,
        employee::{DeviceCheckQuery, Employee, EmployeeProfile},
    },
    services::{employee_service, session_token::SessionClaims},
};

pub async fn list_employees(
    State(pool): State<DbPool>,
) -> Result<Json<ApiResponse<Vec<EmployeeProfile>>>, AppError> {
    let profiles = employee_service::list_profiles(&pool).await?;

    Ok(Json(ApiResponse::ok("Employees loaded", profiles)))
}

/// Fetch one employee by pin.
///
/// Privilege level 0 may only read its own pin (403 otherwise).
pub async fn get_employee(
    State(pool): State<DbPool>,
    Extension(session): Extension<SessionClaims>,
    Path(pin): Path<i32>,
) -> Result<Json<ApiResponse<EmployeeProfile>>, AppError> {
    if session.privilege_level == 0 && session.employee_code != pin {
        return Err(AppError::Authorization("Forbidden".to_string()));
    }

    let profile = employee_service::find_profile(&pool, pin)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(Json(ApiResponse::ok("Employee loaded", profile)))
}

/// Check a (pin, device) binding.
///
/// An unknown pair is not an error: the body says `success: false`.
pub async fn device_check(
    State(pool): State<DbPool>,
    Query(query): Query<DeviceCheckQuery>,
) -> Result<Json<ApiResponse<Employee>>, AppError> {
    let pin = query.pin.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let device_id = query.device_id.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let (Some(pin), Some(device_id)) = (pin, device_id) else {
        return Err(AppError::Validation("pin and device_id are required".to_string()));
    };

    // A non-numeric pin cannot be bound to anything.
    let employee = match pin.parse::<i32>() {
        Ok(pin) => employee_service::find_by_device(&pool, pin, device_id).await?,
        Err(_) => None,
    };

    Ok(Json(match employee {
        Some(employee) => ApiResponse::ok("Device matches", employee),
        None => ApiResponse {
            success: false,
            message: "Device mismatch".to_string(),
            data: None,
        },
    }))
}
