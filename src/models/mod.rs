//! Data models representing database entities and API payloads.

/// Tenant API client model
pub mod api_client;
/// Daily attendance records, raw scan events and result codes
pub mod attendance;
/// Biometric devices and monitor results
pub mod device;
/// Employees and login accounts
pub mod employee;
/// Field task submissions
pub mod field_task;
/// Leave requests
pub mod leave;
/// Monthly recap aggregates
pub mod recap;

use serde::Serialize;

/// Common response envelope: `{ success, message, data? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            data: None,
        }
    }
}
