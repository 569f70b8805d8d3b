//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::{error::AppError, services::time_policy::format_server_time, state::AppState};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    /// Server-local wall clock, the time attendance policy is evaluated against.
    pub server_time: String,
}

/// Health check handler. Public, outside the admission gate.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "database": "connected",
///   "server_time": "2026-01-08 08:45:00"
/// }
/// ```
///
/// An unreachable database yields the standard 500 envelope.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: "connected",
        server_time: format_server_time(state.clock.now_local()),
    }))
}
