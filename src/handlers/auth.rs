//! Authentication HTTP handlers.
//!
//! - POST /api/auth/login - Exchange credentials for a session token
//! - PUT /api/auth/change-password - Change the session account's password

use axum::{Extension, Json, extract::State};

use crate::{
    error::AppError,
    middleware::admission::ClientContext,
    models::{
        ApiResponse,
        employee::{ChangePasswordRequest, LoginRequest, LoginResponse},
    },
    services::session_token::SessionClaims,
    state::AppState,
};

/// Log in.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Request Body
///
/// ```json
/// { "identifier": "employee@example.id", "secret": "..." }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: session token and user summary
/// - **Error (401)**: unknown account or wrong secret
/// - **Error (403)**: account inactive or not verified
/// - **Error (429)**: too many failures for this client, address and account
///
/// Every failure carries the same message.
pub async fn login(
    State(state): State<AppState>,
    Extension(client): Extension<ClientContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let response = state
        .auth
        .login(client.client_id, &client.source_ip, &request)
        .await?;

    tracing::info!(client = %client.name, prefix = %client.prefix, pin = response.user.pin, "login succeeded");
    Ok(Json(ApiResponse::ok("Login successful", response)))
}

/// Change the password of the logged-in account.
///
/// # Endpoint
///
/// `PUT /api/auth/change-password`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "success": true, "message": "Password changed" }`
/// - **Error (400)**: missing fields, new password shorter than 6 or unchanged
/// - **Error (401)**: old password wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth.change_password(&session, &request).await?;

    tracing::info!(pin = session.employee_code, "password changed");
    Ok(Json(ApiResponse::message(true, "Password changed")))
}
