//! Session token middleware.
//!
//! Validates `Authorization: Bearer <token>` and attaches the resulting
//! [`SessionClaims`] to the request. Handlers take the claims through
//! `Extension<SessionClaims>`; nothing looks the identity up ambiently.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::session_token::SessionClaims, state::AppState};

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Authentication("Missing session token".to_string()))?;

    let claims: SessionClaims = state.auth.tokens().validate(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
