//! API client admission middleware.
//!
//! This middleware intercepts every `/api` request to:
//! 1. Extract the API key from the `X-Api-Key` header
//! 2. Hash it and resolve an active client
//! 3. Enforce the client's origin and source-address allow-lists
//! 4. Apply the login-route limit and the client's per-minute quota
//! 5. Inject the client context into the request

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::allowlist::{ip_allowed, origin_allowed},
    services::credential_store::hash_api_key,
    state::AppState,
};

pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const LOGIN_PATH: &str = "/api/auth/login";
const UNKNOWN_SOURCE: &str = "unknown";

/// Admitted API client, attached to the request's extensions.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub client_id: Uuid,
    pub name: String,
    pub prefix: String,
    /// Caller address, or `"unknown"` when the transport does not report one.
    pub source_ip: String,
}

/// Admission middleware function.
///
/// # Flow
///
/// Checks run in order and the first failure wins:
///
/// 1. `X-Api-Key` present and resolving to an active client (401)
/// 2. `Origin`, if sent, on the client's origin list (403)
/// 3. Source address on the client's IP/CIDR list (403)
/// 4. Login route only: per (client, source IP) minute limit (429)
/// 5. Client quota, when greater than zero (429)
pub async fn admission_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Step 1: Extract the API key header
    let raw_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::Authentication("API key is missing".to_string()))?;

    // Step 2: Resolve the hashed key to an active client
    let client = state
        .credentials
        .find_active_by_key_hash(&hash_api_key(raw_key))
        .await?
        .ok_or_else(|| {
            tracing::warn!("rejected unknown or inactive API key");
            AppError::Authentication("Invalid API key".to_string())
        })?;

    // Step 3: Origin allow-list
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok());
    if !origin_allowed(&client.origin_allowlist(), origin) {
        tracing::warn!(client_id = %client.id, origin, "origin not allowed");
        return Err(AppError::Authorization("Origin not allowed".to_string()));
    }

    // Step 4: Source address allow-list
    let source: Option<IpAddr> = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let source_ip = source.map_or_else(|| UNKNOWN_SOURCE.to_string(), |ip| ip.to_string());
    if !ip_allowed(&client.ip_allowlist(), source) {
        tracing::warn!(client_id = %client.id, source_ip = %source_ip, "source address not allowed");
        return Err(AppError::Authorization("IP address not allowed".to_string()));
    }

    // Step 5: Login route limit, independent of the client quota
    if request.uri().path() == LOGIN_PATH {
        let decision = state.rate_limiter.hit_login(client.id, &source_ip).await?;
        if decision.is_exceeded() {
            tracing::warn!(client_id = %client.id, source_ip = %source_ip, "login rate limit exceeded");
            return Err(AppError::RateLimitExceeded(
                "Too many login requests. Try again later.".to_string(),
            ));
        }
    }

    // Step 6: Per-minute client quota
    if client.rate_limit > 0 {
        let decision = state
            .rate_limiter
            .hit_client(client.id, client.rate_limit as u64)
            .await?;
        if decision.is_exceeded() {
            tracing::warn!(client_id = %client.id, quota = client.rate_limit, "rate limit exceeded");
            return Err(AppError::RateLimitExceeded("Rate limit exceeded".to_string()));
        }
    }

    // Step 7: Inject the client context
    request.extensions_mut().insert(ClientContext {
        client_id: client.id,
        name: client.name,
        prefix: client.prefix,
        source_ip,
    });

    Ok(next.run(request).await)
}
