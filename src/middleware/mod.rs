//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers. Every `/api`
//! request passes the admission gate first; all routes except login then
//! require a session token.

/// API key, allow-list and rate-limit gate
pub mod admission;
/// Origin and IP/CIDR matching
pub mod allowlist;
/// Session token validation
pub mod session;
