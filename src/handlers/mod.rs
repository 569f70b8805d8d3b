//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, session claims)
//! 2. Delegates to a service
//! 3. Returns the JSON envelope or an `AppError`

/// Login and password change
pub mod auth;
/// Check-in transition and attendance lookups
pub mod checkin;
/// Check-out transition and history
pub mod checkout;
/// Employee roster and device binding check
pub mod employees;
/// Field task list, submit and edit
pub mod field_tasks;
/// Service health
pub mod health;
/// Leave list, monthly recap and device monitor
pub mod reports;
