//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! The admission and attendance core reach storage only through the traits
//! defined here, so they run against in-memory doubles in tests.

pub mod account_store;
pub mod attendance_service;
pub mod auth_service;
pub mod brute_force;
pub mod counter_store;
pub mod credential_store;
pub mod employee_service;
pub mod field_task_service;
pub mod leave_service;
pub mod ledger;
pub mod monitor_service;
pub mod password;
pub mod rate_limiter;
pub mod recap_service;
pub mod session_token;
pub mod time_policy;
