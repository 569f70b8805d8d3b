//! Server wall-clock access.
//!
//! Attendance policy and counter expiry both depend on "now". Handlers and
//! services read it through [`Clock`] so tests can pin the time of day.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant in UTC. Used for counter buckets and expiry.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current server-local wall-clock time. Used for attendance policy.
    fn now_local(&self) -> NaiveDateTime;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
