//! Time-of-day rules for attendance actions.
//!
//! Decisions depend only on the server's wall-clock time; client-supplied
//! timestamps never reach this module.
//!
//! Check-in and check-out use blackout windows with strict bounds
//! (`start < t < end`), evaluated in table order. Field-task submission uses
//! inclusive allow windows. Times are compared at second precision.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::models::attendance::ResultCode;

const fn hm(hour: u32, minute: u32) -> u32 {
    (hour * 60 + minute) * 60
}

const END_OF_DAY: u32 = hm(24, 0);

/// Start of the working day; check-ins after this are late.
pub const LATE_AFTER_SECS: u32 = hm(9, 0);

#[derive(Debug, Clone, Copy)]
struct Blackout {
    start: u32,
    end: u32,
    code: ResultCode,
    message: &'static str,
    enabled: bool,
}

impl Blackout {
    const fn new(start: u32, end: u32, code: ResultCode, message: &'static str) -> Self {
        Self {
            start,
            end,
            code,
            message,
            enabled: true,
        }
    }

    const fn disabled(self) -> Self {
        Self {
            enabled: false,
            ..self
        }
    }

    fn contains(&self, secs: u32) -> bool {
        self.enabled && secs > self.start && secs < self.end
    }
}

const CHECK_IN_BLACKOUTS: [Blackout; 5] = [
    Blackout::new(
        hm(9, 0),
        hm(12, 0),
        ResultCode::CHECK_IN_LATE_MORNING,
        "You are late today",
    ),
    Blackout::new(
        hm(12, 1),
        hm(15, 59),
        ResultCode::CHECK_IN_MIDDAY,
        "Outside check-in hours",
    ),
    Blackout::new(
        hm(16, 0),
        hm(17, 59),
        ResultCode::CHECK_IN_EARLY_EVENING,
        "Outside check-in hours (check-out period)",
    ),
    Blackout::new(
        hm(18, 0),
        END_OF_DAY,
        ResultCode::OUTSIDE_NIGHT,
        "Outside check-in hours",
    ),
    Blackout::new(
        hm(0, 0),
        hm(7, 29),
        ResultCode::OUTSIDE_PRE_DAWN,
        "Outside check-in hours",
    ),
];

const CHECK_OUT_BLACKOUTS: [Blackout; 3] = [
    Blackout::new(
        hm(7, 30),
        hm(15, 59),
        ResultCode::CHECK_OUT_MORNING_MIDDAY,
        "Outside check-out hours (morning-midday)",
    ),
    Blackout::new(
        hm(18, 1),
        END_OF_DAY,
        ResultCode::OUTSIDE_NIGHT,
        "Outside check-out hours (night)",
    )
    .disabled(),
    Blackout::new(
        hm(0, 0),
        hm(7, 29),
        ResultCode::OUTSIDE_PRE_DAWN,
        "Outside check-out hours (pre-dawn)",
    ),
];

/// Inclusive `(start, end)` windows in which field tasks may be submitted.
const FIELD_TASK_WINDOWS: [(u32, u32); 2] = [(hm(7, 31), hm(9, 0)), (hm(16, 0), hm(18, 0))];

pub const FIELD_TASK_DENIED: &str =
    "Field tasks can only be submitted between 07:31 and 09:00 or between 16:00 and 18:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allowed,
    Denied {
        code: ResultCode,
        message: &'static str,
    },
}

/// Evaluate the blackout table of `action` at `now`.
pub fn evaluate(action: Action, now: NaiveTime) -> PolicyDecision {
    let table: &[Blackout] = match action {
        Action::CheckIn => &CHECK_IN_BLACKOUTS,
        Action::CheckOut => &CHECK_OUT_BLACKOUTS,
    };
    let secs = now.num_seconds_from_midnight();

    table
        .iter()
        .find(|window| window.contains(secs))
        .map_or(PolicyDecision::Allowed, |window| PolicyDecision::Denied {
            code: window.code,
            message: window.message,
        })
}

/// Whether a field task may be submitted or edited at `now`.
pub fn field_task_allowed(now: NaiveTime) -> bool {
    let secs = now.num_seconds_from_midnight();
    FIELD_TASK_WINDOWS
        .iter()
        .any(|&(start, end)| secs >= start && secs <= end)
}

/// Format a server timestamp the way policy denials echo it.
pub fn format_server_time(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Lateness of a check-in: whether it is after 09:00 and by how many whole minutes.
pub fn lateness(scan_time: NaiveTime) -> (bool, i32) {
    let secs = scan_time.num_seconds_from_midnight();
    if secs > LATE_AFTER_SECS {
        (true, ((secs - LATE_AFTER_SECS) / 60) as i32)
    } else {
        (false, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    fn denied_code(action: Action, time: NaiveTime) -> Option<u8> {
        match evaluate(action, time) {
            PolicyDecision::Allowed => None,
            PolicyDecision::Denied { code, .. } => Some(code.0),
        }
    }

    #[test]
    fn check_in_morning_slot_is_allowed() {
        assert_eq!(denied_code(Action::CheckIn, at(7, 30, 0)), None);
        assert_eq!(denied_code(Action::CheckIn, at(8, 45, 0)), None);
        assert_eq!(denied_code(Action::CheckIn, at(9, 0, 0)), None);
    }

    #[test]
    fn check_in_blackouts_map_to_codes() {
        assert_eq!(denied_code(Action::CheckIn, at(10, 30, 0)), Some(2));
        assert_eq!(denied_code(Action::CheckIn, at(13, 0, 0)), Some(3));
        assert_eq!(denied_code(Action::CheckIn, at(17, 0, 0)), Some(9));
        assert_eq!(denied_code(Action::CheckIn, at(21, 0, 0)), Some(4));
        assert_eq!(denied_code(Action::CheckIn, at(23, 59, 59)), Some(4));
        assert_eq!(denied_code(Action::CheckIn, at(3, 0, 0)), Some(5));
    }

    #[test]
    fn check_in_bounds_are_strict() {
        // Gaps between strict windows fall through to allowed.
        assert_eq!(denied_code(Action::CheckIn, at(12, 0, 30)), None);
        assert_eq!(denied_code(Action::CheckIn, at(12, 1, 0)), None);
        assert_eq!(denied_code(Action::CheckIn, at(16, 0, 0)), None);
        assert_eq!(denied_code(Action::CheckIn, at(18, 0, 0)), None);
        assert_eq!(denied_code(Action::CheckIn, at(0, 0, 0)), None);
        assert_eq!(denied_code(Action::CheckIn, at(9, 0, 1)), Some(2));
    }

    #[test]
    fn check_out_windows() {
        assert_eq!(denied_code(Action::CheckOut, at(10, 0, 0)), Some(2));
        assert_eq!(denied_code(Action::CheckOut, at(5, 0, 0)), Some(5));
        assert_eq!(denied_code(Action::CheckOut, at(16, 30, 0)), None);
        assert_eq!(denied_code(Action::CheckOut, at(15, 59, 0)), None);
    }

    #[test]
    fn evening_check_out_window_is_disabled() {
        assert_eq!(denied_code(Action::CheckOut, at(20, 0, 0)), None);
        assert_eq!(denied_code(Action::CheckOut, at(23, 30, 0)), None);
    }

    #[test]
    fn field_task_windows_are_inclusive() {
        assert!(field_task_allowed(at(7, 31, 0)));
        assert!(field_task_allowed(at(9, 0, 0)));
        assert!(field_task_allowed(at(16, 0, 0)));
        assert!(field_task_allowed(at(18, 0, 0)));

        assert!(!field_task_allowed(at(7, 30, 59)));
        assert!(!field_task_allowed(at(9, 0, 1)));
        assert!(!field_task_allowed(at(12, 0, 0)));
        assert!(!field_task_allowed(at(18, 0, 1)));
    }

    #[test]
    fn lateness_counts_whole_minutes_after_nine() {
        assert_eq!(lateness(at(8, 59, 0)), (false, 0));
        assert_eq!(lateness(at(9, 0, 0)), (false, 0));
        assert_eq!(lateness(at(9, 0, 59)), (true, 0));
        assert_eq!(lateness(at(9, 17, 30)), (true, 17));
    }
}
