//! Attendance state machine.
//!
//! Per (employee, shift date) a record moves `NoRecord -> CheckedIn ->
//! CheckedOut`; a leave marker blocks both transitions for that date.
//! Business rejections come back as [`AttendanceOutcome`] values with a
//! numeric [`ResultCode`]; only infrastructure faults and a session/body pin
//! mismatch are errors.
//!
//! Transitions of the same (employee, shift date) are serialized by a keyed
//! async mutex. Unrelated employees never contend.

use std::{collections::HashMap, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{
    clock::Clock,
    error::AppError,
    models::{
        attendance::{
            AttendanceEvent, AttendanceOutcome, CheckInRequest, CheckInWrite, CheckOutRequest,
            CheckOutWrite, RecordedScan, ResultCode,
        },
        employee::Employee,
    },
    services::{
        employee_service::EmployeeDirectory,
        ledger::AttendanceLedger,
        session_token::SessionClaims,
        time_policy::{self, Action, PolicyDecision},
    },
};

/// Verify mode recorded on app check-outs.
pub const CHECK_OUT_VERIFY_MODE: i32 = 5;
/// Direction flag of a check-out scan.
pub const DIRECTION_OUT: i32 = 1;

type ShiftKey = (i64, NaiveDate);
type LockMap = Arc<Mutex<HashMap<ShiftKey, Arc<AsyncMutex<()>>>>>;

/// Per-(employee, shift date) locks. Entries are dropped when their last user releases them.
#[derive(Default, Clone)]
struct ShiftLocks {
    slots: LockMap,
}

struct ShiftGuard {
    key: ShiftKey,
    slots: LockMap,
    _guard: OwnedMutexGuard<()>,
}

impl ShiftLocks {
    async fn acquire(&self, key: ShiftKey) -> ShiftGuard {
        let slot = self.slots.lock().entry(key).or_default().clone();
        let guard = slot.lock_owned().await;
        ShiftGuard {
            key,
            slots: self.slots.clone(),
            _guard: guard,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

impl Drop for ShiftGuard {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        // One reference in the map and one held by this guard: nobody is waiting.
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) <= 2)
        {
            slots.remove(&self.key);
        }
    }
}

/// Build an externally visible event id: `ddMMyyyyHHmmssfff` + pin + device serial.
pub fn generate_event_id(now: NaiveDateTime, pin: i32, device_serial: &str) -> String {
    format!("{}{}{}", now.format("%d%m%Y%H%M%S%3f"), pin, device_serial)
}

#[derive(Clone)]
pub struct AttendanceService {
    employees: Arc<dyn EmployeeDirectory>,
    ledger: Arc<dyn AttendanceLedger>,
    clock: Arc<dyn Clock>,
    locks: ShiftLocks,
}

impl AttendanceService {
    pub fn new(
        employees: Arc<dyn EmployeeDirectory>,
        ledger: Arc<dyn AttendanceLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            employees,
            ledger,
            clock,
            locks: ShiftLocks::default(),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn AttendanceLedger> {
        &self.ledger
    }

    pub async fn employee_by_pin(&self, pin: i32) -> Result<Option<Employee>, AppError> {
        self.employees.find_by_pin(pin).await
    }

    /// Run the check-in transition.
    ///
    /// # Process
    ///
    /// 1. Body pin must equal the session pin (403 otherwise)
    /// 2. Resolve an active employee (result 6)
    /// 3. Device binding, when `X-Device-Id` was sent (result 10)
    /// 4. No check-in, check-out or scan yet for the shift date (result 7)
    /// 5. No leave on the shift date (result 8)
    /// 6. Check-in time policy at server time (results 2, 3, 4, 5, 9)
    /// 7. Append the event and upsert the daily record
    pub async fn check_in(
        &self,
        session: &SessionClaims,
        device_id: Option<&str>,
        request: CheckInRequest,
    ) -> Result<AttendanceOutcome, AppError> {
        if session.employee_code != request.pin {
            tracing::warn!(
                session_pin = session.employee_code,
                body_pin = request.pin,
                "check-in pin does not match session"
            );
            return Err(AppError::Authorization(
                "PIN does not match the signed-in employee".to_string(),
            ));
        }

        let employee = match self.resolve(request.pin, device_id).await? {
            Ok(employee) => employee,
            Err(outcome) => return Ok(outcome),
        };

        let now = self.clock.now_local();
        let shift_date = request.shift_date.unwrap_or(now.date());
        let _guard = self.locks.acquire((employee.id, shift_date)).await;

        // Backdated scans fall on another calendar date than their shift.
        let record = self.ledger.record_for(employee.id, shift_date).await?;
        if record.as_ref().is_some_and(|r| r.has_scan())
            || self.ledger.has_event_on(employee.pin, shift_date).await?
        {
            return Ok(AttendanceOutcome::rejected(
                ResultCode::ALREADY_RECORDED,
                "You have already checked in today",
            ));
        }

        if record.as_ref().is_some_and(|r| r.on_leave()) {
            return Ok(AttendanceOutcome::rejected(
                ResultCode::ON_LEAVE,
                "You are on leave today",
            ));
        }

        if let PolicyDecision::Denied { code, message } =
            time_policy::evaluate(Action::CheckIn, now.time())
        {
            return Ok(AttendanceOutcome::rejected(code, message));
        }

        let scan_time = request.scan_time.unwrap_or(now);
        let device_serial = request.device_serial.trim().to_string();
        let event_id = match request.event_id.trim() {
            "" => generate_event_id(now, employee.pin, &device_serial),
            supplied => supplied.to_string(),
        };
        let (late, late_minutes) = time_policy::lateness(scan_time.time());

        let event = AttendanceEvent {
            event_id: event_id.clone(),
            device_serial,
            pin: employee.pin,
            scanned_at: scan_time,
            verify_mode: request.verify_mode,
            in_out_mode: request.in_out_mode,
            reserved: request.reserved,
            work_code: request.work_code,
        };
        let write = CheckInWrite {
            employee_id: employee.id,
            shift_date,
            check_in: scan_time,
            event_id: event_id.clone(),
            late,
            late_minutes,
        };
        self.ledger.commit_check_in(&event, &write).await?;

        tracing::info!(
            employee_id = employee.id,
            %shift_date,
            late,
            "check-in recorded"
        );

        Ok(AttendanceOutcome::accepted(
            "Check-in recorded",
            RecordedScan {
                event_id,
                recorded_at: scan_time,
                late: Some(late),
            },
        ))
    }

    /// Run the check-out transition for the session's employee.
    ///
    /// # Process
    ///
    /// 1. Resolve the active employee from the session pin (result 6)
    /// 2. Device binding, when `X-Device-Id` was sent (result 10)
    /// 3. Check-out time policy at server time (results 2, 5)
    /// 4. Not already checked out today (result 7)
    /// 5. No leave today (result 8)
    /// 6. Update the existing daily record, or insert one that starts checked out
    pub async fn check_out(
        &self,
        session: &SessionClaims,
        device_id: Option<&str>,
        request: CheckOutRequest,
    ) -> Result<AttendanceOutcome, AppError> {
        let employee = match self.resolve(session.employee_code, device_id).await? {
            Ok(employee) => employee,
            Err(outcome) => return Ok(outcome),
        };

        let now = self.clock.now_local();
        if let PolicyDecision::Denied { code, message } =
            time_policy::evaluate(Action::CheckOut, now.time())
        {
            return Ok(AttendanceOutcome::rejected(code, message));
        }

        let shift_date = now.date();
        let _guard = self.locks.acquire((employee.id, shift_date)).await;

        let record = self.ledger.record_for(employee.id, shift_date).await?;
        if record.as_ref().is_some_and(|r| r.checked_out()) {
            return Ok(AttendanceOutcome::rejected(
                ResultCode::ALREADY_RECORDED,
                "You have already checked out today",
            ));
        }
        if record.as_ref().is_some_and(|r| r.on_leave()) {
            return Ok(AttendanceOutcome::rejected(
                ResultCode::ON_LEAVE,
                "You are on leave today",
            ));
        }

        let device_serial = request.device_serial.unwrap_or_default().trim().to_string();
        let event_id = generate_event_id(now, employee.pin, &device_serial);
        let event = AttendanceEvent {
            event_id: event_id.clone(),
            device_serial,
            pin: employee.pin,
            scanned_at: now,
            verify_mode: CHECK_OUT_VERIFY_MODE,
            in_out_mode: DIRECTION_OUT,
            reserved: 0,
            work_code: 0,
        };

        let worked_minutes = record
            .as_ref()
            .and_then(|r| r.check_in)
            .map_or(0, |check_in| worked_minutes(check_in, now));
        let write = CheckOutWrite {
            employee_id: employee.id,
            shift_date,
            check_out: now,
            event_id: event_id.clone(),
            worked_minutes,
        };

        let message = if record.is_some() {
            self.ledger.commit_check_out_update(&event, &write).await?;
            "Check-out updated"
        } else {
            self.ledger.commit_check_out_insert(&event, &write).await?;
            "Check-out recorded"
        };

        tracing::info!(
            employee_id = employee.id,
            %shift_date,
            worked_minutes,
            "check-out recorded"
        );

        Ok(AttendanceOutcome::accepted(
            message,
            RecordedScan {
                event_id,
                recorded_at: now,
                late: None,
            },
        ))
    }

    /// Resolve the employee and apply the device-binding check.
    ///
    /// The inner `Err` is a finished rejection to hand back to the caller.
    async fn resolve(
        &self,
        pin: i32,
        device_id: Option<&str>,
    ) -> Result<Result<Employee, AttendanceOutcome>, AppError> {
        let found = self.employees.find_by_pin(pin).await?;
        let Some(employee) = found.filter(|e| e.is_active) else {
            return Ok(Err(AttendanceOutcome::rejected(
                ResultCode::EMPLOYEE_NOT_FOUND,
                "Employee not found",
            )));
        };

        if let Some(device_id) = device_id.map(str::trim).filter(|d| !d.is_empty()) {
            if !employee.device_matches(device_id) {
                tracing::warn!(pin, "device binding mismatch");
                return Ok(Err(AttendanceOutcome::rejected(
                    ResultCode::DEVICE_MISMATCH,
                    "Device mismatch",
                )));
            }
        }

        Ok(Ok(employee))
    }
}

/// Minutes between check-in and check-out, clamped to `0..=i32::MAX`.
fn worked_minutes(check_in: NaiveDateTime, check_out: NaiveDateTime) -> i32 {
    let minutes = (check_out - check_in).num_minutes().max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
