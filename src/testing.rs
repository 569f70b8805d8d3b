//! In-memory stores and fixtures shared by unit and router tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        api_client::ApiClient,
        attendance::{
            AttendanceEvent, CheckInWrite, CheckOutWrite, DailyAttendanceRecord, ShiftSummary,
        },
        employee::{Employee, UserAccount},
    },
    services::{
        account_store::AccountStore,
        credential_store::{CredentialStore, hash_api_key},
        employee_service::EmployeeDirectory,
        ledger::AttendanceLedger,
        password::hash_password,
    },
};

pub fn test_account(user_id: i64, pin: i32, email: &str, password: &str) -> UserAccount {
    UserAccount {
        user_id,
        tenant_id: 7,
        pin,
        email: email.to_string(),
        password_digest: hash_password(password).unwrap(),
        level: 0,
        is_active: true,
        is_verified: true,
        device_id: None,
    }
}

pub fn test_employee(id: i64, pin: i32, device_id: Option<&str>) -> Employee {
    Employee {
        id,
        pin,
        name: format!("Employee {pin}"),
        device_id: device_id.map(str::to_string),
        is_active: true,
    }
}

/// An active client whose raw key is `raw_key`, with no allow-lists and no quota.
pub fn test_client(raw_key: &str) -> ApiClient {
    ApiClient {
        id: Uuid::new_v4(),
        name: "Test tenant".to_string(),
        prefix: "test".to_string(),
        key_hash: hash_api_key(raw_key),
        is_active: true,
        allowed_origins: None,
        allowed_ips: None,
        rate_limit: 0,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    clients: Mutex<Vec<ApiClient>>,
}

impl MemoryCredentialStore {
    pub fn insert(&self, client: ApiClient) {
        self.clients.lock().push(client);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_active_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiClient>, AppError> {
        Ok(self
            .clients
            .lock()
            .iter()
            .find(|c| c.key_hash == key_hash && c.is_active)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<UserAccount>>,
}

impl MemoryAccountStore {
    pub fn insert(&self, account: UserAccount) {
        self.accounts.lock().push(account);
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        Ok(self
            .accounts
            .lock()
            .iter()
            .find(|a| a.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_by_pin(&self, pin: i32) -> Result<Option<UserAccount>, AppError> {
        Ok(self.accounts.lock().iter().find(|a| a.pin == pin).cloned())
    }

    async fn update_password(&self, user_id: i64, password_digest: &str) -> Result<bool, AppError> {
        let mut accounts = self.accounts.lock();
        match accounts.iter_mut().find(|a| a.user_id == user_id) {
            Some(account) => {
                account.password_digest = password_digest.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryEmployeeDirectory {
    employees: Mutex<Vec<Employee>>,
}

impl MemoryEmployeeDirectory {
    pub fn insert(&self, employee: Employee) {
        self.employees.lock().push(employee);
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryEmployeeDirectory {
    async fn find_by_pin(&self, pin: i32) -> Result<Option<Employee>, AppError> {
        Ok(self.employees.lock().iter().find(|e| e.pin == pin).cloned())
    }
}

/// Ledger double that also counts commits so tests can assert "no mutation".
#[derive(Default)]
pub struct MemoryLedger {
    events: Mutex<Vec<AttendanceEvent>>,
    records: Mutex<HashMap<(i64, NaiveDate), DailyAttendanceRecord>>,
    pins: Mutex<HashMap<i64, i32>>,
    commits: Mutex<usize>,
}

impl MemoryLedger {
    pub fn grant_leave(&self, employee_id: i64, date: NaiveDate, leave_type: i16) {
        let mut records = self.records.lock();
        records
            .entry((employee_id, date))
            .or_insert_with(|| empty_record(employee_id, date))
            .leave_type = leave_type;
    }

    pub fn insert_event(&self, event: AttendanceEvent) {
        self.events.lock().push(event);
    }

    pub fn record(&self, employee_id: i64, date: NaiveDate) -> Option<DailyAttendanceRecord> {
        self.records.lock().get(&(employee_id, date)).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn events(&self) -> Vec<AttendanceEvent> {
        self.events.lock().clone()
    }

    pub fn commits(&self) -> usize {
        *self.commits.lock()
    }

    fn append(&self, employee_id: i64, event: &AttendanceEvent) -> Result<(), AppError> {
        let mut events = self.events.lock();
        if events.iter().any(|e| e.event_id == event.event_id) {
            return Err(AppError::Conflict(format!(
                "Event {} already recorded",
                event.event_id
            )));
        }
        events.push(event.clone());
        self.pins.lock().insert(employee_id, event.pin);
        *self.commits.lock() += 1;
        Ok(())
    }
}

fn empty_record(employee_id: i64, shift_date: NaiveDate) -> DailyAttendanceRecord {
    DailyAttendanceRecord {
        employee_id,
        shift_date,
        check_in: None,
        check_out: None,
        check_in_event_id: None,
        check_out_event_id: None,
        leave_type: 0,
        late: false,
        late_minutes: 0,
        worked_minutes: 0,
    }
}

#[async_trait]
impl AttendanceLedger for MemoryLedger {
    async fn has_event_on(&self, pin: i32, date: NaiveDate) -> Result<bool, AppError> {
        Ok(self
            .events
            .lock()
            .iter()
            .any(|e| e.pin == pin && e.scanned_at.date() == date))
    }

    async fn events_on(&self, pin: i32, date: NaiveDate) -> Result<Vec<AttendanceEvent>, AppError> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.pin == pin && e.scanned_at.date() == date)
            .cloned()
            .collect())
    }

    async fn check_out_events(
        &self,
        pin: i32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEvent>, AppError> {
        let mut events: Vec<_> = self
            .events
            .lock()
            .iter()
            .filter(|e| e.pin == pin && e.in_out_mode == 1)
            .filter(|e| date.is_none_or(|d| e.scanned_at.date() == d))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        Ok(events)
    }

    async fn record_for(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<DailyAttendanceRecord>, AppError> {
        Ok(self.record(employee_id, date).map(DailyAttendanceRecord::normalized))
    }

    async fn history_for_pin(&self, pin: i32) -> Result<Vec<ShiftSummary>, AppError> {
        let pins = self.pins.lock().clone();
        let mut rows: Vec<_> = self
            .records
            .lock()
            .values()
            .filter(|r| pins.get(&r.employee_id) == Some(&pin))
            .map(|r| ShiftSummary {
                employee_id: r.employee_id,
                pin,
                shift_date: r.shift_date,
                check_in: r.check_in,
                check_out: r.check_out,
            })
            .collect();
        rows.sort_by(|a, b| b.shift_date.cmp(&a.shift_date));
        Ok(rows)
    }

    async fn earliest_event_between(
        &self,
        pin: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, AppError> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.pin == pin && e.scanned_at >= start && e.scanned_at < end)
            .map(|e| e.scanned_at)
            .min())
    }

    async fn commit_check_in(
        &self,
        event: &AttendanceEvent,
        write: &CheckInWrite,
    ) -> Result<(), AppError> {
        self.append(write.employee_id, event)?;
        let mut records = self.records.lock();
        let record = records
            .entry((write.employee_id, write.shift_date))
            .or_insert_with(|| empty_record(write.employee_id, write.shift_date));
        record.check_in = Some(write.check_in);
        record.check_in_event_id = Some(write.event_id.clone());
        record.late = write.late;
        record.late_minutes = write.late_minutes;
        Ok(())
    }

    async fn commit_check_out_update(
        &self,
        event: &AttendanceEvent,
        write: &CheckOutWrite,
    ) -> Result<(), AppError> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(&(write.employee_id, write.shift_date))
            .filter(|r| r.check_out.is_none())
            .ok_or_else(|| AppError::Conflict("Check-out already recorded".to_string()))?;
        self.append(write.employee_id, event)?;
        record.check_out = Some(write.check_out);
        record.check_out_event_id = Some(write.event_id.clone());
        record.worked_minutes = write.worked_minutes;
        Ok(())
    }

    async fn commit_check_out_insert(
        &self,
        event: &AttendanceEvent,
        write: &CheckOutWrite,
    ) -> Result<(), AppError> {
        let mut records = self.records.lock();
        if records.contains_key(&(write.employee_id, write.shift_date)) {
            return Err(AppError::Conflict("Daily record already exists".to_string()));
        }
        self.append(write.employee_id, event)?;
        let mut record = empty_record(write.employee_id, write.shift_date);
        record.check_out = Some(write.check_out);
        record.check_out_event_id = Some(write.event_id.clone());
        record.worked_minutes = write.worked_minutes;
        records.insert((write.employee_id, write.shift_date), record);
        Ok(())
    }
}
