//! Attendance device models used by the liveness monitor.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A registered biometric device.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Device {
    pub device_id: i32,
    pub tenant_alias: String,
    pub device_name: String,
    pub ip_address: String,
}

/// Query string of `GET /api/monitor/devices`.
#[derive(Debug, Deserialize)]
pub struct MonitorQuery {
    pub tenant_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Online,
    Offline,
}

/// Result of probing one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceProbe {
    pub no: usize,
    pub checked_at: NaiveDateTime,
    pub ip_address: String,
    pub tenant_alias: String,
    pub device_name: String,
    pub status: DeviceStatus,
    pub roundtrip_ms: Option<u64>,
}

/// Response of `GET /api/monitor/devices`.
#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub success: bool,
    pub message: &'static str,
    pub tenant_id: Option<i64>,
    pub online: usize,
    pub offline: usize,
    pub total: usize,
    pub data: Vec<DeviceProbe>,
}
