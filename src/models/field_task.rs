//! Field task (out-of-office assignment) models.
//!
//! A field task replaces the normal check-in/check-out for one day. The
//! photo itself is stored by the upload service; only its path is kept here.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Status of a freshly submitted task that can still be edited.
pub const STATUS_NEW: i16 = 2;

/// Represents a field task record from the database.
///
/// # Database Table
///
/// Maps to the `field_tasks` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FieldTask {
    pub id: i64,
    pub employee_id: i64,
    pub task_date: NaiveDateTime,
    pub destination: String,
    pub description: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    /// 0 rejected, 1 accepted, 2 new.
    pub status: i16,
    pub file_name: String,
    pub file_extension: String,
    pub file_size: String,
    pub file_path: String,
}

/// Reference to a photo already stored by the upload service.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRef {
    pub file_name: String,
    pub file_extension: String,
    pub file_size: u64,
    pub file_path: String,
}

/// Request body for `POST /api/field-tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateFieldTaskRequest {
    /// Defaults to the server time.
    pub task_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    pub photo: PhotoRef,
}

/// Request body for `PUT /api/field-tasks/{id}`. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateFieldTaskRequest {
    pub task_date: Option<NaiveDateTime>,
    pub destination: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub photo: Option<PhotoRef>,
}

/// Query string of `GET /api/field-tasks`. `end` is exclusive.
#[derive(Debug, Deserialize)]
pub struct FieldTaskQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// `data` section returned after a submit or edit.
#[derive(Debug, Serialize)]
pub struct FieldTaskSaved {
    pub field_task_id: i64,
    pub file_url: String,
}
