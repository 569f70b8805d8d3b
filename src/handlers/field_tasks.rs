//! Field task HTTP handlers.
//!
//! - GET /api/field-tasks - Session employee's tasks
//! - POST /api/field-tasks - Submit a task for today
//! - PUT /api/field-tasks/{id} - Edit a task that is still "new"
//!
//! Submits and edits are only accepted inside the field-task windows
//! (07:31-09:00 and 16:00-18:00, inclusive) of the server clock.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDateTime;

use crate::{
    error::AppError,
    models::{
        ApiResponse,
        employee::Employee,
        field_task::{
            CreateFieldTaskRequest, FieldTask, FieldTaskQuery, FieldTaskSaved, STATUS_NEW,
            UpdateFieldTaskRequest,
        },
    },
    services::{
        field_task_service,
        session_token::SessionClaims,
        time_policy::{self, FIELD_TASK_DENIED},
    },
    state::AppState,
};

async fn session_employee(state: &AppState, session: &SessionClaims) -> Result<Employee, AppError> {
    state
        .attendance
        .employee_by_pin(session.employee_code)
        .await?
        .ok_or_else(|| AppError::Authentication("Unauthorized".to_string()))
}

fn ensure_field_task_window(now: NaiveDateTime) -> Result<(), AppError> {
    if time_policy::field_task_allowed(now.time()) {
        return Ok(());
    }

    Err(AppError::PolicyDenied {
        message: FIELD_TASK_DENIED.to_string(),
        server_time: time_policy::format_server_time(now),
    })
}

/// List tasks, newest first. `end` is exclusive.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Query(query): Query<FieldTaskQuery>,
) -> Result<Json<ApiResponse<Vec<FieldTask>>>, AppError> {
    let employee = session_employee(&state, &session).await?;
    let tasks = field_task_service::list(&state.pool, employee.id, query.start, query.end).await?;

    Ok(Json(ApiResponse::ok("Field tasks loaded", tasks)))
}

/// Submit a field task.
///
/// # Process
///
/// 1. Server time inside a field-task window (400 with `server_time`)
/// 2. No attendance recorded today (400)
/// 3. No field task submitted today (400)
/// 4. Store with status "new"
pub async fn submit_task(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Json(request): Json<CreateFieldTaskRequest>,
) -> Result<Json<ApiResponse<FieldTaskSaved>>, AppError> {
    let employee = session_employee(&state, &session).await?;

    let now = state.clock.now_local();
    ensure_field_task_window(now)?;

    let today = now.date();
    if field_task_service::has_attendance_on(&state.pool, employee.id, today).await? {
        return Err(AppError::Conflict(
            "A field task cannot be submitted after attendance was recorded today".to_string(),
        ));
    }
    if field_task_service::has_task_on(&state.pool, employee.id, today).await? {
        return Err(AppError::Conflict(
            "A field task was already submitted today".to_string(),
        ));
    }

    let task_date = request.task_date.unwrap_or(now);
    let id = field_task_service::insert(&state.pool, employee.id, task_date, &request).await?;
    tracing::info!(field_task_id = id, pin = employee.pin, "field task submitted");

    Ok(Json(ApiResponse::ok(
        "Field task saved",
        FieldTaskSaved {
            field_task_id: id,
            file_url: request.photo.file_path,
        },
    )))
}

/// Edit a field task.
///
/// # Process
///
/// 1. Server time inside a field-task window (400 with `server_time`)
/// 2. Task exists and belongs to the session employee (404)
/// 3. Task is still "new" (400)
pub async fn edit_task(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateFieldTaskRequest>,
) -> Result<Json<ApiResponse<FieldTaskSaved>>, AppError> {
    let employee = session_employee(&state, &session).await?;
    ensure_field_task_window(state.clock.now_local())?;

    let existing = field_task_service::find_for_owner(&state.pool, id, employee.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Field task not found".to_string()))?;

    if existing.status != STATUS_NEW {
        return Err(AppError::Conflict(
            "Field task can no longer be edited because it was already verified".to_string(),
        ));
    }

    if !field_task_service::update_if_new(&state.pool, id, employee.id, &request).await? {
        return Err(AppError::Conflict(
            "Update failed. The field task is no longer new".to_string(),
        ));
    }

    let file_url = request
        .photo
        .map(|photo| photo.file_path)
        .unwrap_or(existing.file_path);

    Ok(Json(ApiResponse::ok(
        "Field task updated",
        FieldTaskSaved {
            field_task_id: id,
            file_url,
        },
    )))
}
