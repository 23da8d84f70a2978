//! Care task endpoints.
//!
//! - `POST /api/tasks`: doctor assigns a task to a patient
//! - `GET /api/tasks/:patientId`: a patient's tasks, newest first
//! - `PUT /api/tasks/:taskId`: mark a task done or not done

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, required_id, required_text, ApiContext, ApiJson, SessionContext};
use crate::db;
use crate::models::{timestamp, Task};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub task: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub completed: Option<bool>,
}

/// `POST /api/tasks`
pub async fn create(
    State(ctx): State<ApiContext>,
    session: Option<Extension<SessionContext>>,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let patient_id = required_id(body.patient_id.as_deref(), "patientId")?;
    let doctor_id = required_id(body.doctor_id.as_deref(), "doctorId")?;
    let text = required_text(body.task, "task")?;
    if let Some(Extension(session)) = &session {
        session.ensure_doctor(&doctor_id)?;
    }

    let task = Task {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id,
        task: text,
        completed: false,
        assigned_date: timestamp::now(),
        completed_date: None,
        doctor: None,
    };
    db::insert_task(&ctx.core.open_db()?, &task)?;

    tracing::info!(task_id = %task.id, %patient_id, %doctor_id, "Task assigned");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /api/tasks/:patientId`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let patient_id = parse_id(&patient_id, "patientId")?;
    Ok(Json(db::get_tasks_for_patient(&ctx.core.open_db()?, &patient_id)?))
}

/// `PUT /api/tasks/:taskId`: `completedDate` follows `completed`.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(task_id): Path<String>,
    ApiJson(body): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let task_id = parse_id(&task_id, "taskId")?;
    let completed = body
        .completed
        .ok_or_else(|| ApiError::BadRequest("completed must be a boolean".into()))?;

    let task = db::set_task_completed(&ctx.core.open_db()?, &task_id, completed, timestamp::now())?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    tracing::info!(%task_id, completed, "Task updated");
    Ok(Json(task))
}
