//! Doctor suggestion endpoints.
//!
//! - `POST /api/suggestions`: doctor leaves a free-text suggestion
//! - `GET /api/suggestions/:patientId`: a patient's suggestions, newest first

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, required_id, required_text, ApiContext, ApiJson, SessionContext};
use crate::db;
use crate::models::{timestamp, Suggestion};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuggestionRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    #[serde(alias = "text")]
    pub suggestion: Option<String>,
}

/// `POST /api/suggestions`
pub async fn create(
    State(ctx): State<ApiContext>,
    session: Option<Extension<SessionContext>>,
    ApiJson(body): ApiJson<CreateSuggestionRequest>,
) -> Result<(StatusCode, Json<Suggestion>), ApiError> {
    let patient_id = required_id(body.patient_id.as_deref(), "patientId")?;
    let doctor_id = required_id(body.doctor_id.as_deref(), "doctorId")?;
    let text = required_text(body.suggestion, "suggestion")?;
    if let Some(Extension(session)) = &session {
        session.ensure_doctor(&doctor_id)?;
    }

    let suggestion = Suggestion {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id,
        suggestion: text,
        created_at: timestamp::now(),
        doctor: None,
    };
    db::insert_suggestion(&ctx.core.open_db()?, &suggestion)?;

    tracing::info!(suggestion_id = %suggestion.id, %patient_id, %doctor_id, "Suggestion added");
    Ok((StatusCode::CREATED, Json(suggestion)))
}

/// `GET /api/suggestions/:patientId`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
    let patient_id = parse_id(&patient_id, "patientId")?;
    Ok(Json(db::get_suggestions_for_patient(&ctx.core.open_db()?, &patient_id)?))
}
