//! Health metric endpoints.
//!
//! - `POST /api/health-data`: record one day's vitals
//! - `GET /api/health-data/:userId`: full history, newest first
//! - `GET /api/health-data/:userId/latest`: most recent record

use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, required_id, required_text, ApiContext, ApiJson};
use crate::db;
use crate::models::{timestamp, HealthData};

static BLOOD_PRESSURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2,3}\s*/\s*[0-9]{2,3}$").unwrap());

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDataRequest {
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub heart_rate: Option<f64>,
    pub blood_pressure: Option<String>,
    pub weight: Option<f64>,
    pub sleep: Option<f64>,
    pub glucose: Option<f64>,
    pub steps: Option<f64>,
    pub water: Option<f64>,
    pub notes: Option<String>,
}

/// `POST /api/health-data`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<HealthDataRequest>,
) -> Result<(StatusCode, Json<HealthData>), ApiError> {
    let record = to_record(body)?;
    db::insert_health_data(&ctx.core.open_db()?, &record)?;
    tracing::info!(user_id = %record.user_id, record_id = %record.id, "Health data recorded");
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/health-data/:userId`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<HealthData>>, ApiError> {
    let user_id = parse_id(&user_id, "userId")?;
    Ok(Json(db::get_health_data_for_user(&ctx.core.open_db()?, &user_id)?))
}

/// `GET /api/health-data/:userId/latest`
pub async fn latest(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<Json<HealthData>, ApiError> {
    let user_id = parse_id(&user_id, "userId")?;
    db::get_latest_health_data(&ctx.core.open_db()?, &user_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No health data found".into()))
}

fn to_record(body: HealthDataRequest) -> Result<HealthData, ApiError> {
    let user_id = required_id(body.user_id.as_deref(), "userId")?;
    let date = required_text(body.date, "date")?;
    let date = timestamp::parse(&date).ok_or_else(|| ApiError::BadRequest("Invalid date".into()))?;

    let blood_pressure = match body.blood_pressure.map(|bp| bp.trim().to_string()) {
        Some(bp) if bp.is_empty() => None,
        Some(bp) if BLOOD_PRESSURE.is_match(&bp) => {
            Some(bp.chars().filter(|c| !c.is_whitespace()).collect())
        }
        Some(_) => {
            return Err(ApiError::BadRequest(
                "bloodPressure must look like systolic/diastolic, e.g. 120/80".into(),
            ))
        }
        None => None,
    };

    Ok(HealthData {
        id: Uuid::new_v4(),
        user_id,
        date,
        heart_rate: vital(body.heart_rate, "heartRate")?,
        blood_pressure,
        weight: vital(body.weight, "weight")?,
        sleep: vital(body.sleep, "sleep")?,
        glucose: vital(body.glucose, "glucose")?,
        steps: vital(body.steps, "steps")?,
        water: vital(body.water, "water")?,
        notes: body.notes.filter(|n| !n.trim().is_empty()),
        created_at: timestamp::now(),
    })
}

fn vital(value: Option<f64>, field: &str) -> Result<Option<f64>, ApiError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ApiError::BadRequest(format!(
            "{field} must be a non-negative number"
        ))),
        other => Ok(other),
    }
}
