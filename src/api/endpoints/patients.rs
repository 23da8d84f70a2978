//! Patient listing endpoints for doctor dashboards.
//!
//! - `GET /api/patients?search=`
//! - `GET /api/patients/doctor/:doctorName?search=`
//! - `GET /api/patients/doctor/:doctorName/stats`

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiQuery};
use crate::db::{self, PatientFilter};
use crate::models::{PatientStats, User};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    fn term(self) -> Option<String> {
        self.search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// `GET /api/patients`: every patient account.
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let filter = PatientFilter {
        doctor_name: None,
        search: query.term(),
    };
    Ok(Json(db::list_patients(&ctx.core.open_db()?, &filter)?))
}

/// `GET /api/patients/doctor/:doctorName`: patients registered under one doctor.
pub async fn by_doctor(
    State(ctx): State<ApiContext>,
    Path(doctor_name): Path<String>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let filter = PatientFilter {
        doctor_name: Some(doctor_name),
        search: query.term(),
    };
    Ok(Json(db::list_patients(&ctx.core.open_db()?, &filter)?))
}

/// `GET /api/patients/doctor/:doctorName/stats`: status counts for the dashboard.
pub async fn stats(
    State(ctx): State<ApiContext>,
    Path(doctor_name): Path<String>,
) -> Result<Json<PatientStats>, ApiError> {
    Ok(Json(db::patient_stats(&ctx.core.open_db()?, &doctor_name)?))
}
