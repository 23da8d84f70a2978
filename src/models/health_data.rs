use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::timestamp;

/// One dated vitals measurement for a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "timestamp::rfc3339")]
    pub date: DateTime<Utc>,
    pub heart_rate: Option<f64>,
    pub blood_pressure: Option<String>, // "systolic/diastolic"
    pub weight: Option<f64>,
    pub sleep: Option<f64>,
    pub glucose: Option<f64>,
    pub steps: Option<f64>,
    pub water: Option<f64>,
    pub notes: Option<String>,
    #[serde(with = "timestamp::rfc3339")]
    pub created_at: DateTime<Utc>,
}
