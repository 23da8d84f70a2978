use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::timestamp;
use super::user::DoctorRef;

/// Doctor-assigned action item for a patient.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub task: String,
    pub completed: bool,
    #[serde(with = "timestamp::rfc3339")]
    pub assigned_date: DateTime<Utc>,
    #[serde(with = "timestamp::rfc3339_option")]
    pub completed_date: Option<DateTime<Utc>>,
    /// Populated only by listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            task: "Walk 30 minutes".into(),
            completed: false,
            assigned_date: Utc::now(),
            completed_date: None,
            doctor: None,
        }
    }

    #[test]
    fn serializes_null_completed_date_and_omits_unpopulated_doctor() {
        let json = serde_json::to_value(open_task()).unwrap();
        assert!(json["completedDate"].is_null());
        assert!(json.get("doctor").is_none());
        assert!(json["_id"].is_string());
    }
}
