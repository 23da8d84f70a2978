use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::enums::{UserStatus, UserType};
use super::timestamp;

/// Account record as exposed by the API.
///
/// Carries no password material at all; the hash is only reachable through
/// [`UserCredentials`], which is never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub doctor_name: String,
    pub user_type: UserType,
    pub status: UserStatus,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub gender: Option<String>,
    pub allergies: Vec<String>,
    pub medical_history: Option<String>,
    pub conditions: Vec<String>,
    #[serde(with = "timestamp::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new account. `password_hash` is already encoded.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub doctor_name: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
}

/// Stored credential for login verification.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub password_hash: String,
}

/// Partial merge applied by `PUT /api/user/:id`. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub doctor_name: Option<String>,
    pub user_type: Option<UserType>,
    pub status: Option<UserStatus>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub gender: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_history: Option<String>,
    pub conditions: Option<Vec<String>>,
}

/// Doctor reference populated into task and suggestion listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
}

/// Patient counts by status for a doctor's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientStats {
    pub total: u32,
    pub active: u32,
    pub inactive: u32,
    pub critical: u32,
}
