use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{opt_uuid_at, timestamp_at, uuid_at};
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::{DoctorRef, Suggestion};

pub fn insert_suggestion(conn: &Connection, suggestion: &Suggestion) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO suggestions (id, patient_id, doctor_id, suggestion, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            suggestion.id.to_string(),
            suggestion.patient_id.to_string(),
            suggestion.doctor_id.to_string(),
            suggestion.suggestion,
            timestamp::format(&suggestion.created_at),
        ],
    )?;
    Ok(())
}

/// Suggestions for a patient, newest first, with the authoring doctor populated.
pub fn get_suggestions_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Suggestion>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.patient_id, s.doctor_id, s.suggestion, s.created_at, d.id, d.full_name
         FROM suggestions s
         LEFT JOIN users d ON d.id = s.doctor_id
         WHERE s.patient_id = ?1
         ORDER BY s.created_at DESC, s.rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        let doctor = match opt_uuid_at(row, 5)? {
            Some(id) => Some(DoctorRef {
                id,
                full_name: row.get(6)?,
            }),
            None => None,
        };
        Ok(Suggestion {
            id: uuid_at(row, 0)?,
            patient_id: uuid_at(row, 1)?,
            doctor_id: uuid_at(row, 2)?,
            suggestion: row.get(3)?,
            created_at: timestamp_at(row, 4)?,
            doctor,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
