use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::{enum_at, map_constraint, string_list_at, timestamp_at, uuid_at};
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::*;

const USER_COLUMNS: &str = "id, full_name, email, doctor_name, user_type, status, date_of_birth,
     blood_group, gender, allergies, medical_history, conditions, created_at, updated_at";

/// Filter for patient listings. Both fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    pub doctor_name: Option<String>,
    /// Case-insensitive substring of full name or email.
    pub search: Option<String>,
}

/// Insert a new account. Duplicate emails surface as `ConstraintViolation`.
pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<(), DatabaseError> {
    let created = timestamp::format(&user.created_at);
    conn.execute(
        "INSERT INTO users (id, full_name, email, password_hash, doctor_name, user_type, status,
         allergies, conditions, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '[]', '[]', ?8, ?8)",
        params![
            user.id.to_string(),
            user.full_name,
            user.email,
            user.password_hash,
            user.doctor_name,
            user.user_type.as_str(),
            UserStatus::default().as_str(),
            created,
        ],
    )
    .map_err(|e| map_constraint(e, "users.email"))?;
    Ok(())
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        params![email],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn get_credentials_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<UserCredentials>, DatabaseError> {
    let creds = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(UserCredentials {
                    user_id: uuid_at(row, 0)?,
                    password_hash: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(creds)
}

/// Merge `update` into the stored user and bump `updated_at`.
///
/// Returns `None` when the user does not exist. Read and write happen in one
/// transaction so concurrent partial updates cannot interleave. The write
/// lock is taken up front: a deferred read-then-write transaction in WAL
/// mode fails with SQLITE_BUSY instead of waiting on the busy timeout.
pub fn update_user(
    conn: &mut Connection,
    id: &Uuid,
    update: &UserUpdate,
    now: DateTime<Utc>,
) -> Result<Option<User>, DatabaseError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let Some(mut user) = get_user(&tx, id)? else {
        return Ok(None);
    };

    if let Some(v) = &update.full_name {
        user.full_name = v.clone();
    }
    if let Some(v) = &update.email {
        user.email = v.clone();
    }
    if let Some(v) = &update.doctor_name {
        user.doctor_name = v.clone();
    }
    if let Some(v) = update.user_type {
        user.user_type = v;
    }
    if let Some(v) = update.status {
        user.status = v;
    }
    if let Some(v) = &update.date_of_birth {
        user.date_of_birth = Some(v.clone());
    }
    if let Some(v) = &update.blood_group {
        user.blood_group = Some(v.clone());
    }
    if let Some(v) = &update.gender {
        user.gender = Some(v.clone());
    }
    if let Some(v) = &update.allergies {
        user.allergies = v.clone();
    }
    if let Some(v) = &update.medical_history {
        user.medical_history = Some(v.clone());
    }
    if let Some(v) = &update.conditions {
        user.conditions = v.clone();
    }
    user.updated_at = now;

    let allergies = serde_json::to_string(&user.allergies).map_err(|e| DatabaseError::Corrupt {
        column: "allergies".into(),
        reason: e.to_string(),
    })?;
    let conditions =
        serde_json::to_string(&user.conditions).map_err(|e| DatabaseError::Corrupt {
            column: "conditions".into(),
            reason: e.to_string(),
        })?;

    tx.execute(
        "UPDATE users SET full_name = ?2, email = ?3, doctor_name = ?4, user_type = ?5,
         status = ?6, date_of_birth = ?7, blood_group = ?8, gender = ?9, allergies = ?10,
         medical_history = ?11, conditions = ?12, updated_at = ?13
         WHERE id = ?1",
        params![
            id.to_string(),
            user.full_name,
            user.email,
            user.doctor_name,
            user.user_type.as_str(),
            user.status.as_str(),
            user.date_of_birth,
            user.blood_group,
            user.gender,
            allergies,
            user.medical_history,
            conditions,
            timestamp::format(&user.updated_at),
        ],
    )
    .map_err(|e| map_constraint(e, "users.email"))?;

    if let Some(hash) = &update.password_hash {
        tx.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![id.to_string(), hash],
        )?;
    }

    tx.commit()?;
    Ok(Some(user))
}

/// Patients matching `filter`, oldest account first.
pub fn list_patients(conn: &Connection, filter: &PatientFilter) -> Result<Vec<User>, DatabaseError> {
    let pattern = filter.search.as_deref().map(like_pattern);
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE user_type = 'patient'
           AND (?1 IS NULL OR doctor_name = ?1)
           AND (?2 IS NULL
                OR unicode_lower(full_name) LIKE ?2 ESCAPE '\\'
                OR unicode_lower(email) LIKE ?2 ESCAPE '\\')
         ORDER BY created_at ASC, rowid ASC"
    ))?;
    let rows = stmt.query_map(params![filter.doctor_name, pattern], row_to_user)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Count a doctor's patients by status.
pub fn patient_stats(conn: &Connection, doctor_name: &str) -> Result<PatientStats, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM users
         WHERE user_type = 'patient' AND doctor_name = ?1
         GROUP BY status",
    )?;
    let rows = stmt.query_map(params![doctor_name], |row| {
        Ok((enum_at::<UserStatus>(row, 0)?, row.get::<_, u32>(1)?))
    })?;

    let mut stats = PatientStats::default();
    for row in rows {
        let (status, count) = row?;
        match status {
            UserStatus::Active => stats.active = count,
            UserStatus::Inactive => stats.inactive = count,
            UserStatus::Critical => stats.critical = count,
        }
        stats.total += count;
    }
    Ok(stats)
}

/// Lower-cased `%term%` with LIKE wildcards escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: uuid_at(row, 0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        doctor_name: row.get(3)?,
        user_type: enum_at(row, 4)?,
        status: enum_at(row, 5)?,
        date_of_birth: row.get(6)?,
        blood_group: row.get(7)?,
        gender: row.get(8)?,
        allergies: string_list_at(row, 9)?,
        medical_history: row.get(10)?,
        conditions: string_list_at(row, 11)?,
        created_at: timestamp_at(row, 12)?,
        updated_at: timestamp_at(row, 13)?,
    })
}
