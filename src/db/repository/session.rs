use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{timestamp_at, uuid_at};
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::Session;

pub fn insert_session(conn: &Connection, session: &Session) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            &session.token_hash[..],
            session.user_id.to_string(),
            timestamp::format(&session.created_at),
            timestamp::format(&session.expires_at),
        ],
    )?;
    Ok(())
}

pub fn get_session(
    conn: &Connection,
    token_hash: &[u8; 32],
) -> Result<Option<Session>, DatabaseError> {
    let session = conn
        .query_row(
            "SELECT user_id, created_at, expires_at FROM sessions WHERE token_hash = ?1",
            params![&token_hash[..]],
            |row| {
                Ok(Session {
                    token_hash: *token_hash,
                    user_id: uuid_at(row, 0)?,
                    created_at: timestamp_at(row, 1)?,
                    expires_at: timestamp_at(row, 2)?,
                })
            },
        )
        .optional()?;
    Ok(session)
}

/// Remove a session. Returns whether a row was deleted.
pub fn delete_session(conn: &Connection, token_hash: &[u8; 32]) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![&token_hash[..]],
    )?;
    Ok(affected > 0)
}

/// Drop sessions that expired before `now`.
pub fn prune_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![timestamp::format(&now)],
    )?;
    Ok(deleted)
}
