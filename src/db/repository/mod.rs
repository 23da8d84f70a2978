//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per collection. All public functions are re-exported here.

mod health_data;
mod session;
mod suggestion;
mod task;
mod user;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use super::DatabaseError;
use crate::models::timestamp;

pub use health_data::*;
pub use session::*;
pub use suggestion::*;
pub use task::*;
pub use user::*;

fn conversion_failure(idx: usize, err: DatabaseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn uuid_at(row: &Row, idx: usize) -> Result<Uuid, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

pub(crate) fn opt_uuid_at(row: &Row, idx: usize) -> Result<Option<Uuid>, rusqlite::Error> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => uuid_at(row, idx).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn timestamp_at(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw).ok_or_else(|| {
        conversion_failure(
            idx,
            DatabaseError::Corrupt {
                column: format!("#{idx}"),
                reason: format!("unparseable timestamp {raw:?}"),
            },
        )
    })
}

pub(crate) fn opt_timestamp_at(
    row: &Row,
    idx: usize,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => timestamp_at(row, idx).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn enum_at<T>(row: &Row, idx: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn string_list_at(row: &Row, idx: usize) -> Result<Vec<String>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        conversion_failure(
            idx,
            DatabaseError::Corrupt {
                column: format!("#{idx}"),
                reason: e.to_string(),
            },
        )
    })
}

/// Map a UNIQUE/CHECK failure to `ConstraintViolation`, pass everything else through.
pub(crate) fn map_constraint(err: rusqlite::Error, what: &str) -> DatabaseError {
    let db_err = DatabaseError::from(err);
    if db_err.is_constraint_violation() {
        DatabaseError::ConstraintViolation(what.to_string())
    } else {
        db_err
    }
}
