use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{timestamp_at, uuid_at};
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::HealthData;

const HEALTH_DATA_COLUMNS: &str = "id, user_id, date, heart_rate, blood_pressure, weight, sleep,
     glucose, steps, water, notes, created_at";

/// Insert a health data record.
pub fn insert_health_data(conn: &Connection, record: &HealthData) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO health_data (id, user_id, date, heart_rate, blood_pressure, weight, sleep,
         glucose, steps, water, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.id.to_string(),
            record.user_id.to_string(),
            timestamp::format(&record.date),
            record.heart_rate,
            record.blood_pressure,
            record.weight,
            record.sleep,
            record.glucose,
            record.steps,
            record.water,
            record.notes,
            timestamp::format(&record.created_at),
        ],
    )?;
    Ok(())
}

/// All records for a user, ordered by date descending (newest insert first on ties).
pub fn get_health_data_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<HealthData>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HEALTH_DATA_COLUMNS} FROM health_data
         WHERE user_id = ?1
         ORDER BY date DESC, created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], row_to_health_data)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Most recent record for a user.
pub fn get_latest_health_data(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<HealthData>, DatabaseError> {
    let record = conn
        .query_row(
            &format!(
                "SELECT {HEALTH_DATA_COLUMNS} FROM health_data
                 WHERE user_id = ?1
                 ORDER BY date DESC, created_at DESC, rowid DESC
                 LIMIT 1"
            ),
            params![user_id.to_string()],
            row_to_health_data,
        )
        .optional()?;
    Ok(record)
}

fn row_to_health_data(row: &rusqlite::Row) -> Result<HealthData, rusqlite::Error> {
    Ok(HealthData {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        date: timestamp_at(row, 2)?,
        heart_rate: row.get(3)?,
        blood_pressure: row.get(4)?,
        weight: row.get(5)?,
        sleep: row.get(6)?,
        glucose: row.get(7)?,
        steps: row.get(8)?,
        water: row.get(9)?,
        notes: row.get(10)?,
        created_at: timestamp_at(row, 11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::days_ago;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_record(user_id: Uuid, age_days: i64, heart_rate: f64) -> HealthData {
        HealthData {
            id: Uuid::new_v4(),
            user_id,
            date: days_ago(age_days),
            heart_rate: Some(heart_rate),
            blood_pressure: Some("120/80".into()),
            weight: Some(68.5),
            sleep: None,
            glucose: None,
            steps: Some(8500.0),
            water: None,
            notes: None,
            created_at: timestamp::now(),
        }
    }

    #[test]
    fn insert_and_list_round_trip() {
        let conn = test_db();
        let user = Uuid::new_v4();
        insert_health_data(&conn, &make_record(user, 0, 72.0)).unwrap();

        let records = get_health_data_for_user(&conn, &user).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].blood_pressure.as_deref(), Some("120/80"));
        assert!(records[0].sleep.is_none());
        assert!((records[0].heart_rate.unwrap() - 72.0).abs() < 0.01);
    }

    #[test]
    fn list_is_ordered_by_date_descending() {
        let conn = test_db();
        let user = Uuid::new_v4();
        // Inserted out of order on purpose
        insert_health_data(&conn, &make_record(user, 5, 70.0)).unwrap();
        insert_health_data(&conn, &make_record(user, 1, 71.0)).unwrap();
        insert_health_data(&conn, &make_record(user, 10, 72.0)).unwrap();

        let records = get_health_data_for_user(&conn, &user).unwrap();
        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
        assert!((records[0].heart_rate.unwrap() - 71.0).abs() < 0.01);
    }

    #[test]
    fn list_isolates_users() {
        let conn = test_db();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        insert_health_data(&conn, &make_record(alice, 0, 70.0)).unwrap();
        insert_health_data(&conn, &make_record(bob, 0, 90.0)).unwrap();

        assert_eq!(get_health_data_for_user(&conn, &alice).unwrap().len(), 1);
        assert!(get_health_data_for_user(&conn, &Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn latest_returns_newest_or_none() {
        let conn = test_db();
        let user = Uuid::new_v4();
        assert!(get_latest_health_data(&conn, &user).unwrap().is_none());

        insert_health_data(&conn, &make_record(user, 3, 70.0)).unwrap();
        insert_health_data(&conn, &make_record(user, 0, 75.0)).unwrap();
        let latest = get_latest_health_data(&conn, &user).unwrap().unwrap();
        assert!((latest.heart_rate.unwrap() - 75.0).abs() < 0.01);
    }
}
