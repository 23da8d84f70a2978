use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{opt_timestamp_at, opt_uuid_at, timestamp_at, uuid_at};
use crate::db::DatabaseError;
use crate::models::timestamp;
use crate::models::{DoctorRef, Task};

pub fn insert_task(conn: &Connection, task: &Task) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO tasks (id, patient_id, doctor_id, task, completed, assigned_date, completed_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            task.id.to_string(),
            task.patient_id.to_string(),
            task.doctor_id.to_string(),
            task.task,
            task.completed as i32,
            timestamp::format(&task.assigned_date),
            task.completed_date.as_ref().map(timestamp::format),
        ],
    )?;
    Ok(())
}

pub fn get_task(conn: &Connection, id: &Uuid) -> Result<Option<Task>, DatabaseError> {
    let task = conn
        .query_row(
            "SELECT t.id, t.patient_id, t.doctor_id, t.task, t.completed, t.assigned_date,
                    t.completed_date, NULL, NULL
             FROM tasks t WHERE t.id = ?1",
            params![id.to_string()],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

/// Tasks for a patient, newest assignment first, with the assigning doctor populated.
pub fn get_tasks_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Task>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.patient_id, t.doctor_id, t.task, t.completed, t.assigned_date,
                t.completed_date, d.id, d.full_name
         FROM tasks t
         LEFT JOIN users d ON d.id = t.doctor_id
         WHERE t.patient_id = ?1
         ORDER BY t.assigned_date DESC, t.rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_task)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Set the completion flag. `completed_date` is `at` when completing, NULL otherwise.
///
/// Returns the updated task, or `None` if no task has this id.
pub fn set_task_completed(
    conn: &Connection,
    id: &Uuid,
    completed: bool,
    at: DateTime<Utc>,
) -> Result<Option<Task>, DatabaseError> {
    let completed_date = completed.then(|| timestamp::format(&at));
    let affected = conn.execute(
        "UPDATE tasks SET completed = ?2, completed_date = ?3 WHERE id = ?1",
        params![id.to_string(), completed as i32, completed_date],
    )?;
    if affected == 0 {
        return Ok(None);
    }
    get_task(conn, id)
}

fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let doctor = match opt_uuid_at(row, 7)? {
        Some(id) => Some(DoctorRef {
            id,
            full_name: row.get(8)?,
        }),
        None => None,
    };

    Ok(Task {
        id: uuid_at(row, 0)?,
        patient_id: uuid_at(row, 1)?,
        doctor_id: uuid_at(row, 2)?,
        task: row.get(3)?,
        completed: row.get::<_, i32>(4)? != 0,
        assigned_date: timestamp_at(row, 5)?,
        completed_date: opt_timestamp_at(row, 6)?,
        doctor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{days_ago, insert_test_user};
    use crate::db::sqlite::open_memory_database;
    use crate::models::UserType;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn make_task(patient_id: Uuid, doctor_id: Uuid, text: &str, age_days: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            task: text.into(),
            completed: false,
            assigned_date: days_ago(age_days),
            completed_date: None,
            doctor: None,
        }
    }

    #[test]
    fn list_is_newest_first_with_doctor_populated() {
        let conn = test_db();
        let doctor = insert_test_user(&conn, "Dr B", "drb@x.com", "Dr B", UserType::Doctor);
        let patient = Uuid::new_v4();
        insert_task(&conn, &make_task(patient, doctor, "old", 3)).unwrap();
        insert_task(&conn, &make_task(patient, doctor, "new", 0)).unwrap();

        let tasks = get_tasks_for_patient(&conn, &patient).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task, "new");
        let populated = tasks[0].doctor.as_ref().unwrap();
        assert_eq!(populated.id, doctor);
        assert_eq!(populated.full_name, "Dr B");
    }

    #[test]
    fn unknown_doctor_is_not_populated() {
        let conn = test_db();
        let patient = Uuid::new_v4();
        insert_task(&conn, &make_task(patient, Uuid::new_v4(), "walk", 0)).unwrap();
        let tasks = get_tasks_for_patient(&conn, &patient).unwrap();
        assert!(tasks[0].doctor.is_none());
    }

    #[test]
    fn completion_toggle_sets_and_clears_date() {
        let conn = test_db();
        let task = make_task(Uuid::new_v4(), Uuid::new_v4(), "walk", 0);
        insert_task(&conn, &task).unwrap();
        let at = timestamp::now();

        let done = set_task_completed(&conn, &task.id, true, at).unwrap().unwrap();
        assert!(done.completed);
        assert_eq!(done.completed_date, Some(at));

        let reopened = set_task_completed(&conn, &task.id, false, at).unwrap().unwrap();
        assert!(!reopened.completed);
        assert!(reopened.completed_date.is_none());
    }

    #[test]
    fn completing_missing_task_is_none() {
        let conn = test_db();
        let result = set_task_completed(&conn, &Uuid::new_v4(), true, timestamp::now()).unwrap();
        assert!(result.is_none());
    }
}
