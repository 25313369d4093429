//! Time entries logged against tasks.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;
use uuid::Uuid;

use super::mapper::parse_time_entry_row;
use super::tasks::task_exists;
use super::{now, validate_datetime, Database};
use crate::error::EngineError;
use crate::types::{TimeEntry, TimeEntryInput};

impl Database {
    /// Log a work interval. When the interval has both endpoints and no
    /// explicit duration, the duration is derived from them.
    pub fn log_time(&self, input: TimeEntryInput) -> Result<TimeEntry> {
        validate_datetime("started_at", &input.started_at)?;
        if let Some(ended_at) = &input.ended_at {
            validate_datetime("ended_at", ended_at)?;
        }
        if let Some(rating) = input.energy_rating {
            validate_rating("energy_rating", rating)?;
        }
        if let Some(rating) = input.focus_rating {
            validate_rating("focus_rating", rating)?;
        }
        if let Some(minutes) = input.duration_minutes {
            if minutes < 0 {
                return Err(
                    EngineError::invalid_value("duration_minutes", "must not be negative").into(),
                );
            }
        }

        let duration_minutes = match (input.duration_minutes, &input.ended_at) {
            (Some(explicit), _) => Some(explicit),
            (None, Some(ended_at)) => Some(derive_duration(&input.started_at, ended_at)?),
            (None, None) => None,
        };

        let entry = TimeEntry {
            id: input
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            task_id: input.task_id,
            started_at: input.started_at,
            ended_at: input.ended_at,
            duration_minutes,
            energy_rating: input.energy_rating,
            focus_rating: input.focus_rating,
            created_at: now(),
        };

        self.with_conn(|conn| {
            if !task_exists(conn, &entry.task_id)? {
                return Err(EngineError::not_found("Task", entry.task_id.clone()).into());
            }
            conn.execute(
                "INSERT INTO time_entries (id, task_id, started_at, ended_at, duration_minutes,
                                           energy_rating, focus_rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id,
                    entry.task_id,
                    entry.started_at,
                    entry.ended_at,
                    entry.duration_minutes,
                    entry.energy_rating,
                    entry.focus_rating,
                    entry.created_at,
                ],
            )?;
            Ok(entry)
        })
    }

    /// Entries for a task, oldest first.
    pub fn time_entries(&self, task_id: &str) -> Result<Vec<TimeEntry>> {
        self.with_conn(|conn| {
            if !task_exists(conn, task_id)? {
                return Err(EngineError::not_found("Task", task_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT * FROM time_entries WHERE task_id = ?1 ORDER BY started_at",
            )?;
            let entries = stmt
                .query_map(params![task_id], parse_time_entry_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(entries)
        })
    }

    pub fn delete_time_entry(&self, entry_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM time_entries WHERE id = ?1", params![entry_id])?;
            if deleted == 0 {
                return Err(EngineError::not_found("Time entry", entry_id).into());
            }
            Ok(())
        })
    }
}

fn derive_duration(started_at: &str, ended_at: &str) -> Result<i64, EngineError> {
    let start = parse_point(started_at)
        .ok_or_else(|| EngineError::invalid_value("started_at", "unparseable timestamp"))?;
    let end = parse_point(ended_at)
        .ok_or_else(|| EngineError::invalid_value("ended_at", "unparseable timestamp"))?;
    let minutes = (end - start).num_minutes();
    if minutes < 0 {
        return Err(EngineError::invalid_value(
            "ended_at",
            "must not precede started_at",
        ));
    }
    Ok(minutes)
}

fn parse_point(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn validate_rating(field: &str, rating: i32) -> Result<(), EngineError> {
    if !(1..=5).contains(&rating) {
        return Err(EngineError::invalid_value(field, "must be between 1 and 5"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskInput;

    fn setup() -> (Database, String) {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        let task = db
            .create_task(TaskInput {
                title: "Timed work".to_string(),
                ..Default::default()
            })
            .unwrap();
        (db, task.id)
    }

    #[test]
    fn test_duration_derived_from_endpoints() {
        let (db, task_id) = setup();
        let entry = db
            .log_time(TimeEntryInput {
                task_id,
                started_at: "2026-02-01T09:00:00Z".to_string(),
                ended_at: Some("2026-02-01T10:30:00Z".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(entry.duration_minutes, Some(90));
    }

    #[test]
    fn test_explicit_duration_wins() {
        let (db, task_id) = setup();
        let entry = db
            .log_time(TimeEntryInput {
                task_id,
                started_at: "2026-02-01T09:00:00Z".to_string(),
                ended_at: Some("2026-02-01T10:30:00Z".to_string()),
                duration_minutes: Some(45),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(entry.duration_minutes, Some(45));
    }

    #[test]
    fn test_reversed_interval_is_rejected() {
        let (db, task_id) = setup();
        let err = db
            .log_time(TimeEntryInput {
                task_id,
                started_at: "2026-02-01T10:00:00Z".to_string(),
                ended_at: Some("2026-02-01T09:00:00Z".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        let err = crate::error::EngineError::from(err);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_entries_listed_oldest_first() {
        let (db, task_id) = setup();
        for started in ["2026-02-02T09:00:00Z", "2026-02-01T09:00:00Z"] {
            db.log_time(TimeEntryInput {
                task_id: task_id.clone(),
                started_at: started.to_string(),
                ..Default::default()
            })
            .unwrap();
        }
        let entries = db.time_entries(&task_id).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].started_at < entries[1].started_at);
    }

    #[test]
    fn test_entries_cascade_with_task() {
        let (db, task_id) = setup();
        let entry = db
            .log_time(TimeEntryInput {
                task_id: task_id.clone(),
                started_at: "2026-02-01T09:00:00Z".to_string(),
                ..Default::default()
            })
            .unwrap();

        db.delete_task(&task_id).unwrap();

        let err = db.delete_time_entry(&entry.id).unwrap_err();
        let err = crate::error::EngineError::from(err);
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
