//! Task CRUD, filtered listing, search and date-window views.

use anyhow::Result;
use chrono::{Days, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

use super::mapper::parse_task_row;
use super::query::{build_task_query, TaskFilter, DEFAULT_ORDER};
use super::{now, validate_datetime, Database};
use crate::error::EngineError;
use crate::types::{Task, TaskInput, TaskPatch, TaskStatus, DEFAULT_CONTEXT, DEFAULT_PRIORITY};

impl Database {
    /// Create a task, stamping id and timestamps.
    pub fn create_task(&self, input: TaskInput) -> Result<Task> {
        validate_title(&input.title)?;
        if let Some(level) = input.energy_level {
            validate_energy(level)?;
        }
        if let Some(due) = &input.due_date {
            validate_datetime("due_date", due)?;
        }

        let id = input
            .id
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        if input.parent_id.as_deref() == Some(id.as_str()) {
            return Err(EngineError::invalid_value("parent_id", "a task cannot be its own parent").into());
        }

        let ts = now();
        let status = input.status.unwrap_or(TaskStatus::Pending);
        let priority = input.priority.unwrap_or(DEFAULT_PRIORITY);
        let context = input
            .context
            .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());
        let focus_time = input.focus_time.unwrap_or(false);
        let integrations = input.integrations.unwrap_or_default();
        let completed_at = (status == TaskStatus::Completed).then(|| ts.clone());

        let source_json = input
            .source_task
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let integrations_json = if integrations.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&integrations)?)
        };

        let task = Task {
            id,
            title: input.title,
            description: input.description,
            project_id: input.project_id,
            parent_id: input.parent_id,
            priority,
            status,
            due_date: input.due_date,
            estimated_minutes: input.estimated_minutes,
            actual_minutes: input.actual_minutes,
            energy_level: input.energy_level,
            context,
            focus_time,
            notes: input.notes,
            source_task: input.source_task,
            integrations,
            created_at: ts.clone(),
            updated_at: ts,
            completed_at,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, description, project_id, parent_id, priority,
                                    status, due_date, estimated_minutes, actual_minutes,
                                    energy_level, context, focus_time, notes, source_task,
                                    integrations, created_at, updated_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                params![
                    task.id,
                    task.title,
                    task.description,
                    task.project_id,
                    task.parent_id,
                    task.priority,
                    task.status.as_str(),
                    task.due_date,
                    task.estimated_minutes,
                    task.actual_minutes,
                    task.energy_level,
                    task.context,
                    task.focus_time,
                    task.notes,
                    source_json,
                    integrations_json,
                    task.created_at,
                    task.updated_at,
                    task.completed_at,
                ],
            )?;
            Ok(task)
        })
    }

    /// Fetch a task by id.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks matching a filter.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let query = build_task_query(filter)?;
        self.with_conn(|conn| {
            debug!(sql = %query.sql, "listing tasks");
            let params_refs: Vec<&dyn ToSql> = query.params.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&query.sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }

    /// Full-text search over title, description and notes, best match first.
    pub fn search_tasks(&self, term: &str, limit: Option<i64>) -> Result<Vec<Task>> {
        if term.trim().is_empty() {
            return Err(EngineError::missing_field("query").into());
        }
        let filter = TaskFilter {
            search: Some(term.to_string()),
            limit: Some(limit.unwrap_or(20).min(100)),
            ..Default::default()
        };
        self.list_tasks(&filter)
    }

    /// Apply a partial update and return the new row.
    ///
    /// Entering `completed` stamps `completed_at`; leaving it clears
    /// the stamp again.
    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(Some(level)) = patch.energy_level {
            validate_energy(level)?;
        }
        if let Some(Some(due)) = &patch.due_date {
            validate_datetime("due_date", due)?;
        }
        if let Some(Some(parent_id)) = &patch.parent_id {
            if parent_id == task_id {
                return Err(EngineError::invalid_value(
                    "parent_id",
                    "a task cannot be its own parent",
                )
                .into());
            }
        }

        let ts = now();
        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?
                .ok_or_else(|| EngineError::not_found("Task", task_id))?;

            let status = patch.status.unwrap_or(task.status);
            let completed_at = if status == TaskStatus::Completed
                && task.status != TaskStatus::Completed
            {
                Some(ts.clone())
            } else if status != TaskStatus::Completed && task.status == TaskStatus::Completed {
                None
            } else {
                task.completed_at.clone()
            };

            let updated = Task {
                id: task.id,
                title: patch.title.clone().unwrap_or(task.title),
                description: patch.description.clone().unwrap_or(task.description),
                project_id: patch.project_id.clone().unwrap_or(task.project_id),
                parent_id: patch.parent_id.clone().unwrap_or(task.parent_id),
                priority: patch.priority.unwrap_or(task.priority),
                status,
                due_date: patch.due_date.clone().unwrap_or(task.due_date),
                estimated_minutes: patch.estimated_minutes.unwrap_or(task.estimated_minutes),
                actual_minutes: patch.actual_minutes.unwrap_or(task.actual_minutes),
                energy_level: patch.energy_level.unwrap_or(task.energy_level),
                context: patch.context.clone().unwrap_or(task.context),
                focus_time: patch.focus_time.unwrap_or(task.focus_time),
                notes: patch.notes.clone().unwrap_or(task.notes),
                source_task: task.source_task,
                integrations: task.integrations,
                created_at: task.created_at,
                updated_at: ts.clone(),
                completed_at,
            };

            conn.execute(
                "UPDATE tasks
                 SET title = ?1, description = ?2, project_id = ?3, parent_id = ?4,
                     priority = ?5, status = ?6, due_date = ?7, estimated_minutes = ?8,
                     actual_minutes = ?9, energy_level = ?10, context = ?11, focus_time = ?12,
                     notes = ?13, updated_at = ?14, completed_at = ?15
                 WHERE id = ?16",
                params![
                    updated.title,
                    updated.description,
                    updated.project_id,
                    updated.parent_id,
                    updated.priority,
                    updated.status.as_str(),
                    updated.due_date,
                    updated.estimated_minutes,
                    updated.actual_minutes,
                    updated.energy_level,
                    updated.context,
                    updated.focus_time,
                    updated.notes,
                    updated.updated_at,
                    updated.completed_at,
                    task_id,
                ],
            )?;
            Ok(updated)
        })
    }

    /// Delete a task. Labels, time entries and enhancements cascade;
    /// subtasks survive with their parent reference cleared.
    pub fn delete_task(&self, task_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if deleted == 0 {
                return Err(EngineError::not_found("Task", task_id).into());
            }
            Ok(())
        })
    }

    /// Open tasks due on the current UTC day.
    pub fn tasks_due_today(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT t.* FROM tasks t
                 WHERE t.due_date IS NOT NULL
                   AND date(t.due_date) = date('now')
                   AND t.status != 'completed'
                 ORDER BY {DEFAULT_ORDER}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }

    /// Open tasks whose due day has passed.
    pub fn tasks_overdue(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT t.* FROM tasks t
                 WHERE t.due_date IS NOT NULL
                   AND date(t.due_date) < date('now')
                   AND t.status != 'completed'
                 ORDER BY {DEFAULT_ORDER}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }

    /// Open tasks due within the next `days` days, excluding today.
    pub fn tasks_upcoming(&self, days: i64) -> Result<Vec<Task>> {
        if days < 0 {
            return Err(EngineError::invalid_value("days", "must not be negative").into());
        }
        let end = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(days as u64))
            .ok_or_else(|| EngineError::invalid_value("days", "out of range"))?
            .to_string();
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT t.* FROM tasks t
                 WHERE t.due_date IS NOT NULL
                   AND date(t.due_date) > date('now')
                   AND date(t.due_date) <= date(?1)
                   AND t.status != 'completed'
                 ORDER BY {DEFAULT_ORDER}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params![end], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }

    /// Recently completed tasks, newest first.
    pub fn tasks_completed(&self, limit: Option<i64>) -> Result<Vec<Task>> {
        let limit = limit.unwrap_or(50).min(500);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.* FROM tasks t
                 WHERE t.status = 'completed'
                 ORDER BY t.completed_at DESC
                 LIMIT ?1",
            )?;
            let tasks = stmt
                .query_map(params![limit], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }
}

pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    match conn.query_row(
        "SELECT t.* FROM tasks t WHERE t.id = ?1",
        params![task_id],
        parse_task_row,
    ) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn task_exists(conn: &Connection, task_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE id = ?1",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn validate_title(title: &str) -> Result<(), EngineError> {
    if title.trim().is_empty() {
        return Err(EngineError::missing_field("title"));
    }
    Ok(())
}

fn validate_energy(level: i32) -> Result<(), EngineError> {
    if !(1..=5).contains(&level) {
        return Err(EngineError::invalid_value(
            "energy_level",
            "must be between 1 and 5",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().expect("Failed to create in-memory database")
    }

    fn make_task(db: &Database, title: &str) -> Task {
        db.create_task(TaskInput {
            title: title.to_string(),
            ..Default::default()
        })
        .expect("Failed to create task")
    }

    #[test]
    fn test_search_finds_new_tasks() {
        let db = setup_db();
        make_task(&db, "Write quarterly report");
        make_task(&db, "Water the plants");

        let hits = db.search_tasks("quarterly", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Write quarterly report");
    }

    #[test]
    fn test_search_reflects_updates() {
        let db = setup_db();
        let task = make_task(&db, "Draft proposal");

        let patch = TaskPatch {
            title: Some("Review contract".to_string()),
            ..Default::default()
        };
        db.update_task(&task.id, &patch).unwrap();

        assert!(db.search_tasks("proposal", None).unwrap().is_empty());
        let hits = db.search_tasks("contract", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, task.id);
    }

    #[test]
    fn test_search_forgets_deleted_tasks() {
        let db = setup_db();
        let task = make_task(&db, "Ephemeral chore");
        db.delete_task(&task.id).unwrap();
        assert!(db.search_tasks("ephemeral", None).unwrap().is_empty());
    }

    #[test]
    fn test_search_covers_notes() {
        let db = setup_db();
        db.create_task(TaskInput {
            title: "Plan offsite".to_string(),
            notes: Some("remember the projector cable".to_string()),
            ..Default::default()
        })
        .unwrap();

        let hits = db.search_tasks("projector", None).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_completing_stamps_and_reopening_clears() {
        let db = setup_db();
        let task = make_task(&db, "Finish me");
        assert!(task.completed_at.is_none());

        let done = db
            .update_task(
                &task.id,
                &TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(done.completed_at.is_some());

        let reopened = db
            .update_task(
                &task.id,
                &TaskPatch {
                    status: Some(TaskStatus::Pending),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn test_task_cannot_be_its_own_parent() {
        let db = setup_db();
        let task = make_task(&db, "Loop");
        let patch = TaskPatch {
            parent_id: Some(Some(task.id.clone())),
            ..Default::default()
        };
        assert!(db.update_task(&task.id, &patch).is_err());
    }

    #[test]
    fn test_date_windows_partition_tasks() {
        let db = setup_db();
        let today = Utc::now().date_naive();
        let yesterday = (today - Days::new(1)).to_string();
        let tomorrow = (today + Days::new(1)).to_string();

        db.create_task(TaskInput {
            title: "Late".to_string(),
            due_date: Some(yesterday),
            ..Default::default()
        })
        .unwrap();
        db.create_task(TaskInput {
            title: "Today".to_string(),
            due_date: Some(today.to_string()),
            ..Default::default()
        })
        .unwrap();
        db.create_task(TaskInput {
            title: "Soon".to_string(),
            due_date: Some(tomorrow),
            ..Default::default()
        })
        .unwrap();

        let overdue = db.tasks_overdue().unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "Late");

        let due_today = db.tasks_due_today().unwrap();
        assert_eq!(due_today.len(), 1);
        assert_eq!(due_today[0].title, "Today");

        let upcoming = db.tasks_upcoming(7).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "Soon");
    }

    #[test]
    fn test_upcoming_rejects_windows_outside_the_calendar() {
        let db = setup_db();
        assert!(db.tasks_upcoming(-1).is_err());
        assert!(db.tasks_upcoming(i64::MAX).is_err());
    }

    #[test]
    fn test_completed_tasks_leave_date_views() {
        let db = setup_db();
        let yesterday = (Utc::now().date_naive() - Days::new(1)).to_string();
        let task = db
            .create_task(TaskInput {
                title: "Was late".to_string(),
                due_date: Some(yesterday),
                ..Default::default()
            })
            .unwrap();

        db.update_task(
            &task.id,
            &TaskPatch {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(db.tasks_overdue().unwrap().is_empty());
        let done = db.tasks_completed(None).unwrap();
        assert_eq!(done.len(), 1);
    }
}
