//! Tests for schema creation, migrations and referential integrity.
//!
//! These run against real files in a temp directory where reopening
//! matters, and against in-memory stores for constraint checks.

use taskstore::db::{Database, migrations};
use taskstore::error::EngineError;
use taskstore::types::TaskInput;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn stored_version(db: &Database) -> i32 {
    db.with_conn(|conn| migrations::user_version(conn))
        .expect("Failed to read user_version")
}

fn table_count(db: &Database, sql: &str, id: &str) -> i64 {
    db.with_conn(|conn| Ok(conn.query_row(sql, [id], |row| row.get(0))?))
        .expect("Failed to count rows")
}

#[test]
fn fresh_store_is_seeded_and_current() {
    let db = setup_db();

    let projects = db.list_projects(false).unwrap();
    let mut names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["Inbox", "Personal", "Work"]);

    let labels = db.list_labels().unwrap();
    let label_ids: Vec<&str> = labels.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(label_ids, ["urgent", "important", "waiting", "someday"]);

    assert_eq!(stored_version(&db), migrations::SCHEMA_VERSION);
}

#[test]
fn fresh_store_has_search_index_and_triggers() {
    let db = setup_db();

    let tables: Vec<String> = db
        .with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .unwrap();
    for expected in [
        "tasks",
        "projects",
        "labels",
        "task_labels",
        "time_entries",
        "task_enhancements",
        "integrations",
        "tasks_fts",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }

    let triggers: Vec<String> = db
        .with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type = 'trigger'")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .unwrap();
    for expected in ["tasks_fts_insert", "tasks_fts_update", "tasks_fts_delete"] {
        assert!(
            triggers.iter().any(|t| t == expected),
            "missing trigger {expected}"
        );
    }
}

#[test]
fn deleted_seed_rows_stay_deleted_across_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tasks.db");

    {
        let db = Database::open(&path).unwrap();
        db.delete_label("someday").unwrap();
        db.delete_project("inbox").unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert!(db.list_labels().unwrap().iter().all(|l| l.id != "someday"));
    assert!(
        db.list_projects(true)
            .unwrap()
            .iter()
            .all(|p| p.id != "inbox")
    );
    assert_eq!(stored_version(&db), migrations::SCHEMA_VERSION);
}

#[test]
fn tasks_survive_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("tasks.db");

    let id = {
        let db = Database::open(&path).unwrap();
        db.create_task(TaskInput {
            title: "Persisted".to_string(),
            ..Default::default()
        })
        .unwrap()
        .id
    };

    let db = Database::open(&path).unwrap();
    let task = db.get_task(&id).unwrap().expect("task should persist");
    assert_eq!(task.title, "Persisted");
}

#[test]
fn unknown_project_reference_is_a_constraint_violation() {
    let db = setup_db();
    let err = db
        .create_task(TaskInput {
            title: "Orphan".to_string(),
            project_id: Some("no-such-project".to_string()),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(EngineError::from(err).code(), "CONSTRAINT_VIOLATION");
}

#[test]
fn check_constraints_reject_raw_bad_rows() {
    let db = setup_db();

    let bad_status = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tasks (id, title, status, created_at, updated_at)
             VALUES ('x1', 'bad', 'paused', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )?;
        Ok(())
    });
    assert!(bad_status.is_err(), "status outside the CHECK list must fail");

    let bad_energy = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tasks (id, title, energy_level, created_at, updated_at)
             VALUES ('x2', 'bad', 9, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )?;
        Ok(())
    });
    assert!(bad_energy.is_err(), "energy outside 1..=5 must fail");
}

#[test]
fn deleting_a_task_cascades_to_label_links() {
    let db = setup_db();
    let task = db
        .create_task(TaskInput {
            title: "Tagged".to_string(),
            ..Default::default()
        })
        .unwrap();
    db.assign_label(&task.id, "urgent").unwrap();
    let links = "SELECT COUNT(*) FROM task_labels WHERE task_id = ?1";
    assert_eq!(table_count(&db, links, &task.id), 1);

    db.delete_task(&task.id).unwrap();
    assert_eq!(table_count(&db, links, &task.id), 0);
}

#[test]
fn deleting_a_parent_detaches_its_subtasks() {
    let db = setup_db();
    let parent = db
        .create_task(TaskInput {
            title: "Parent".to_string(),
            ..Default::default()
        })
        .unwrap();
    let child = db
        .create_task(TaskInput {
            title: "Child".to_string(),
            parent_id: Some(parent.id.clone()),
            ..Default::default()
        })
        .unwrap();

    db.delete_task(&parent.id).unwrap();

    let child = db.get_task(&child.id).unwrap().expect("child should survive");
    assert_eq!(child.parent_id, None);
}

#[test]
fn deleting_a_project_detaches_its_tasks() {
    let db = setup_db();
    let task = db
        .create_task(TaskInput {
            title: "Filed".to_string(),
            project_id: Some("work".to_string()),
            ..Default::default()
        })
        .unwrap();

    db.delete_project("work").unwrap();

    let task = db.get_task(&task.id).unwrap().expect("task should survive");
    assert_eq!(task.project_id, None);
}
