//! Versioned schema migrations driven by SQLite's `user_version` pragma.
//!
//! The stored version is compared against the registry on every open;
//! each pending migration runs inside its own transaction and bumps
//! `user_version` atomically with its changes. A store that is already
//! current passes through untouched.

use anyhow::{ensure, Result};
use rusqlite::Connection;
use tracing::info;

use super::schema;

/// Schema version identifier.
pub type SchemaVersion = i32;

/// Version a fully migrated store reports.
pub const SCHEMA_VERSION: SchemaVersion = 4;

/// A single schema migration step.
pub struct Migration {
    pub version: SchemaVersion,
    pub description: &'static str,
    pub apply: fn(&Connection) -> Result<()>,
}

/// Registry of every migration, oldest first.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "core task, project and label tables",
        apply: migrate_v1,
    },
    Migration {
        version: 2,
        description: "time entries and task enhancements",
        apply: migrate_v2,
    },
    Migration {
        version: 3,
        description: "integration sync state",
        apply: migrate_v3,
    },
    Migration {
        version: 4,
        description: "full-text search over tasks",
        apply: migrate_v4,
    },
];

/// Read the stored schema version.
pub fn user_version(conn: &Connection) -> Result<SchemaVersion> {
    let version: SchemaVersion = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn set_user_version(conn: &Connection, version: SchemaVersion) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;
    Ok(())
}

/// Apply every migration newer than the stored version.
pub fn run(conn: &mut Connection) -> Result<()> {
    for pair in MIGRATIONS.windows(2) {
        ensure!(
            pair[0].version < pair[1].version,
            "migration registry out of order at version {}",
            pair[1].version
        );
    }

    let current = user_version(conn)?;
    ensure!(
        current <= SCHEMA_VERSION,
        "store version {} is newer than this build supports ({})",
        current,
        SCHEMA_VERSION
    );

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        (migration.apply)(&tx)?;
        set_user_version(&tx, migration.version)?;
        tx.commit()?;
        info!(
            version = migration.version,
            "applied schema migration: {}", migration.description
        );
    }

    Ok(())
}

/// Initial schema as first shipped, before integration columns existed.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            color TEXT,
            icon TEXT,
            parent_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            favorite INTEGER NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
            parent_id TEXT REFERENCES tasks(id) ON DELETE SET NULL,
            priority INTEGER NOT NULL DEFAULT 2,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'in_progress', 'completed', 'cancelled')),
            due_date TEXT,
            estimated_minutes INTEGER,
            actual_minutes INTEGER,
            energy_level INTEGER CHECK (energy_level BETWEEN 1 AND 5),
            context TEXT NOT NULL DEFAULT 'work',
            focus_time INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            source_task TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS labels (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            color TEXT,
            description TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS task_labels (
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            label_id TEXT NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
            PRIMARY KEY (task_id, label_id)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);
        CREATE INDEX IF NOT EXISTS idx_tasks_context ON tasks(context);
        CREATE INDEX IF NOT EXISTS idx_projects_parent ON projects(parent_id);
        CREATE INDEX IF NOT EXISTS idx_task_labels_label ON task_labels(label_id);",
    )?;
    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<()> {
    schema::create_tracking_tables(conn)
}

/// Adds the per-record integration columns plus the provider state table.
fn migrate_v3(conn: &Connection) -> Result<()> {
    for table in ["tasks", "projects", "labels"] {
        if !column_exists(conn, table, "integrations")? {
            conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN integrations TEXT"))?;
        }
    }
    schema::create_integrations_table(conn)
}

/// Creates the FTS index and backfills rows inserted before it existed.
fn migrate_v4(conn: &Connection) -> Result<()> {
    schema::create_search_index(conn)?;
    conn.execute(
        "INSERT INTO tasks_fts (task_id, title, description, notes)
         SELECT id, title, COALESCE(description, ''), COALESCE(notes, '')
         FROM tasks
         WHERE id NOT IN (SELECT task_id FROM tasks_fts)",
        [],
    )?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
