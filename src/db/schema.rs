//! Schema definition for the task store.
//!
//! `ensure` declares the current shape of every table, index, the
//! full-text index and its triggers. All statements are idempotent, so
//! it is safe to run on every startup. Versioned evolution of older
//! stores lives in [`super::migrations`].

use anyhow::Result;
use rusqlite::Connection;

use super::now;

/// Create anything missing from the current schema.
pub fn ensure(conn: &Connection) -> Result<()> {
    create_core_tables(conn)?;
    create_tracking_tables(conn)?;
    create_integrations_table(conn)?;
    create_search_index(conn)?;
    Ok(())
}

/// Core entities: projects, tasks, labels and the task/label junction.
pub(crate) fn create_core_tables(conn: &Connection) -> Result<()> {
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
            integrations TEXT,
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
            integrations TEXT,
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
            integrations TEXT,
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

/// Time entries and task enhancements, both owned by a task.
pub(crate) fn create_tracking_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS time_entries (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            duration_minutes INTEGER,
            energy_rating INTEGER CHECK (energy_rating BETWEEN 1 AND 5),
            focus_rating INTEGER CHECK (focus_rating BETWEEN 1 AND 5),
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_time_entries_task ON time_entries(task_id);

        CREATE TABLE IF NOT EXISTS task_enhancements (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK (kind IN ('note', 'checkpoint', 'resource')),
            content TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_task_enhancements_task ON task_enhancements(task_id);",
    )?;
    Ok(())
}

/// Per-provider sync state.
pub(crate) fn create_integrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS integrations (
            provider TEXT PRIMARY KEY,
            is_active INTEGER NOT NULL DEFAULT 0,
            config TEXT,
            last_sync_at TEXT,
            sync_token TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// FTS5 index over task text columns, kept consistent by triggers.
pub(crate) fn create_search_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS tasks_fts USING fts5(
            task_id UNINDEXED,
            title,
            description,
            notes
        );

        CREATE TRIGGER IF NOT EXISTS tasks_fts_insert AFTER INSERT ON tasks BEGIN
            INSERT INTO tasks_fts (task_id, title, description, notes)
            VALUES (new.id, new.title, COALESCE(new.description, ''), COALESCE(new.notes, ''));
        END;

        CREATE TRIGGER IF NOT EXISTS tasks_fts_update
        AFTER UPDATE OF title, description, notes ON tasks BEGIN
            DELETE FROM tasks_fts WHERE task_id = old.id;
            INSERT INTO tasks_fts (task_id, title, description, notes)
            VALUES (new.id, new.title, COALESCE(new.description, ''), COALESCE(new.notes, ''));
        END;

        CREATE TRIGGER IF NOT EXISTS tasks_fts_delete AFTER DELETE ON tasks BEGIN
            DELETE FROM tasks_fts WHERE task_id = old.id;
        END;",
    )?;
    Ok(())
}

/// Insert the default projects and labels a new store starts with.
///
/// Runs once, when the database file is first created. Rows the user
/// later deletes are not resurrected.
pub(crate) fn seed_defaults(conn: &Connection) -> Result<()> {
    let ts = now();

    let projects: &[(&str, &str, &str, &str, i32)] = &[
        ("inbox", "Inbox", "#6b7280", "inbox", 0),
        ("work", "Work", "#3b82f6", "briefcase", 1),
        ("personal", "Personal", "#10b981", "home", 2),
    ];
    for (id, name, color, icon, sort_order) in projects {
        conn.execute(
            "INSERT OR IGNORE INTO projects (id, name, color, icon, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            rusqlite::params![id, name, color, icon, sort_order, ts],
        )?;
    }

    let labels: &[(&str, &str, &str, i32)] = &[
        ("urgent", "urgent", "#ef4444", 0),
        ("important", "important", "#f59e0b", 1),
        ("waiting", "waiting", "#8b5cf6", 2),
        ("someday", "someday", "#6b7280", 3),
    ];
    for (id, name, color, sort_order) in labels {
        conn.execute(
            "INSERT OR IGNORE INTO labels (id, name, color, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![id, name, color, sort_order, ts],
        )?;
    }

    Ok(())
}
