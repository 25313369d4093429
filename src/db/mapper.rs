//! Row-to-entity decoding shared by the query modules.
//!
//! SQLite stores booleans as integers and JSON payloads as TEXT; the
//! parsers here fold both back into their typed form. Each parser reads
//! columns by name so it works for any `SELECT t.*` projection.

use rusqlite::Row;
use serde_json::Value;
use std::collections::HashMap;

use crate::types::{
    EnhancementKind, Integration, Label, Project, Task, TaskEnhancement, TaskStatus, TimeEntry,
};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let focus_time: i64 = row.get("focus_time")?;
    let source_task: Option<String> = row.get("source_task")?;
    let integrations: Option<String> = row.get("integrations")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        project_id: row.get("project_id")?,
        parent_id: row.get("parent_id")?,
        priority: row.get("priority")?,
        status: TaskStatus::from_str(&status).unwrap_or(TaskStatus::Pending),
        due_date: row.get("due_date")?,
        estimated_minutes: row.get("estimated_minutes")?,
        actual_minutes: row.get("actual_minutes")?,
        energy_level: row.get("energy_level")?,
        context: row.get("context")?,
        focus_time: focus_time != 0,
        notes: row.get("notes")?,
        source_task: source_task.and_then(|s| serde_json::from_str(&s).ok()),
        integrations: parse_json_map(integrations),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
    })
}

pub fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    let favorite: i64 = row.get("favorite")?;
    let archived: i64 = row.get("archived")?;
    let integrations: Option<String> = row.get("integrations")?;

    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        parent_id: row.get("parent_id")?,
        sort_order: row.get("sort_order")?,
        favorite: favorite != 0,
        archived: archived != 0,
        integrations: parse_json_map(integrations),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn parse_label_row(row: &Row) -> rusqlite::Result<Label> {
    let integrations: Option<String> = row.get("integrations")?;

    Ok(Label {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        description: row.get("description")?,
        sort_order: row.get("sort_order")?,
        integrations: parse_json_map(integrations),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn parse_time_entry_row(row: &Row) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        started_at: row.get("started_at")?,
        ended_at: row.get("ended_at")?,
        duration_minutes: row.get("duration_minutes")?,
        energy_rating: row.get("energy_rating")?,
        focus_rating: row.get("focus_rating")?,
        created_at: row.get("created_at")?,
    })
}

pub fn parse_enhancement_row(row: &Row) -> rusqlite::Result<TaskEnhancement> {
    let kind: String = row.get("kind")?;
    let completed: i64 = row.get("completed")?;

    Ok(TaskEnhancement {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        kind: EnhancementKind::from_str(&kind).unwrap_or(EnhancementKind::Note),
        content: row.get("content")?,
        sort_order: row.get("sort_order")?,
        completed: completed != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn parse_integration_row(row: &Row) -> rusqlite::Result<Integration> {
    let is_active: i64 = row.get("is_active")?;
    let config: Option<String> = row.get("config")?;

    Ok(Integration {
        provider: row.get("provider")?,
        is_active: is_active != 0,
        config: config.and_then(|s| serde_json::from_str(&s).ok()),
        last_sync_at: row.get("last_sync_at")?,
        sync_token: row.get("sync_token")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_json_map(raw: Option<String>) -> HashMap<String, Value> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
