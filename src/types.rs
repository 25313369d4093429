//! Core types for the task store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Task priority as an integer (lower = more urgent).
/// Typical range: 0 (urgent) to 4 (someday).
pub type Priority = i32;

/// Priority assigned when the caller does not provide one.
pub const DEFAULT_PRIORITY: Priority = 2;

/// Context assigned when the caller does not provide one.
pub const DEFAULT_CONTEXT: &str = "work";

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

/// Kind of a task enhancement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementKind {
    Note,
    Checkpoint,
    Resource,
}

impl EnhancementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnhancementKind::Note => "note",
            EnhancementKind::Checkpoint => "checkpoint",
            EnhancementKind::Resource => "resource",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "note" => Some(EnhancementKind::Note),
            "checkpoint" => Some(EnhancementKind::Checkpoint),
            "resource" => Some(EnhancementKind::Resource),
            _ => None,
        }
    }
}

/// A task row. Timestamps are RFC 3339 UTC strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub parent_id: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<String>,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: Option<i32>,
    pub energy_level: Option<i32>,
    pub context: String,
    pub focus_time: bool,
    pub notes: Option<String>,
    /// Raw payload the task was imported from, if any.
    pub source_task: Option<Value>,
    /// Per-provider sync payloads keyed by provider name.
    pub integrations: HashMap<String, Value>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub parent_id: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: Option<i32>,
    pub energy_level: Option<i32>,
    pub context: Option<String>,
    pub focus_time: Option<bool>,
    pub notes: Option<String>,
    pub source_task: Option<Value>,
    pub integrations: Option<HashMap<String, Value>>,
}

/// Partial update for a task. Outer `None` leaves the field untouched;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub project_id: Option<Option<String>>,
    pub parent_id: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<String>>,
    pub estimated_minutes: Option<Option<i32>>,
    pub actual_minutes: Option<Option<i32>>,
    pub energy_level: Option<Option<i32>>,
    pub context: Option<String>,
    pub focus_time: Option<bool>,
    pub notes: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.project_id.is_none()
            && self.parent_id.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.estimated_minutes.is_none()
            && self.actual_minutes.is_none()
            && self.energy_level.is_none()
            && self.context.is_none()
            && self.focus_time.is_none()
            && self.notes.is_none()
    }
}

/// A project row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub sort_order: i32,
    pub favorite: bool,
    pub archived: bool,
    pub integrations: HashMap<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when creating a project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInput {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<String>,
    pub sort_order: Option<i32>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
    pub integrations: Option<HashMap<String, Value>>,
}

/// Partial update for a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub parent_id: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.icon.is_none()
            && self.parent_id.is_none()
            && self.sort_order.is_none()
            && self.favorite.is_none()
            && self.archived.is_none()
    }
}

/// A label row. Names are unique across the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
    pub integrations: HashMap<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when creating a label.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelInput {
    pub id: Option<String>,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub integrations: Option<HashMap<String, Value>>,
}

/// Partial update for a label.
#[derive(Debug, Clone, Default)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

impl LabelPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.description.is_none()
            && self.sort_order.is_none()
    }
}

/// A tracked interval of work on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_minutes: Option<i64>,
    pub energy_rating: Option<i32>,
    pub focus_rating: Option<i32>,
    pub created_at: String,
}

/// Fields accepted when logging a time entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeEntryInput {
    pub id: Option<String>,
    pub task_id: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_minutes: Option<i64>,
    pub energy_rating: Option<i32>,
    pub focus_rating: Option<i32>,
}

/// An ordered child row attached to a task: a note, a checkpoint
/// in a breakdown, or a linked resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnhancement {
    pub id: String,
    pub task_id: String,
    pub kind: EnhancementKind,
    pub content: String,
    pub sort_order: i32,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when adding an enhancement.
#[derive(Debug, Clone, Deserialize)]
pub struct EnhancementInput {
    pub id: Option<String>,
    pub task_id: String,
    pub kind: EnhancementKind,
    pub content: String,
    pub sort_order: Option<i32>,
    pub completed: Option<bool>,
}

/// Partial update for an enhancement.
#[derive(Debug, Clone, Default)]
pub struct EnhancementPatch {
    pub content: Option<String>,
    pub sort_order: Option<i32>,
    pub completed: Option<bool>,
}

impl EnhancementPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.sort_order.is_none() && self.completed.is_none()
    }
}

/// Sync state for one external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub provider: String,
    pub is_active: bool,
    pub config: Option<Value>,
    pub last_sync_at: Option<String>,
    pub sync_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Aggregate counts over a single snapshot of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_tasks: i64,
    /// Counts keyed by status name. Every status appears, zero included.
    pub by_status: HashMap<String, i64>,
    pub overdue: i64,
    /// Counts keyed by project name; tasks without a project are omitted.
    pub by_project: HashMap<String, i64>,
    pub by_context: HashMap<String, i64>,
    pub by_energy_level: HashMap<i64, i64>,
}

/// Result of a store health probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub schema_version: i32,
    pub task_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("paused"), None);
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TaskStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, TaskStatus::Cancelled);
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty(), "clearing a field is still a change");
    }
}
