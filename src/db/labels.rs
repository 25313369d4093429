//! Label CRUD and task/label assignment.

use anyhow::Result;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::mapper::parse_label_row;
use super::tasks::task_exists;
use super::{now, Database};
use crate::error::EngineError;
use crate::types::{Label, LabelInput, LabelPatch};

impl Database {
    /// Create a label. Names are unique; a duplicate surfaces as a
    /// constraint violation.
    pub fn create_label(&self, input: LabelInput) -> Result<Label> {
        if input.name.trim().is_empty() {
            return Err(EngineError::missing_field("name").into());
        }

        let id = input
            .id
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let ts = now();
        let integrations = input.integrations.unwrap_or_default();
        let integrations_json = if integrations.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&integrations)?)
        };

        let label = Label {
            id,
            name: input.name,
            color: input.color,
            description: input.description,
            sort_order: input.sort_order.unwrap_or(0),
            integrations,
            created_at: ts.clone(),
            updated_at: ts,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO labels (id, name, color, description, sort_order, integrations,
                                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    label.id,
                    label.name,
                    label.color,
                    label.description,
                    label.sort_order,
                    integrations_json,
                    label.created_at,
                    label.updated_at,
                ],
            )?;
            Ok(label)
        })
    }

    pub fn list_labels(&self) -> Result<Vec<Label>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT l.* FROM labels l ORDER BY l.sort_order, l.name")?;
            let labels = stmt
                .query_map([], parse_label_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(labels)
        })
    }

    pub fn update_label(&self, label_id: &str, patch: &LabelPatch) -> Result<Label> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(EngineError::missing_field("name").into());
            }
        }

        let ts = now();
        self.with_conn(|conn| {
            let label = get_label_internal(conn, label_id)?
                .ok_or_else(|| EngineError::not_found("Label", label_id))?;

            let updated = Label {
                id: label.id,
                name: patch.name.clone().unwrap_or(label.name),
                color: patch.color.clone().unwrap_or(label.color),
                description: patch.description.clone().unwrap_or(label.description),
                sort_order: patch.sort_order.unwrap_or(label.sort_order),
                integrations: label.integrations,
                created_at: label.created_at,
                updated_at: ts.clone(),
            };

            conn.execute(
                "UPDATE labels
                 SET name = ?1, color = ?2, description = ?3, sort_order = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    updated.name,
                    updated.color,
                    updated.description,
                    updated.sort_order,
                    updated.updated_at,
                    label_id,
                ],
            )?;
            Ok(updated)
        })
    }

    /// Delete a label and its task associations.
    pub fn delete_label(&self, label_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM labels WHERE id = ?1", params![label_id])?;
            if deleted == 0 {
                return Err(EngineError::not_found("Label", label_id).into());
            }
            Ok(())
        })
    }

    /// Attach a label to a task, returning how many rows were added.
    /// Assigning twice is a no-op.
    pub fn assign_label(&self, task_id: &str, label_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            if !task_exists(conn, task_id)? {
                return Err(EngineError::not_found("Task", task_id).into());
            }
            if get_label_internal(conn, label_id)?.is_none() {
                return Err(EngineError::not_found("Label", label_id).into());
            }
            let added = conn.execute(
                "INSERT OR IGNORE INTO task_labels (task_id, label_id) VALUES (?1, ?2)",
                params![task_id, label_id],
            )?;
            Ok(added)
        })
    }

    /// Detach a label from a task, returning how many rows were
    /// removed. Removing an absent assignment is a no-op.
    pub fn remove_label(&self, task_id: &str, label_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM task_labels WHERE task_id = ?1 AND label_id = ?2",
                params![task_id, label_id],
            )?;
            Ok(removed)
        })
    }

    /// Labels attached to a task, in label sort order.
    pub fn labels_for_task(&self, task_id: &str) -> Result<Vec<Label>> {
        self.with_conn(|conn| {
            if !task_exists(conn, task_id)? {
                return Err(EngineError::not_found("Task", task_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT l.* FROM labels l
                 INNER JOIN task_labels tl ON tl.label_id = l.id
                 WHERE tl.task_id = ?1
                 ORDER BY l.sort_order, l.name",
            )?;
            let labels = stmt
                .query_map(params![task_id], parse_label_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(labels)
        })
    }
}

pub(crate) fn get_label_internal(conn: &Connection, label_id: &str) -> Result<Option<Label>> {
    match conn.query_row(
        "SELECT l.* FROM labels l WHERE l.id = ?1",
        params![label_id],
        parse_label_row,
    ) {
        Ok(label) => Ok(Some(label)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
