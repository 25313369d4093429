//! Task enhancements: notes, breakdown checkpoints and linked resources.

use anyhow::Result;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::mapper::parse_enhancement_row;
use super::tasks::task_exists;
use super::{now, Database};
use crate::error::EngineError;
use crate::types::{EnhancementInput, EnhancementPatch, TaskEnhancement};

impl Database {
    /// Attach an enhancement to a task. Without an explicit sort order
    /// it lands after the task's existing enhancements.
    pub fn add_enhancement(&self, input: EnhancementInput) -> Result<TaskEnhancement> {
        if input.content.trim().is_empty() {
            return Err(EngineError::missing_field("content").into());
        }

        let ts = now();
        self.with_conn(|conn| {
            if !task_exists(conn, &input.task_id)? {
                return Err(EngineError::not_found("Task", input.task_id.clone()).into());
            }

            let sort_order = match input.sort_order {
                Some(explicit) => explicit,
                None => conn.query_row(
                    "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM task_enhancements WHERE task_id = ?1",
                    params![input.task_id],
                    |row| row.get(0),
                )?,
            };

            let enhancement = TaskEnhancement {
                id: input
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::now_v7().to_string()),
                task_id: input.task_id.clone(),
                kind: input.kind,
                content: input.content.clone(),
                sort_order,
                completed: input.completed.unwrap_or(false),
                created_at: ts.clone(),
                updated_at: ts.clone(),
            };

            conn.execute(
                "INSERT INTO task_enhancements (id, task_id, kind, content, sort_order,
                                                completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    enhancement.id,
                    enhancement.task_id,
                    enhancement.kind.as_str(),
                    enhancement.content,
                    enhancement.sort_order,
                    enhancement.completed,
                    enhancement.created_at,
                    enhancement.updated_at,
                ],
            )?;
            Ok(enhancement)
        })
    }

    /// Enhancements for a task in their sort order.
    pub fn enhancements(&self, task_id: &str) -> Result<Vec<TaskEnhancement>> {
        self.with_conn(|conn| {
            if !task_exists(conn, task_id)? {
                return Err(EngineError::not_found("Task", task_id).into());
            }
            let mut stmt = conn.prepare(
                "SELECT * FROM task_enhancements
                 WHERE task_id = ?1
                 ORDER BY sort_order, created_at",
            )?;
            let enhancements = stmt
                .query_map(params![task_id], parse_enhancement_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(enhancements)
        })
    }

    pub fn update_enhancement(
        &self,
        enhancement_id: &str,
        patch: &EnhancementPatch,
    ) -> Result<TaskEnhancement> {
        if let Some(content) = &patch.content {
            if content.trim().is_empty() {
                return Err(EngineError::missing_field("content").into());
            }
        }

        let ts = now();
        self.with_conn(|conn| {
            let enhancement = get_enhancement_internal(conn, enhancement_id)?
                .ok_or_else(|| EngineError::not_found("Enhancement", enhancement_id))?;

            let updated = TaskEnhancement {
                id: enhancement.id,
                task_id: enhancement.task_id,
                kind: enhancement.kind,
                content: patch.content.clone().unwrap_or(enhancement.content),
                sort_order: patch.sort_order.unwrap_or(enhancement.sort_order),
                completed: patch.completed.unwrap_or(enhancement.completed),
                created_at: enhancement.created_at,
                updated_at: ts.clone(),
            };

            conn.execute(
                "UPDATE task_enhancements
                 SET content = ?1, sort_order = ?2, completed = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    updated.content,
                    updated.sort_order,
                    updated.completed,
                    updated.updated_at,
                    enhancement_id,
                ],
            )?;
            Ok(updated)
        })
    }

    pub fn delete_enhancement(&self, enhancement_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM task_enhancements WHERE id = ?1",
                params![enhancement_id],
            )?;
            if deleted == 0 {
                return Err(EngineError::not_found("Enhancement", enhancement_id).into());
            }
            Ok(())
        })
    }
}

pub(crate) fn get_enhancement_internal(
    conn: &Connection,
    enhancement_id: &str,
) -> Result<Option<TaskEnhancement>> {
    match conn.query_row(
        "SELECT * FROM task_enhancements WHERE id = ?1",
        params![enhancement_id],
        parse_enhancement_row,
    ) {
        Ok(enhancement) => Ok(Some(enhancement)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
