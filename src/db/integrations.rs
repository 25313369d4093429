//! Per-provider sync payloads and provider sync state.
//!
//! Record-level payloads live in the `integrations` JSON column of
//! tasks and projects; a merge replaces one provider's key in place
//! with a single UPDATE so concurrent merges for different providers
//! cannot clobber each other. Provider-level state (tokens, last sync)
//! lives in the `integrations` table.

use anyhow::Result;
use rusqlite::params;
use serde_json::Value;

use super::mapper::{parse_integration_row, parse_project_row, parse_task_row};
use super::{now, Database};
use crate::error::EngineError;
use crate::types::{Integration, Project, Task};

/// Providers the store knows how to sync with.
pub const KNOWN_PROVIDERS: &[&str] = &["todoist", "msToDo", "googleTasks", "appleReminders"];

/// Reject provider names that are unknown or unsafe to place in a JSON path.
pub fn validate_provider(provider: &str) -> Result<(), EngineError> {
    if provider.is_empty() || !provider.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::invalid_value(
            "provider",
            "provider names must be alphanumeric",
        ));
    }
    if !KNOWN_PROVIDERS.contains(&provider) {
        return Err(EngineError::invalid_value(
            "provider",
            &format!("unknown provider '{provider}'"),
        ));
    }
    Ok(())
}

impl Database {
    /// Replace one provider's payload on a task, leaving other providers untouched.
    pub fn merge_task_integration(
        &self,
        task_id: &str,
        provider: &str,
        payload: &Value,
    ) -> Result<Task> {
        validate_provider(provider)?;
        let path = format!("$.{provider}");
        let payload_json = serde_json::to_string(payload)?;
        let ts = now();

        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks
                 SET integrations = json_set(COALESCE(integrations, '{}'), ?1, json(?2)),
                     updated_at = ?3
                 WHERE id = ?4",
                params![path, payload_json, ts, task_id],
            )?;
            if updated == 0 {
                return Err(EngineError::not_found("Task", task_id).into());
            }
            let task = conn.query_row(
                "SELECT t.* FROM tasks t WHERE t.id = ?1",
                params![task_id],
                parse_task_row,
            )?;
            Ok(task)
        })
    }

    /// Replace one provider's payload on a project.
    pub fn merge_project_integration(
        &self,
        project_id: &str,
        provider: &str,
        payload: &Value,
    ) -> Result<Project> {
        validate_provider(provider)?;
        let path = format!("$.{provider}");
        let payload_json = serde_json::to_string(payload)?;
        let ts = now();

        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE projects
                 SET integrations = json_set(COALESCE(integrations, '{}'), ?1, json(?2)),
                     updated_at = ?3
                 WHERE id = ?4",
                params![path, payload_json, ts, project_id],
            )?;
            if updated == 0 {
                return Err(EngineError::not_found("Project", project_id).into());
            }
            let project = conn.query_row(
                "SELECT p.* FROM projects p WHERE p.id = ?1",
                params![project_id],
                parse_project_row,
            )?;
            Ok(project)
        })
    }

    /// Create or update a provider's sync configuration.
    pub fn upsert_integration(
        &self,
        provider: &str,
        is_active: bool,
        config: Option<&Value>,
    ) -> Result<Integration> {
        validate_provider(provider)?;
        let config_json = config.map(serde_json::to_string).transpose()?;
        let ts = now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO integrations (provider, is_active, config, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(provider) DO UPDATE SET
                     is_active = excluded.is_active,
                     config = excluded.config,
                     updated_at = excluded.updated_at",
                params![provider, is_active, config_json, ts],
            )?;
            let integration = conn.query_row(
                "SELECT * FROM integrations WHERE provider = ?1",
                params![provider],
                parse_integration_row,
            )?;
            Ok(integration)
        })
    }

    pub fn get_integration(&self, provider: &str) -> Result<Option<Integration>> {
        self.with_conn(|conn| {
            match conn.query_row(
                "SELECT * FROM integrations WHERE provider = ?1",
                params![provider],
                parse_integration_row,
            ) {
                Ok(integration) => Ok(Some(integration)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn list_integrations(&self) -> Result<Vec<Integration>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM integrations ORDER BY provider")?;
            let integrations = stmt
                .query_map([], parse_integration_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(integrations)
        })
    }

    /// Stamp a completed sync, keeping the previous token when none is given.
    pub fn record_sync(&self, provider: &str, sync_token: Option<&str>) -> Result<Integration> {
        validate_provider(provider)?;
        let ts = now();

        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE integrations
                 SET last_sync_at = ?1,
                     sync_token = COALESCE(?2, sync_token),
                     updated_at = ?1
                 WHERE provider = ?3",
                params![ts, sync_token, provider],
            )?;
            if updated == 0 {
                return Err(EngineError::not_found("Integration", provider).into());
            }
            let integration = conn.query_row(
                "SELECT * FROM integrations WHERE provider = ?1",
                params![provider],
                parse_integration_row,
            )?;
            Ok(integration)
        })
    }
}
