//! Compiles a [`TaskFilter`] into one parameterized SELECT.
//!
//! Every filter key binds its value as a placeholder; the only text
//! spliced into the statement is a provider name that has already
//! passed the allow-list in [`super::integrations`]. When a search term
//! is present the statement reads from the FTS index and orders by
//! relevance, otherwise it reads the task table directly with the
//! default ordering.

use rusqlite::types::ToSql;

use super::integrations::validate_provider;
use crate::error::EngineError;
use crate::types::TaskStatus;

/// Default ordering for task listings: most urgent first, tasks
/// without a due date after dated ones, newest tie-breaker.
pub(crate) const DEFAULT_ORDER: &str =
    "t.priority ASC, t.due_date IS NULL, date(t.due_date) ASC, t.created_at DESC";

/// Declarative filter over tasks. All keys combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Match any of these statuses.
    pub status: Option<Vec<TaskStatus>>,
    pub project_id: Option<String>,
    /// `Some(None)` selects top-level tasks, `Some(Some(id))` subtasks of one parent.
    pub parent_id: Option<Option<String>>,
    /// Inclusive day bounds compared on the date part only.
    pub due_date_from: Option<String>,
    pub due_date_to: Option<String>,
    pub energy_level: Option<i32>,
    pub context: Option<String>,
    pub focus_time: Option<bool>,
    /// Only tasks carrying a payload for this provider.
    pub has_integration: Option<String>,
    /// Full-text search term; switches the query to the FTS index.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A ready-to-run statement with its bound parameters.
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
}

/// Build the SELECT for a filter.
pub fn build_task_query(filter: &TaskFilter) -> Result<CompiledQuery, EngineError> {
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    let mut sql = if let Some(term) = &filter.search {
        params.push(Box::new(term.clone()));
        String::from(
            "SELECT t.* FROM tasks_fts fts \
             INNER JOIN tasks t ON fts.task_id = t.id \
             WHERE tasks_fts MATCH ?",
        )
    } else {
        String::from("SELECT t.* FROM tasks t WHERE 1=1")
    };

    if let Some(statuses) = &filter.status {
        if statuses.is_empty() {
            return Err(EngineError::invalid_value(
                "status",
                "filter requires at least one status",
            ));
        }
        if statuses.len() == 1 {
            sql.push_str(" AND t.status = ?");
        } else {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            sql.push_str(&format!(" AND t.status IN ({placeholders})"));
        }
        for status in statuses {
            params.push(Box::new(status.as_str().to_string()));
        }
    }

    if let Some(project_id) = &filter.project_id {
        sql.push_str(" AND t.project_id = ?");
        params.push(Box::new(project_id.clone()));
    }

    match &filter.parent_id {
        Some(None) => sql.push_str(" AND t.parent_id IS NULL"),
        Some(Some(parent_id)) => {
            sql.push_str(" AND t.parent_id = ?");
            params.push(Box::new(parent_id.clone()));
        }
        None => {}
    }

    if let Some(from) = &filter.due_date_from {
        sql.push_str(" AND date(t.due_date) >= date(?)");
        params.push(Box::new(from.clone()));
    }

    if let Some(to) = &filter.due_date_to {
        sql.push_str(" AND date(t.due_date) <= date(?)");
        params.push(Box::new(to.clone()));
    }

    if let Some(energy_level) = filter.energy_level {
        sql.push_str(" AND t.energy_level = ?");
        params.push(Box::new(energy_level));
    }

    if let Some(context) = &filter.context {
        sql.push_str(" AND t.context = ?");
        params.push(Box::new(context.clone()));
    }

    if let Some(focus_time) = filter.focus_time {
        sql.push_str(" AND t.focus_time = ?");
        params.push(Box::new(focus_time));
    }

    if let Some(provider) = &filter.has_integration {
        validate_provider(provider)?;
        sql.push_str(&format!(
            " AND json_extract(t.integrations, '$.{provider}') IS NOT NULL"
        ));
    }

    if filter.search.is_some() {
        sql.push_str(" ORDER BY bm25(tasks_fts)");
    } else {
        sql.push_str(&format!(" ORDER BY {DEFAULT_ORDER}"));
    }

    match (filter.limit, filter.offset) {
        (Some(limit), Some(offset)) => {
            check_non_negative("limit", limit)?;
            check_non_negative("offset", offset)?;
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Box::new(limit));
            params.push(Box::new(offset));
        }
        (Some(limit), None) => {
            check_non_negative("limit", limit)?;
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit));
        }
        (None, Some(offset)) => {
            check_non_negative("offset", offset)?;
            sql.push_str(" LIMIT -1 OFFSET ?");
            params.push(Box::new(offset));
        }
        (None, None) => {}
    }

    Ok(CompiledQuery { sql, params })
}

fn check_non_negative(field: &str, value: i64) -> Result<(), EngineError> {
    if value < 0 {
        return Err(EngineError::invalid_value(field, "must not be negative"));
    }
    Ok(())
}
