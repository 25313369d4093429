//! Uniform operation facade over the database layer.
//!
//! Every operation returns an [`Envelope`]: success or failure, an
//! optional payload, an optional error string and, for mutations, the
//! number of records changed. Nothing here panics on bad input; typed
//! errors from the storage layer are folded into the envelope so a
//! caller can always pattern-match one shape.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::db::query::TaskFilter;
use crate::db::Database;
use crate::error::EngineError;
use crate::types::{
    EnhancementInput, EnhancementPatch, HealthReport, Integration, Label, LabelInput, LabelPatch,
    Project, ProjectInput, ProjectPatch, Statistics, Task, TaskEnhancement, TaskInput, TaskPatch,
    TimeEntry, TimeEntryInput,
};

/// Result shape shared by every operation.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<i64>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            changes: None,
        }
    }

    pub fn fail(err: EngineError) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(err.to_string()),
            changes: None,
        }
    }

    fn with_changes(mut self, changes: i64) -> Self {
        if self.success {
            self.changes = Some(changes);
        }
        self
    }
}

/// Per-item results of a bulk operation.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome<T> {
    pub items: Vec<T>,
    pub errors: Vec<String>,
}

/// The persistence engine. Cheap to clone; clones share one store.
#[derive(Clone)]
pub struct Engine {
    db: Database,
}

fn fetch<T>(result: anyhow::Result<T>) -> Envelope<T> {
    match result {
        Ok(value) => Envelope::ok(value),
        Err(e) => Envelope::fail(e.into()),
    }
}

fn mutate<T>(result: anyhow::Result<T>) -> Envelope<T> {
    fetch(result).with_changes(1)
}

fn done(result: anyhow::Result<()>, changes: i64) -> Envelope<()> {
    match result {
        Ok(()) => Envelope {
            success: true,
            data: None,
            error: None,
            changes: Some(changes),
        },
        Err(e) => Envelope::fail(e.into()),
    }
}

fn done_counted(result: anyhow::Result<usize>) -> Envelope<()> {
    match result {
        Ok(count) => Envelope {
            success: true,
            data: None,
            error: None,
            changes: Some(count as i64),
        },
        Err(e) => Envelope::fail(e.into()),
    }
}

impl Engine {
    /// Open the store at `path`, migrating it to the current schema.
    /// Fails instead of returning a handle when migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Engine {
            db: Database::open(path)?,
        })
    }

    /// An engine over an in-memory store (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Engine {
            db: Database::open_in_memory()?,
        })
    }

    // ----- tasks -----

    pub fn create_task(&self, input: TaskInput) -> Envelope<Task> {
        mutate(self.db.create_task(input))
    }

    pub fn get_task(&self, task_id: &str) -> Envelope<Task> {
        match self.db.get_task(task_id) {
            Ok(Some(task)) => Envelope::ok(task),
            Ok(None) => Envelope::fail(EngineError::not_found("Task", task_id)),
            Err(e) => Envelope::fail(e.into()),
        }
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Envelope<Vec<Task>> {
        fetch(self.db.list_tasks(filter))
    }

    /// Apply a partial update. An empty change-set is rejected before
    /// touching storage.
    pub fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Envelope<Task> {
        if patch.is_empty() {
            return Envelope::fail(EngineError::validation(
                "update requires at least one field",
            ));
        }
        mutate(self.db.update_task(task_id, patch))
    }

    pub fn delete_task(&self, task_id: &str) -> Envelope<()> {
        done(self.db.delete_task(task_id), 1)
    }

    /// Create several tasks, isolating failures per item.
    pub fn bulk_create_tasks(&self, inputs: Vec<TaskInput>) -> Envelope<BulkOutcome<Task>> {
        if inputs.is_empty() {
            return Envelope::fail(EngineError::validation(
                "bulk create requires at least one item",
            ));
        }
        let total = inputs.len();
        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (index, input) in inputs.into_iter().enumerate() {
            match self.db.create_task(input) {
                Ok(task) => items.push(task),
                Err(e) => {
                    let e = EngineError::from(e);
                    warn!(index, code = e.code(), "bulk create item failed: {e}");
                    errors.push(format!("item {index}: {e}"));
                }
            }
        }
        bulk_envelope(items, errors, total)
    }

    /// Update several tasks, isolating failures per item. One missing
    /// id fails that item alone, not the batch.
    pub fn bulk_update_tasks(
        &self,
        updates: Vec<(String, TaskPatch)>,
    ) -> Envelope<BulkOutcome<Task>> {
        if updates.is_empty() {
            return Envelope::fail(EngineError::validation(
                "bulk update requires at least one item",
            ));
        }
        let total = updates.len();
        let mut items = Vec::new();
        let mut errors = Vec::new();
        for (task_id, patch) in updates {
            if patch.is_empty() {
                errors.push(format!("{task_id}: update requires at least one field"));
                continue;
            }
            match self.db.update_task(&task_id, &patch) {
                Ok(task) => items.push(task),
                Err(e) => {
                    let e = EngineError::from(e);
                    warn!(task_id = %task_id, code = e.code(), "bulk update item failed: {e}");
                    errors.push(format!("{task_id}: {e}"));
                }
            }
        }
        bulk_envelope(items, errors, total)
    }

    /// Delete several tasks, isolating failures per item. Items carry
    /// the ids that were actually removed.
    pub fn bulk_delete_tasks(&self, ids: Vec<String>) -> Envelope<BulkOutcome<String>> {
        if ids.is_empty() {
            return Envelope::fail(EngineError::validation(
                "bulk delete requires at least one item",
            ));
        }
        let total = ids.len();
        let mut items = Vec::new();
        let mut errors = Vec::new();
        for task_id in ids {
            match self.db.delete_task(&task_id) {
                Ok(()) => items.push(task_id),
                Err(e) => {
                    let e = EngineError::from(e);
                    warn!(task_id = %task_id, code = e.code(), "bulk delete item failed: {e}");
                    errors.push(format!("{task_id}: {e}"));
                }
            }
        }
        bulk_envelope(items, errors, total)
    }

    pub fn search_tasks(&self, term: &str, limit: Option<i64>) -> Envelope<Vec<Task>> {
        fetch(self.db.search_tasks(term, limit))
    }

    pub fn tasks_due_today(&self) -> Envelope<Vec<Task>> {
        fetch(self.db.tasks_due_today())
    }

    pub fn tasks_overdue(&self) -> Envelope<Vec<Task>> {
        fetch(self.db.tasks_overdue())
    }

    pub fn tasks_upcoming(&self, days: i64) -> Envelope<Vec<Task>> {
        fetch(self.db.tasks_upcoming(days))
    }

    pub fn tasks_by_project(&self, project_id: &str) -> Envelope<Vec<Task>> {
        let filter = TaskFilter {
            project_id: Some(project_id.to_string()),
            ..Default::default()
        };
        fetch(self.db.list_tasks(&filter))
    }

    pub fn tasks_by_context(&self, context: &str) -> Envelope<Vec<Task>> {
        let filter = TaskFilter {
            context: Some(context.to_string()),
            ..Default::default()
        };
        fetch(self.db.list_tasks(&filter))
    }

    pub fn tasks_completed(&self, limit: Option<i64>) -> Envelope<Vec<Task>> {
        fetch(self.db.tasks_completed(limit))
    }

    pub fn merge_task_integration(
        &self,
        task_id: &str,
        provider: &str,
        payload: &Value,
    ) -> Envelope<Task> {
        mutate(self.db.merge_task_integration(task_id, provider, payload))
    }

    pub fn tasks_with_integration(&self, provider: &str) -> Envelope<Vec<Task>> {
        let filter = TaskFilter {
            has_integration: Some(provider.to_string()),
            ..Default::default()
        };
        fetch(self.db.list_tasks(&filter))
    }

    // ----- projects -----

    pub fn create_project(&self, input: ProjectInput) -> Envelope<Project> {
        mutate(self.db.create_project(input))
    }

    pub fn get_project(&self, project_id: &str) -> Envelope<Project> {
        match self.db.get_project(project_id) {
            Ok(Some(project)) => Envelope::ok(project),
            Ok(None) => Envelope::fail(EngineError::not_found("Project", project_id)),
            Err(e) => Envelope::fail(e.into()),
        }
    }

    pub fn list_projects(&self, include_archived: bool) -> Envelope<Vec<Project>> {
        fetch(self.db.list_projects(include_archived))
    }

    pub fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Envelope<Project> {
        if patch.is_empty() {
            return Envelope::fail(EngineError::validation(
                "update requires at least one field",
            ));
        }
        mutate(self.db.update_project(project_id, patch))
    }

    pub fn delete_project(&self, project_id: &str) -> Envelope<()> {
        done(self.db.delete_project(project_id), 1)
    }

    pub fn merge_project_integration(
        &self,
        project_id: &str,
        provider: &str,
        payload: &Value,
    ) -> Envelope<Project> {
        mutate(
            self.db
                .merge_project_integration(project_id, provider, payload),
        )
    }

    // ----- labels -----

    pub fn create_label(&self, input: LabelInput) -> Envelope<Label> {
        mutate(self.db.create_label(input))
    }

    pub fn list_labels(&self) -> Envelope<Vec<Label>> {
        fetch(self.db.list_labels())
    }

    pub fn update_label(&self, label_id: &str, patch: &LabelPatch) -> Envelope<Label> {
        if patch.is_empty() {
            return Envelope::fail(EngineError::validation(
                "update requires at least one field",
            ));
        }
        mutate(self.db.update_label(label_id, patch))
    }

    pub fn delete_label(&self, label_id: &str) -> Envelope<()> {
        done(self.db.delete_label(label_id), 1)
    }

    pub fn assign_label(&self, task_id: &str, label_id: &str) -> Envelope<()> {
        done_counted(self.db.assign_label(task_id, label_id))
    }

    pub fn remove_label(&self, task_id: &str, label_id: &str) -> Envelope<()> {
        done_counted(self.db.remove_label(task_id, label_id))
    }

    pub fn labels_for_task(&self, task_id: &str) -> Envelope<Vec<Label>> {
        fetch(self.db.labels_for_task(task_id))
    }

    // ----- time tracking -----

    pub fn log_time(&self, input: TimeEntryInput) -> Envelope<TimeEntry> {
        mutate(self.db.log_time(input))
    }

    pub fn time_entries(&self, task_id: &str) -> Envelope<Vec<TimeEntry>> {
        fetch(self.db.time_entries(task_id))
    }

    pub fn delete_time_entry(&self, entry_id: &str) -> Envelope<()> {
        done(self.db.delete_time_entry(entry_id), 1)
    }

    // ----- enhancements -----

    pub fn add_enhancement(&self, input: EnhancementInput) -> Envelope<TaskEnhancement> {
        mutate(self.db.add_enhancement(input))
    }

    pub fn enhancements(&self, task_id: &str) -> Envelope<Vec<TaskEnhancement>> {
        fetch(self.db.enhancements(task_id))
    }

    pub fn update_enhancement(
        &self,
        enhancement_id: &str,
        patch: &EnhancementPatch,
    ) -> Envelope<TaskEnhancement> {
        if patch.is_empty() {
            return Envelope::fail(EngineError::validation(
                "update requires at least one field",
            ));
        }
        mutate(self.db.update_enhancement(enhancement_id, patch))
    }

    pub fn delete_enhancement(&self, enhancement_id: &str) -> Envelope<()> {
        done(self.db.delete_enhancement(enhancement_id), 1)
    }

    // ----- integrations -----

    pub fn upsert_integration(
        &self,
        provider: &str,
        is_active: bool,
        config: Option<&Value>,
    ) -> Envelope<Integration> {
        mutate(self.db.upsert_integration(provider, is_active, config))
    }

    pub fn get_integration(&self, provider: &str) -> Envelope<Integration> {
        match self.db.get_integration(provider) {
            Ok(Some(integration)) => Envelope::ok(integration),
            Ok(None) => Envelope::fail(EngineError::not_found("Integration", provider)),
            Err(e) => Envelope::fail(e.into()),
        }
    }

    pub fn list_integrations(&self) -> Envelope<Vec<Integration>> {
        fetch(self.db.list_integrations())
    }

    pub fn record_sync(&self, provider: &str, sync_token: Option<&str>) -> Envelope<Integration> {
        mutate(self.db.record_sync(provider, sync_token))
    }

    // ----- statistics and maintenance -----

    pub fn statistics(&self) -> Envelope<Statistics> {
        fetch(self.db.statistics())
    }

    pub fn health_check(&self) -> Envelope<HealthReport> {
        fetch(self.db.health_check())
    }

    pub fn vacuum(&self) -> Envelope<()> {
        match self.db.vacuum() {
            Ok(()) => Envelope {
                success: true,
                data: None,
                error: None,
                changes: None,
            },
            Err(e) => Envelope::fail(e.into()),
        }
    }

    pub fn analyze(&self) -> Envelope<()> {
        match self.db.analyze() {
            Ok(()) => Envelope {
                success: true,
                data: None,
                error: None,
                changes: None,
            },
            Err(e) => Envelope::fail(e.into()),
        }
    }

    pub fn schema_version(&self) -> Envelope<i32> {
        fetch(self.db.schema_version())
    }
}

fn bulk_envelope<T>(items: Vec<T>, errors: Vec<String>, total: usize) -> Envelope<BulkOutcome<T>> {
    let changes = items.len() as i64;
    if errors.is_empty() {
        Envelope::ok(BulkOutcome { items, errors }).with_changes(changes)
    } else {
        Envelope {
            success: false,
            error: Some(format!("{} of {} items failed", errors.len(), total)),
            data: Some(BulkOutcome { items, errors }),
            changes: Some(changes),
        }
    }
}
