//! Aggregation queries for statistics.

use anyhow::Result;
use rusqlite::TransactionBehavior;
use std::collections::HashMap;

use super::Database;
use crate::types::{Statistics, TaskStatus};

impl Database {
    /// Aggregate counts over one snapshot of the store.
    ///
    /// All counts come from a single read transaction, so they are
    /// mutually consistent even while writers are active. Status counts
    /// are seeded with zero for every status so absent groups still
    /// appear in the result.
    pub fn statistics(&self) -> Result<Statistics> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

            let total_tasks: i64 =
                tx.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;

            let mut by_status: HashMap<String, i64> = HashMap::new();
            for status in TaskStatus::ALL {
                by_status.insert(status.as_str().to_string(), 0);
            }
            {
                let mut stmt =
                    tx.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let status: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    by_status.insert(status, count);
                }
            }

            let overdue: i64 = tx.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE due_date IS NOT NULL
                   AND date(due_date) < date('now')
                   AND status != 'completed'",
                [],
                |row| row.get(0),
            )?;

            let mut by_project: HashMap<String, i64> = HashMap::new();
            {
                let mut stmt = tx.prepare(
                    "SELECT p.name, COUNT(*) FROM tasks t
                     INNER JOIN projects p ON t.project_id = p.id
                     GROUP BY p.name",
                )?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    by_project.insert(row.get(0)?, row.get(1)?);
                }
            }

            let mut by_context: HashMap<String, i64> = HashMap::new();
            {
                let mut stmt =
                    tx.prepare("SELECT context, COUNT(*) FROM tasks GROUP BY context")?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    by_context.insert(row.get(0)?, row.get(1)?);
                }
            }

            let mut by_energy_level: HashMap<i64, i64> = HashMap::new();
            {
                let mut stmt = tx.prepare(
                    "SELECT energy_level, COUNT(*) FROM tasks
                     WHERE energy_level IS NOT NULL
                     GROUP BY energy_level",
                )?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    by_energy_level.insert(row.get(0)?, row.get(1)?);
                }
            }

            tx.commit()?;

            Ok(Statistics {
                total_tasks,
                by_status,
                overdue,
                by_project,
                by_context,
                by_energy_level,
            })
        })
    }
}
