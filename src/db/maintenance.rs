//! Store maintenance: compaction, planner statistics and health probes.

use anyhow::Result;
use tracing::info;

use super::{migrations, Database};
use crate::types::HealthReport;

impl Database {
    /// Rebuild the database file, reclaiming free pages.
    pub fn vacuum(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch("VACUUM;")?;
            info!("vacuumed task store");
            Ok(())
        })
    }

    /// Refresh the query planner's statistics.
    pub fn analyze(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch("ANALYZE; PRAGMA optimize;")?;
            Ok(())
        })
    }

    /// Probe the store: structural integrity, schema version, row count.
    pub fn health_check(&self) -> Result<HealthReport> {
        self.with_conn(|conn| {
            let integrity: String =
                conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
            let schema_version = migrations::user_version(conn)?;
            let task_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(HealthReport {
                healthy: integrity == "ok",
                schema_version,
                task_count,
            })
        })
    }

    /// The stored schema version.
    pub fn schema_version(&self) -> Result<i32> {
        self.with_conn(|conn| migrations::user_version(conn))
    }
}
