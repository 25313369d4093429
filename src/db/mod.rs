//! Database layer for the task store.

pub mod enhancements;
pub mod integrations;
pub mod labels;
pub mod maintenance;
pub mod mapper;
pub mod migrations;
pub mod projects;
pub mod query;
pub mod schema;
pub mod stats;
pub mod tasks;
pub mod time_entries;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::EngineError;

/// Page cache size in KiB (negative value per SQLite convention).
const CACHE_SIZE_KIB: i64 = -8192;

/// Memory-map limit in bytes.
const MMAP_SIZE_BYTES: i64 = 134_217_728;

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    ///
    /// Applies the store pragmas, runs any pending schema migrations and
    /// seeds default rows when the file is newly created. A migration
    /// failure here is fatal; no handle is returned.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path)?;

        // WAL for concurrent readers, NORMAL sync is durable enough under WAL
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA cache_size={CACHE_SIZE_KIB};
             PRAGMA mmap_size={MMAP_SIZE_BYTES};"
        ))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize()?;
        info!(path = %path.as_ref().display(), "opened task store");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize()?;

        Ok(db)
    }

    /// Bring the schema up to date and seed a fresh store.
    fn initialize(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let fresh = !table_exists(&conn, "tasks")?;
        migrations::run(&mut conn)?;
        schema::ensure(&conn)?;
        if fresh {
            schema::seed_defaults(&conn)?;
            info!("seeded default projects and labels");
        }
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        f(&mut conn)
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        rusqlite::params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Get the current UTC timestamp as an RFC 3339 string.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Check that a value is an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub(crate) fn validate_datetime(field: &str, value: &str) -> Result<(), EngineError> {
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return Ok(());
    }
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Ok(());
    }
    Err(EngineError::invalid_value(
        field,
        &format!("'{value}' is not an RFC 3339 timestamp or YYYY-MM-DD date"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_rfc3339() {
        let ts = now();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok(), "bad timestamp: {ts}");
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn test_validate_datetime_accepts_both_forms() {
        assert!(validate_datetime("due_date", "2026-03-14").is_ok());
        assert!(validate_datetime("due_date", "2026-03-14T09:30:00Z").is_ok());
        assert!(validate_datetime("due_date", "next tuesday").is_err());
    }
}
