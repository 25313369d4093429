//! Structured error types for engine operations.

use thiserror::Error;

/// Typed error raised by storage and engine operations.
///
/// Every failure surfaced through the public API is one of these
/// variants; the engine facade converts them into the response
/// envelope's error string.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced record does not exist.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// The input failed validation before touching storage.
    #[error("{0}")]
    Validation(String),

    /// SQLite rejected the statement with a constraint failure.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Any other storage or serialization failure.
    #[error("{0}")]
    Execution(String),
}

impl EngineError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn missing_field(field: &str) -> Self {
        EngineError::Validation(format!("{} is required", field))
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        EngineError::Validation(format!("{}: {}", field, reason))
    }

    pub fn execution(err: impl std::fmt::Display) -> Self {
        EngineError::Execution(err.to_string())
    }

    /// Stable machine-readable code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::Constraint(_) => "CONSTRAINT_VIOLATION",
            EngineError::Execution(_) => "EXECUTION_ERROR",
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                EngineError::Constraint(err.to_string())
            }
            _ => EngineError::Execution(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Execution(err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to EngineError first
        let err = match err.downcast::<EngineError>() {
            Ok(engine_err) => return engine_err,
            Err(err) => err,
        };
        // Then look for a raw SQLite failure so constraint errors keep their code
        match err.downcast::<rusqlite::Error>() {
            Ok(sql_err) => sql_err.into(),
            Err(err) => EngineError::Execution(err.to_string()),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_record() {
        let err = EngineError::not_found("Task", "abc-123");
        assert_eq!(err.to_string(), "Task not found: abc-123");
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn anyhow_downcast_preserves_variant() {
        let inner = EngineError::missing_field("title");
        let wrapped: anyhow::Error = inner.into();
        let back = EngineError::from(wrapped);
        assert_eq!(back.code(), "VALIDATION_ERROR");
        assert_eq!(back.to_string(), "title is required");
    }

    #[test]
    fn plain_anyhow_becomes_execution_error() {
        let err = EngineError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.code(), "EXECUTION_ERROR");
    }
}
