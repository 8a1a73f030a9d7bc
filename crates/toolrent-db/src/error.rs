//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Rule violation (CoreError)          │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       │   transaction dropped → ROLLBACK, nothing half-applied         │
//! │       ▼                                                                 │
//! │  Caller reads err.kind() → Validation / NotFound / Conflict /          │
//! │                            InvalidState / Storage                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use toolrent_core::{CoreError, ErrorKind};

/// Database operation errors.
///
/// These errors wrap sqlx errors and domain rule violations so callers
/// handle a single error type per operation.
#[derive(Debug, Error)]
pub enum DbError {
    /// A ledger or catalog rule refused the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a category, customer or tool that was removed concurrently
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another writer held the database lock past the busy timeout.
    ///
    /// ## When This Occurs
    /// - Two counters adding items to the same tool at the same moment
    /// - A long-running write on another connection
    ///
    /// Nothing was changed; the caller may retry.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Classifies the error for the caller.
    ///
    /// ```text
    /// Domain(e)                 → e.kind()
    /// NotFound                  → NotFound
    /// ForeignKeyViolation       → NotFound (a referenced row is gone)
    /// UniqueViolation           → Conflict
    /// everything else           → Storage
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Domain(e) => e.kind(),
            DbError::NotFound { .. } | DbError::ForeignKeyViolation { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Storage,
        }
    }

    /// Whether the operation lost a lock race and may be retried as-is.
    pub fn is_busy(&self) -> bool {
        matches!(self, DbError::Busy(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message/code for constraint or lock
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes
                let primary_code = db_err
                    .code()
                    .and_then(|c| c.parse::<i64>().ok())
                    .map(|c| c & 0xff);

                if matches!(primary_code, Some(5) | Some(6))
                    || msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::Busy(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<toolrent_core::ValidationError> for DbError {
    fn from(err: toolrent_core::ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use toolrent_core::{RentalStatus, ValidationError};

    #[test]
    fn test_kinds() {
        assert_eq!(DbError::not_found("Rental", "r-1").kind(), ErrorKind::NotFound);
        assert_eq!(DbError::duplicate("name", "x").kind(), ErrorKind::Conflict);
        assert_eq!(DbError::Busy("locked".into()).kind(), ErrorKind::Storage);
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::Storage);

        let err: DbError = CoreError::InvalidRentalStatus {
            rental_id: "r-1".into(),
            status: RentalStatus::Completed,
            operation: "complete",
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "Rental r-1 is completed, cannot complete");
    }

    #[test]
    fn test_validation_error_converts() {
        let err: DbError = ValidationError::MustBePositive {
            field: "quantity".into(),
        }
        .into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_pool_errors_map() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
        assert!(DbError::Busy("x".into()).is_busy());
    }
}
