//! # Error Types
//!
//! Domain-specific error types for toolrent-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  toolrent-core errors (this file)                                      │
//! │  ├── CoreError        - Rental/stock rule violations                   │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - What the caller is told (4 kinds + storage)    │
//! │                                                                         │
//! │  toolrent-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller (ErrorKind)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure listed here is reported before any mutation is committed.
//! Nothing is retried automatically; the caller decides.

use serde::Serialize;
use thiserror::Error;

use crate::types::RentalStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing classification of a failure.
///
/// The UI layer maps these to responses (400 / 404 / 409 / 422 / 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Bad input: non-positive quantity, future start date, not enough stock.
    Validation,
    /// A referenced rental, tool, customer, category or line item is missing.
    NotFound,
    /// A delete is blocked by an active rental.
    Conflict,
    /// The rental's status does not allow the operation.
    InvalidState,
    /// The storage layer failed (connection, lock timeout, constraint).
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by ledger and catalog operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Requested more units than the tool has available.
    ///
    /// ## User Workflow
    /// ```text
    /// Add item (qty: 3)
    ///      │
    ///      ▼
    /// Tool "Drill": available=2
    ///      │
    ///      ▼
    /// InsufficientStock { tool: "Drill", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 Drill available"
    /// ```
    #[error("Insufficient stock for {tool}: available {available}, requested {requested}")]
    InsufficientStock {
        tool: String,
        available: i64,
        requested: i64,
    },

    /// The tool was switched off in the catalog and cannot be rented.
    #[error("Tool {tool} is not active")]
    ToolInactive { tool: String },

    /// The rental is not in a status that allows the operation.
    #[error("Rental {rental_id} is {status}, cannot {operation}")]
    InvalidRentalStatus {
        rental_id: String,
        status: RentalStatus,
        operation: &'static str,
    },

    /// A delete was refused because active rentals still depend on the record.
    #[error("{entity} {id} cannot be deleted: {reason}")]
    DeleteBlocked {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classifies the error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::ToolInactive { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::InvalidRentalStatus { .. } => ErrorKind::InvalidState,
            CoreError::DeleteBlocked { .. } => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (phone number, amount, status name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date lies after today.
    #[error("{field} {date} cannot be in the future (today is {today})")]
    FutureDate {
        field: String,
        date: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
