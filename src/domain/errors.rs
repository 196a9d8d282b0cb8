//! Domain errors for the scan session store.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::ScanStatus;

/// Domain-level errors surfaced to callers of the store.
///
/// Storage failures never appear here. Reads degrade to an empty collection
/// and writes are dropped, so callers only see validation and lifecycle
/// violations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: ScanStatus, to: ScanStatus },

    #[error("Progress cannot move backwards: {current} -> {requested}")]
    ProgressRegression { current: u8, requested: u8 },

    #[error("Progress out of range: {0} (must be 0-100)")]
    ProgressOutOfRange(u8),

    #[error("Scan session {id} is {status} and its results are immutable")]
    TerminalSession { id: String, status: ScanStatus },

    #[error("Concurrency conflict: scan session {id} was modified at {found} (expected {expected})")]
    ConcurrencyConflict {
        id: String,
        expected: DateTime<Utc>,
        found: DateTime<Utc>,
    },

    #[error("Scan session not found: {0}")]
    SessionNotFound(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
