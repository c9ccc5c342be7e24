use thiserror::Error;

use crate::domain::errors::DomainError;

/// Failures raised by store implementations
///
/// `NotFound` and `Conflict` are recoverable and map to client responses.
/// Every other variant is an infrastructure fault that aborts the
/// surrounding transaction.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLx database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique key already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write would break a relation invariant; indicates a defect
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Stored data failed domain validation
    #[error("Invalid stored data: {0}")]
    Corrupt(#[from] DomainError),

    /// Transaction handle used after commit
    #[error("Transaction already finished")]
    TransactionFinished,
}

impl StoreError {
    /// Whether the error is a client-side outcome rather than a fault
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Conflict(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_conflict_are_recoverable() {
        assert!(StoreError::NotFound("pr-1".into()).is_recoverable());
        assert!(StoreError::Conflict("pr-1".into()).is_recoverable());
    }

    #[test]
    fn faults_are_not_recoverable() {
        assert!(!StoreError::InvariantViolation("dup".into()).is_recoverable());
        assert!(!StoreError::Database(sqlx::Error::PoolTimedOut).is_recoverable());
        assert!(!StoreError::TransactionFinished.is_recoverable());
    }

    #[test]
    fn migration_failure_is_a_fault() {
        let err: StoreError = sqlx::migrate::MigrateError::VersionMissing(20240101000000).into();
        assert!(matches!(err, StoreError::Migration(_)));
        assert!(!err.is_recoverable());
        assert!(err.to_string().starts_with("Migration error:"));
    }

    #[test]
    fn corrupt_wraps_domain_error() {
        let err: StoreError = DomainError::UnknownStatus("DRAFT".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid stored data: Unknown pull request status: DRAFT"
        );
    }
}
