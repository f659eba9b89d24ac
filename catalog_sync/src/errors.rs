//! Error types shared by the repositories and the orchestrator.

use crate::models::sync_run::SyncStatus;

/// Result type used by the repositories. Diesel errors travel as
/// `anyhow::Error`; [`RepoError`] values can be recovered with `downcast_ref`.
pub type RepoResult<T> = anyhow::Result<T>;

/// Domain errors raised by the repositories.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RepoError {
    /// No sync run with this id exists.
    #[error("sync run {0} not found")]
    RunNotFound(i32),

    /// The run exists but cannot be executed from its current state.
    #[error("sync run {id} is {status} and cannot be executed")]
    RunNotExecutable {
        /// Run id.
        id: i32,
        /// Persisted status at the time of the call.
        status: SyncStatus,
    },
}

/// Whether `err` is (or wraps) a UNIQUE constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    use diesel::result::{DatabaseErrorKind, Error};
    matches!(
        err.downcast_ref::<Error>(),
        Some(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    )
}
