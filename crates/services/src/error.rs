//! Shared error types for the services crate.

use thiserror::Error;

use finedu_core::model::GoalError;
use storage::StorageError;

/// Errors emitted by the goals domain services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalsError {
    /// The service has not been initialized for a namespace yet.
    #[error("goals service is not initialized")]
    NotInitialized,

    /// Invalid user input; no state was mutated.
    #[error(transparent)]
    Validation(#[from] GoalError),

    /// The persistence write failed; the mutation is not committed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
