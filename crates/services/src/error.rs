//! Shared error types for the services crate.

use thiserror::Error;

use sheet_core::model::{AttemptError, ChallengeError, GoalError, NotebookError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `NotebookService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotebookServiceError {
    #[error(transparent)]
    Notebook(#[from] NotebookError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AttemptService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptServiceError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `GoalService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalServiceError {
    #[error("goal update has no changes")]
    EmptyPatch,
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ChallengeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChallengeServiceError {
    #[error("challenge update has no changes")]
    EmptyPatch,
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressTracker`. Local state is unchanged whenever one
/// of these is returned from a mutation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error(transparent)]
    Notebook(#[from] NotebookServiceError),
    #[error(transparent)]
    Attempt(#[from] AttemptServiceError),
    #[error(transparent)]
    Goal(#[from] GoalServiceError),
    #[error(transparent)]
    Challenge(#[from] ChallengeServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
