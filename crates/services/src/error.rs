//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use studypath_core::model::{ReviewError, RoadmapError};

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `RoadmapService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RoadmapServiceError {
    #[error(transparent)]
    Roadmap(#[from] RoadmapError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] storage::sqlite::SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
