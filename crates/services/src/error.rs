//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::QuestionError;
use storage::repository::StorageError;

/// Errors emitted while assembling a question set.
///
/// Any fetch or data failure is fatal to the whole assembly; a session is
/// never populated from partial results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SamplerError {
    #[error("per-category sample size must be positive")]
    ZeroSampleSize,

    #[error("no categories requested")]
    NoCategories,

    #[error("duplicate question id in assembled set: {0}")]
    DuplicateId(String),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the exam workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("assembled question set is empty")]
    Empty,

    #[error("exam engine lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
