//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;
use quiz_core::OptimisticError;
use quiz_core::model::ArticleId;
use quiz_core::session::QuizSessionError;

/// Errors emitted by query-style services (history, progress summary).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("no user is logged in")]
    NotLoggedIn,
    #[error("email and password are required")]
    MissingCredentials,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted by `QuizController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("no quiz found for article {0}")]
    QuizNotFound(ArticleId),
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error("quiz already completed; retake it to answer again")]
    AlreadyCompleted,
    #[error("no answer is waiting to be settled")]
    NothingPending,
    #[error("there is no previous completion to retake")]
    NoPriorCompletion,
    #[error("could not remove the previous completion; retake aborted")]
    RetakeFailed,
    #[error("a retake is already in progress")]
    RetakePending(#[from] OptimisticError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
