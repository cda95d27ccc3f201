use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    ArticleId, AuthenticatedUser, CompletionId, CompletionStatus, ProgressEntry, ProgressEvent,
    Quiz, QuizCompletion, QuizDraft, QuizDraftError, QuizId, Score, UserId,
};
use thiserror::Error;

use crate::auth_store::AuthSessionStore;
use crate::http::{ApiConfig, HttpBackend};
use crate::memory::InMemoryBackend;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not found")]
    NotFound,

    #[error("no authenticated user")]
    Unauthenticated,

    #[error("backend returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidDraft(#[from] QuizDraftError),
}

impl BackendError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound)
    }
}

/// Body of a completion-record creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCompletionRecord {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub article_id: ArticleId,
    pub score: Score,
}

/// Read/write access to quiz definitions.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` if the catalog cannot be read.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if missing, or other backend errors.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, BackendError>;

    /// Quiz attached to an article; `Ok(None)` when the article has none.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport or decoding failures.
    async fn quiz_for_article(&self, article_id: ArticleId) -> Result<Option<Quiz>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` for transport or decoding failures.
    async fn quiz_exists_for_article(&self, article_id: ArticleId) -> Result<bool, BackendError> {
        Ok(self.quiz_for_article(article_id).await?.is_some())
    }

    /// # Errors
    ///
    /// Returns `BackendError::InvalidDraft` if the draft breaks authoring rules.
    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::InvalidDraft` or `BackendError::NotFound`.
    async fn update_quiz(&self, id: QuizId, draft: &QuizDraft) -> Result<Quiz, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if missing, or other backend errors.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), BackendError>;
}

/// Persisted quiz completion records.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` if the record cannot be created.
    async fn record_completion(
        &self,
        record: &NewCompletionRecord,
    ) -> Result<QuizCompletion, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` for transport or decoding failures.
    async fn check_completion(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<CompletionStatus, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` for transport or decoding failures.
    async fn user_completions(&self, user_id: UserId) -> Result<Vec<QuizCompletion>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the record does not exist.
    async fn delete_completion(&self, id: CompletionId) -> Result<(), BackendError>;
}

/// Points ledger behind the progress screen.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` if the event is not accepted.
    async fn record_progress(&self, event: &ProgressEvent) -> Result<ProgressEntry, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` for transport or decoding failures.
    async fn progress_entries(&self, user_id: UserId) -> Result<Vec<ProgressEntry>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` if the entries cannot be deleted.
    async fn delete_progress(&self, user_id: UserId) -> Result<(), BackendError>;
}

/// Login/refresh/logout against the auth endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError::Unauthenticated` for bad credentials.
    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, BackendError>;

    /// Exchange the refresh credential for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthenticated` when the refresh credential is gone.
    async fn refresh(&self) -> Result<String, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError` if the backend rejects the logout.
    async fn logout(&self, user_id: UserId) -> Result<(), BackendError>;
}

/// Aggregates the backend collaborators behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Backend {
    pub quizzes: Arc<dyn QuizCatalog>,
    pub completions: Arc<dyn CompletionStore>,
    pub progress: Arc<dyn ProgressTracker>,
    pub auth: Arc<dyn AuthGateway>,
    pub session: AuthSessionStore,
}

impl Backend {
    /// REST backend sharing one HTTP client and one auth session store.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn http(config: &ApiConfig) -> Result<Self, BackendError> {
        let session = AuthSessionStore::new();
        let client = Arc::new(HttpBackend::new(config, session.clone())?);
        Ok(Self {
            quizzes: client.clone(),
            completions: client.clone(),
            progress: client.clone(),
            auth: client,
            session,
        })
    }

    #[must_use]
    pub fn in_memory(repo: &InMemoryBackend) -> Self {
        Self {
            quizzes: Arc::new(repo.clone()),
            completions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            auth: Arc::new(repo.clone()),
            session: AuthSessionStore::new(),
        }
    }
}
