use std::sync::Arc;

use backend::{ApiConfig, Backend, BackendError, InMemoryBackend, QuizCatalog};
use quiz_core::model::ArticleId;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::completion_service::CompletionService;
use crate::error::ControllerError;
use crate::progress_service::ProgressService;
use crate::quiz::{QuizController, QuizServices, QuizTiming};

/// Assembles app-facing services over one backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<dyn QuizCatalog>,
    auth: AuthService,
    completions: CompletionService,
    progress: ProgressService,
    timing: QuizTiming,
}

impl AppServices {
    #[must_use]
    pub fn new(backend: Backend, clock: Clock) -> Self {
        Self {
            auth: AuthService::new(Arc::clone(&backend.auth), backend.session.clone()),
            completions: CompletionService::new(Arc::clone(&backend.completions)),
            progress: ProgressService::new(clock, Arc::clone(&backend.progress)),
            catalog: backend.quizzes,
            timing: QuizTiming::default(),
        }
    }

    /// Build services talking to the REST backend.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the HTTP client cannot be built.
    pub fn http(config: &ApiConfig, clock: Clock) -> Result<Self, BackendError> {
        Ok(Self::new(Backend::http(config)?, clock))
    }

    #[must_use]
    pub fn in_memory(backend: &InMemoryBackend, clock: Clock) -> Self {
        Self::new(Backend::in_memory(backend), clock)
    }

    #[must_use]
    pub fn with_timing(mut self, timing: QuizTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn QuizCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[must_use]
    pub fn completions(&self) -> &CompletionService {
        &self.completions
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn quiz_services(&self) -> QuizServices {
        QuizServices {
            catalog: Arc::clone(&self.catalog),
            completions: self.completions.clone(),
            progress: self.progress.clone(),
        }
    }

    /// Open the quiz of `article_id` for the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Auth` without a session, or any error from
    /// `QuizController::open`.
    pub async fn open_quiz(&self, article_id: ArticleId) -> Result<QuizController, ControllerError> {
        let user = self.auth.context()?;
        QuizController::open(self.quiz_services(), user, article_id, self.timing).await
    }
}
