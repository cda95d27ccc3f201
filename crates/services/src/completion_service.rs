use std::sync::Arc;

use backend::{CompletionStore, NewCompletionRecord};
use quiz_core::model::{
    ArticleId, CompletionId, CompletionStatus, QuizCompletion, QuizId, Score, UserId,
};
use tracing::{debug, error, warn};

use crate::error::ServiceError;

/// Keeps one authoritative completion record per (user, article) in sync
/// with the respondent's latest attempt.
///
/// Failure policy differs per operation: reads fail open, writes are
/// best-effort and report through their return value instead of an error.
#[derive(Clone)]
pub struct CompletionService {
    store: Arc<dyn CompletionStore>,
}

impl CompletionService {
    #[must_use]
    pub fn new(store: Arc<dyn CompletionStore>) -> Self {
        Self { store }
    }

    /// Never fails: a backend error reads as "not completed".
    pub async fn check_completion(&self, user_id: UserId, article_id: ArticleId) -> CompletionStatus {
        match self.store.check_completion(user_id, article_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(
                    %user_id,
                    %article_id,
                    error = %e,
                    "completion check failed; treating quiz as not completed"
                );
                CompletionStatus::not_completed()
            }
        }
    }

    /// Persist the outcome of a finished attempt. `None` if the backend refused.
    pub async fn record_completion(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        article_id: ArticleId,
        score: Score,
    ) -> Option<QuizCompletion> {
        let record = NewCompletionRecord {
            user_id,
            quiz_id,
            article_id,
            score,
        };
        match self.store.record_completion(&record).await {
            Ok(completion) => {
                debug!(completion_id = %completion.id, %score, "quiz completion recorded");
                Some(completion)
            }
            Err(e) => {
                error!(%user_id, %quiz_id, %score, error = %e, "failed to record quiz completion");
                None
            }
        }
    }

    /// `false` when the record could not be deleted, including when it no longer exists.
    pub async fn delete_completion(&self, completion_id: CompletionId) -> bool {
        match self.store.delete_completion(completion_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%completion_id, error = %e, "failed to delete quiz completion");
                false
            }
        }
    }

    /// All completions of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Backend` if the history cannot be loaded.
    pub async fn user_completions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<QuizCompletion>, ServiceError> {
        let mut completions = self.store.user_completions(user_id).await?;
        completions.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(completions)
    }
}
