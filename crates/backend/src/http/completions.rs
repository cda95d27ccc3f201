use async_trait::async_trait;
use quiz_core::model::{ArticleId, CompletionId, CompletionStatus, QuizCompletion, UserId};
use reqwest::Method;

use super::HttpBackend;
use super::wire::{CompletionBody, CompletionCheckDto, CompletionDto};
use crate::repository::{BackendError, CompletionStore, NewCompletionRecord};

#[async_trait]
impl CompletionStore for HttpBackend {
    async fn record_completion(
        &self,
        record: &NewCompletionRecord,
    ) -> Result<QuizCompletion, BackendError> {
        let request = self
            .authorized(Method::POST, "quizzes/completions")?
            .json(&CompletionBody::from_record(record));
        let dto: CompletionDto = self.json(request).await?;
        dto.into_completion()
    }

    async fn check_completion(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<CompletionStatus, BackendError> {
        let request = self
            .authorized(Method::GET, "quizzes/completions/check")?
            .query(&[("user_id", user_id.value()), ("article_id", article_id.value())]);
        let dto: CompletionCheckDto = self.json(request).await?;
        dto.into_status()
    }

    async fn user_completions(&self, user_id: UserId) -> Result<Vec<QuizCompletion>, BackendError> {
        let request =
            self.authorized(Method::GET, &format!("quizzes/completions/user/{user_id}"))?;
        let dtos: Vec<CompletionDto> = self.json(request).await?;
        dtos.into_iter().map(CompletionDto::into_completion).collect()
    }

    async fn delete_completion(&self, id: CompletionId) -> Result<(), BackendError> {
        let request = self.authorized(Method::DELETE, &format!("quizzes/completions/{id}"))?;
        self.send(request).await?;
        Ok(())
    }
}
