use async_trait::async_trait;
use quiz_core::model::{ArticleId, Quiz, QuizDraft, QuizId};
use reqwest::Method;

use super::HttpBackend;
use super::wire::{QuizDraftBody, QuizDto};
use crate::repository::{BackendError, QuizCatalog};

#[async_trait]
impl QuizCatalog for HttpBackend {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, BackendError> {
        let dtos: Vec<QuizDto> = self.json(self.authorized(Method::GET, "quizzes/")?).await?;
        Ok(dtos.into_iter().map(QuizDto::into_quiz).collect())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, BackendError> {
        let request = self.authorized(Method::GET, &format!("quizzes/{id}"))?;
        let dto: QuizDto = self.json(request).await?;
        Ok(dto.into_quiz())
    }

    async fn quiz_for_article(&self, article_id: ArticleId) -> Result<Option<Quiz>, BackendError> {
        let request = self.authorized(Method::GET, &format!("quizzes/article/{article_id}"))?;
        match self.json::<QuizDto>(request).await {
            Ok(dto) => Ok(Some(dto.into_quiz())),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, BackendError> {
        draft.validate()?;
        let request = self
            .authorized(Method::POST, "quizzes/")?
            .json(&QuizDraftBody::from_draft(draft));
        let dto: QuizDto = self.json(request).await?;
        Ok(dto.into_quiz())
    }

    async fn update_quiz(&self, id: QuizId, draft: &QuizDraft) -> Result<Quiz, BackendError> {
        draft.validate()?;
        let request = self
            .authorized(Method::PUT, &format!("quizzes/{id}"))?
            .json(&QuizDraftBody::from_draft(draft));
        let dto: QuizDto = self.json(request).await?;
        Ok(dto.into_quiz())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), BackendError> {
        let request = self.authorized(Method::DELETE, &format!("quizzes/{id}"))?;
        self.send(request).await?;
        Ok(())
    }
}
