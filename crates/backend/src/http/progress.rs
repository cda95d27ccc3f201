use async_trait::async_trait;
use quiz_core::model::{ProgressEntry, ProgressEvent, UserId};
use reqwest::Method;

use super::HttpBackend;
use super::wire::{ProgressBody, ProgressDto};
use crate::repository::{BackendError, ProgressTracker};

#[async_trait]
impl ProgressTracker for HttpBackend {
    async fn record_progress(&self, event: &ProgressEvent) -> Result<ProgressEntry, BackendError> {
        let request = self
            .authorized(Method::POST, "users/update_progress")?
            .json(&ProgressBody::from_event(event));
        let dto: ProgressDto = self.json(request).await?;
        dto.into_entry()
    }

    async fn progress_entries(&self, user_id: UserId) -> Result<Vec<ProgressEntry>, BackendError> {
        let request = self
            .authorized(Method::GET, "users/get_points_by_date")?
            .query(&[("user_id", user_id.value())]);
        let dtos: Vec<ProgressDto> = self.json(request).await?;
        dtos.into_iter().map(ProgressDto::into_entry).collect()
    }

    async fn delete_progress(&self, user_id: UserId) -> Result<(), BackendError> {
        let request = self
            .authorized(Method::DELETE, "users/delete_progress")?
            .query(&[("user_id", user_id.value())]);
        self.send(request).await?;
        Ok(())
    }
}
