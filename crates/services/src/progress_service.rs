use std::sync::Arc;

use backend::ProgressTracker;
use quiz_core::Clock;
use quiz_core::model::{ProgressEvent, ProgressSummary, UserId};
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Sends progress points and summarizes them for the progress screen.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    tracker: Arc<dyn ProgressTracker>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, tracker: Arc<dyn ProgressTracker>) -> Self {
        Self { clock, tracker }
    }

    /// One article point for a finished quiz. Failures are only logged.
    pub async fn award_quiz_point(&self, user_id: UserId) {
        let event = ProgressEvent::quiz_completed(user_id);
        match self.tracker.record_progress(&event).await {
            Ok(entry) => debug!(%user_id, progress_id = %entry.id, "quiz progress recorded"),
            Err(e) => warn!(%user_id, error = %e, "failed to record quiz progress"),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Backend` if the entries cannot be loaded.
    pub async fn summary(&self, user_id: UserId) -> Result<ProgressSummary, ServiceError> {
        let entries = self.tracker.progress_entries(user_id).await?;
        Ok(ProgressSummary::from_entries(&entries, self.clock.now()))
    }

    /// Delete every progress entry of the user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Backend` if the backend refuses.
    pub async fn reset(&self, user_id: UserId) -> Result<(), ServiceError> {
        self.tracker.delete_progress(user_id).await?;
        Ok(())
    }
}
