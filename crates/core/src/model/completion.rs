use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{ArticleId, CompletionId, QuizId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score must be between 0 and 100, got {0}")]
    OutOfRange(u32),

    #[error("cannot score a quiz with no questions")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed question count ({total})")]
    TooManyCorrect { correct: u32, total: u32 },
}

/// Percentage score for a finished attempt, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub const MAX: Score = Score(100);

    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` for values above 100.
    pub fn new(value: u32) -> Result<Self, ScoreError> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Self(v)),
            _ => Err(ScoreError::OutOfRange(value)),
        }
    }

    /// `round(100 * correct / total)`, halves rounded up.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` when `total` is zero and
    /// `ScoreError::TooManyCorrect` when `correct > total`.
    pub fn from_counts(correct: u32, total: u32) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::NoQuestions);
        }
        if correct > total {
            return Err(ScoreError::TooManyCorrect { correct, total });
        }
        let correct = u64::from(correct);
        let total = u64::from(total);
        // floor(100c/n + 1/2) in integer arithmetic
        let rounded = (200 * correct + total) / (2 * total);
        Self::new(u32::try_from(rounded).map_err(|_| ScoreError::OutOfRange(u32::MAX))?)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Persisted evidence that a user finished an article's quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizCompletion {
    pub id: CompletionId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub article_id: ArticleId,
    pub score: Score,
    pub completed_at: DateTime<Utc>,
}

/// Answer to "has this user completed the quiz for this article?".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionStatus {
    pub completed: bool,
    pub completion: Option<QuizCompletion>,
}

impl CompletionStatus {
    /// The fail-open answer used whenever the backend cannot be asked.
    #[must_use]
    pub fn not_completed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn completed(completion: QuizCompletion) -> Self {
        Self {
            completed: true,
            completion: Some(completion),
        }
    }
}
