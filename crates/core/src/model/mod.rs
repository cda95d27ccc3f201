mod completion;
mod ids;
mod progress;
mod quiz;
mod user;

pub use completion::{CompletionStatus, QuizCompletion, Score, ScoreError};
pub use ids::{ArticleId, CompletionId, ParseIdError, ProgressId, QuizId, UserId};
pub use progress::{
    ContentType, DailyObjectives, ProgressEntry, ProgressEvent, ProgressSummary,
    UnknownContentType,
};
pub use quiz::{Choice, Question, Quiz, QuizDraft, QuizDraftError};
pub use user::{AuthenticatedUser, UserContext};
