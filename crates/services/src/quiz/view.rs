use quiz_core::model::{ArticleId, QuizCompletion, QuizId};
use quiz_core::{QuestionView, QuizOutcome, Selection};

/// Where the attempt stands after a selection has been settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    NextQuestion(usize),
    /// `completion` is `None` when the backend did not store the record.
    Completed {
        outcome: QuizOutcome,
        completion: Option<QuizCompletion>,
    },
}

/// Result of `QuizController::select_choice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceResult {
    pub selection: Selection,
    pub step: Step,
}

/// Presentation snapshot of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub quiz_id: QuizId,
    pub article_id: ArticleId,
    pub title: String,
    pub description: Option<String>,
    pub question: Option<QuestionView>,
    /// 1-based, for display.
    pub question_number: usize,
    pub total_questions: usize,
    pub countdown: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub outcome: Option<QuizOutcome>,
    pub completion: Option<QuizCompletion>,
    /// A stored record exists and no attempt is running.
    pub already_completed: bool,
    pub can_retake: bool,
}
