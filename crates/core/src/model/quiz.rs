use thiserror::Error;

use crate::model::{ArticleId, QuizId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Authoring errors for a quiz draft.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizDraftError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question {question} has empty text")]
    EmptyQuestion { question: usize },

    #[error("question {question} needs at least two choices, got {len}")]
    TooFewChoices { question: usize, len: usize },

    #[error("question {question} must have exactly one correct choice, got {correct}")]
    CorrectChoiceCount { question: usize, correct: usize },
}

//
// ─── QUESTIONS ────────────────────────────────────────────────────────────────
//

/// One answer option. `is_correct` is never shown to the respondent before selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub is_correct: bool,
}

impl Choice {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }

    #[must_use]
    pub fn correct(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    #[must_use]
    pub fn wrong(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub choices: Vec<Choice>,
}

impl Question {
    #[must_use]
    pub fn new(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            choices,
        }
    }

    /// Index of the first choice flagged correct, if any.
    #[must_use]
    pub fn correct_choice(&self) -> Option<usize> {
        self.choices.iter().position(|choice| choice.is_correct)
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// A quiz attached to an article, as served by the catalog.
///
/// No authoring invariants are enforced here: whatever the backend returns is
/// representable. Sessions reject empty quizzes at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    article_id: ArticleId,
    title: String,
    description: Option<String>,
    questions: Vec<Question>,
}

impl Quiz {
    #[must_use]
    pub fn new(
        id: QuizId,
        article_id: ArticleId,
        title: impl Into<String>,
        description: Option<String>,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id,
            article_id,
            title: title.into(),
            description,
            questions,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Convert back into an editable draft, e.g. for an update round-trip.
    #[must_use]
    pub fn to_draft(&self) -> QuizDraft {
        QuizDraft {
            title: self.title.clone(),
            article_id: self.article_id,
            description: self.description.clone(),
            questions: self.questions.clone(),
        }
    }
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Authoring input for creating or replacing a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub article_id: ArticleId,
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

impl QuizDraft {
    /// Check the authoring invariants the quiz session relies on.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizDraftError` found, scanning questions in order.
    pub fn validate(&self) -> Result<(), QuizDraftError> {
        if self.title.trim().is_empty() {
            return Err(QuizDraftError::EmptyTitle);
        }
        if self.questions.is_empty() {
            return Err(QuizDraftError::NoQuestions);
        }

        for (index, question) in self.questions.iter().enumerate() {
            if question.text.trim().is_empty() {
                return Err(QuizDraftError::EmptyQuestion { question: index });
            }
            if question.choices.len() < 2 {
                return Err(QuizDraftError::TooFewChoices {
                    question: index,
                    len: question.choices.len(),
                });
            }
            let correct = question.choices.iter().filter(|c| c.is_correct).count();
            if correct != 1 {
                return Err(QuizDraftError::CorrectChoiceCount {
                    question: index,
                    correct,
                });
            }
        }

        Ok(())
    }

    /// Materialize the draft under a backend-assigned id.
    #[must_use]
    pub fn into_quiz(self, id: QuizId) -> Quiz {
        Quiz::new(
            id,
            self.article_id,
            self.title,
            self.description,
            self.questions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(questions: Vec<Question>) -> QuizDraft {
        QuizDraft {
            title: "Sleep basics".into(),
            article_id: ArticleId::new(3),
            description: None,
            questions,
        }
    }

    #[test]
    fn valid_draft_passes() {
        let d = draft(vec![Question::new(
            "How many hours?",
            vec![Choice::wrong("4"), Choice::correct("8")],
        )]);
        assert_eq!(d.validate(), Ok(()));
        assert_eq!(d.questions[0].correct_choice(), Some(1));
    }

    #[test]
    fn rejects_two_correct_choices() {
        let d = draft(vec![Question::new(
            "Pick",
            vec![Choice::correct("a"), Choice::correct("b")],
        )]);
        assert_eq!(
            d.validate(),
            Err(QuizDraftError::CorrectChoiceCount {
                question: 0,
                correct: 2
            })
        );
    }

    #[test]
    fn rejects_empty_title_and_questions() {
        let mut d = draft(Vec::new());
        assert_eq!(d.validate(), Err(QuizDraftError::NoQuestions));
        d.title = "  ".into();
        assert_eq!(d.validate(), Err(QuizDraftError::EmptyTitle));
    }

    #[test]
    fn rejects_single_choice_question() {
        let d = draft(vec![Question::new("Only", vec![Choice::correct("yes")])]);
        assert_eq!(
            d.validate(),
            Err(QuizDraftError::TooFewChoices {
                question: 0,
                len: 1
            })
        );
    }

    #[test]
    fn draft_round_trips_through_quiz() {
        let d = draft(vec![Question::new(
            "Q",
            vec![Choice::correct("a"), Choice::wrong("b")],
        )]);
        let quiz = d.clone().into_quiz(QuizId::new(9));
        assert_eq!(quiz.id(), QuizId::new(9));
        assert_eq!(quiz.to_draft(), d);
    }
}
