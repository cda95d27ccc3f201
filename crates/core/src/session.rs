use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::model::{Quiz, Score, ScoreError};

/// Seconds on the countdown at the start of every question.
pub const QUESTION_SECONDS: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("quiz has no questions")]
    Empty,

    #[error("quiz has too many questions: {len}")]
    TooManyQuestions { len: usize },

    #[error("question {question_index} already answered")]
    AlreadyAnswered { question_index: usize },

    #[error("question {question_index} has no choice {choice_index}")]
    ChoiceOutOfRange {
        question_index: usize,
        choice_index: usize,
    },

    #[error("question {question_index} has not been answered yet")]
    NotAnswered { question_index: usize },

    #[error("quiz session already completed")]
    Completed,

    #[error(transparent)]
    Score(#[from] ScoreError),
}

//
// ─── TRANSITION RESULTS ───────────────────────────────────────────────────────
//

/// Result of recording a choice for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub question_index: usize,
    pub choice_index: usize,
    pub is_correct: bool,
}

/// Final tally of a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
    pub score: Score,
}

/// What happened when the session moved past an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(usize),
    Completed(QuizOutcome),
}

/// Respondent-facing view of the current question.
///
/// Correctness is only present for the selected choice, after selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub choices: Vec<String>,
    pub selected: Option<usize>,
    pub selected_is_correct: Option<bool>,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One in-memory attempt at a quiz.
///
/// `InProgress` until the last question is answered and advanced past, then
/// `Completed` for good. A retake builds on `restart`, never on mutating a
/// completed outcome.
#[derive(Clone)]
pub struct QuizSession {
    quiz: Quiz,
    total: u32,
    question_seconds: u32,
    current: usize,
    answers: BTreeMap<usize, usize>,
    correct: u32,
    incorrect: u32,
    countdown: u32,
    outcome: Option<QuizOutcome>,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `QuizSessionError::Empty` if the quiz has no questions.
    pub fn start(quiz: Quiz) -> Result<Self, QuizSessionError> {
        Self::start_with_countdown(quiz, QUESTION_SECONDS)
    }

    /// Start with a custom per-question countdown.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Empty` if the quiz has no questions.
    pub fn start_with_countdown(
        quiz: Quiz,
        question_seconds: u32,
    ) -> Result<Self, QuizSessionError> {
        let len = quiz.question_count();
        if len == 0 {
            return Err(QuizSessionError::Empty);
        }
        let total = u32::try_from(len).map_err(|_| QuizSessionError::TooManyQuestions { len })?;

        Ok(Self {
            quiz,
            total,
            question_seconds,
            current: 0,
            answers: BTreeMap::new(),
            correct: 0,
            incorrect: 0,
            countdown: question_seconds,
            outcome: None,
        })
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.quiz.question_count()
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Answers so far, keyed by question index. Questions are answered in
    /// order, so key order is answer order.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    #[must_use]
    pub fn outcome(&self) -> Option<QuizOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the current question already has a recorded answer.
    #[must_use]
    pub fn is_current_answered(&self) -> bool {
        self.answers.contains_key(&self.current)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<QuestionView> {
        if self.is_complete() {
            return None;
        }
        let question = self.quiz.questions().get(self.current)?;
        let selected = self.answers.get(&self.current).copied();
        let selected_is_correct =
            selected.and_then(|i| question.choices.get(i).map(|choice| choice.is_correct));

        Some(QuestionView {
            index: self.current,
            text: question.text.clone(),
            choices: question.choices.iter().map(|c| c.text.clone()).collect(),
            selected,
            selected_is_correct,
        })
    }

    /// Record the respondent's choice for the current question.
    ///
    /// Counters are updated before this returns, so the last answer is
    /// always part of the score computed by `advance`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyAnswered`, `ChoiceOutOfRange` or `Completed`; in every
    /// error case the session is left unchanged.
    pub fn select_choice(&mut self, choice_index: usize) -> Result<Selection, QuizSessionError> {
        if self.is_complete() {
            return Err(QuizSessionError::Completed);
        }
        let question_index = self.current;
        if self.answers.contains_key(&question_index) {
            return Err(QuizSessionError::AlreadyAnswered { question_index });
        }

        let is_correct = self
            .quiz
            .questions()
            .get(question_index)
            .and_then(|q| q.choices.get(choice_index))
            .map(|choice| choice.is_correct)
            .ok_or(QuizSessionError::ChoiceOutOfRange {
                question_index,
                choice_index,
            })?;

        self.answers.insert(question_index, choice_index);
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }

        Ok(Selection {
            question_index,
            choice_index,
            is_correct,
        })
    }

    /// Move past the answered current question.
    ///
    /// # Errors
    ///
    /// Returns `NotAnswered` if the current question has no answer and
    /// `Completed` if the session already finished.
    pub fn advance(&mut self) -> Result<Advance, QuizSessionError> {
        if self.is_complete() {
            return Err(QuizSessionError::Completed);
        }
        if !self.is_current_answered() {
            return Err(QuizSessionError::NotAnswered {
                question_index: self.current,
            });
        }

        if self.current + 1 < self.total_questions() {
            self.current += 1;
            self.countdown = self.question_seconds;
            return Ok(Advance::NextQuestion(self.current));
        }

        let outcome = QuizOutcome {
            correct: self.correct,
            incorrect: self.incorrect,
            total: self.total,
            score: Score::from_counts(self.correct, self.total)?,
        };
        self.outcome = Some(outcome);
        Ok(Advance::Completed(outcome))
    }

    /// One countdown step. Only moves while the current question is unanswered;
    /// stops at zero without touching anything else.
    pub fn tick(&mut self) -> u32 {
        if !self.is_complete() && !self.is_current_answered() {
            self.countdown = self.countdown.saturating_sub(1);
        }
        self.countdown
    }

    /// Reset to the freshly started state for the same quiz.
    pub fn restart(&mut self) {
        self.current = 0;
        self.answers.clear();
        self.correct = 0;
        self.incorrect = 0;
        self.countdown = self.question_seconds;
        self.outcome = None;
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id())
            .field("questions", &self.total)
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("correct", &self.correct)
            .field("incorrect", &self.incorrect)
            .field("countdown", &self.countdown)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
