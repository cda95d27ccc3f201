#![forbid(unsafe_code)]

pub mod model;
pub mod optimistic;
pub mod session;
pub mod time;

pub use optimistic::{Optimistic, OptimisticError};
pub use session::{
    Advance, QUESTION_SECONDS, QuestionView, QuizOutcome, QuizSession, QuizSessionError, Selection,
};
pub use time::Clock;
