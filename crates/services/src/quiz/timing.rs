use std::time::Duration;

use quiz_core::QUESTION_SECONDS;

/// Timer settings for a running quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizTiming {
    /// Countdown start value for every question.
    pub question_seconds: u32,
    /// Interval between countdown steps.
    pub tick: Duration,
    /// How long the answer feedback stays visible before moving on.
    pub reveal_delay: Duration,
}

impl Default for QuizTiming {
    fn default() -> Self {
        Self {
            question_seconds: QUESTION_SECONDS,
            tick: Duration::from_secs(1),
            reveal_delay: Duration::from_millis(1_500),
        }
    }
}

impl QuizTiming {
    /// No reveal delay; useful for non-interactive drivers.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            reveal_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
