//! Interactive quiz flow: one controller per opened quiz screen.

mod controller;
mod timing;
mod view;

pub use controller::{QuizController, QuizServices};
pub use timing::QuizTiming;
pub use view::{ChoiceResult, QuizView, Step};
