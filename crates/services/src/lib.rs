#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod completion_service;
pub mod error;
pub mod progress_service;
pub mod quiz;
pub mod schedule;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use completion_service::CompletionService;
pub use error::{AuthError, ControllerError, ServiceError};
pub use progress_service::ProgressService;
pub use quiz::{ChoiceResult, QuizController, QuizServices, QuizTiming, QuizView, Step};
pub use schedule::ScheduledTask;
