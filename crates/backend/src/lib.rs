#![forbid(unsafe_code)]

pub mod auth_store;
pub mod http;
pub mod memory;
pub mod repository;

pub use auth_store::AuthSessionStore;
pub use http::{ApiConfig, HttpBackend};
pub use memory::{InMemoryBackend, Operation};
pub use repository::{
    AuthGateway, Backend, BackendError, CompletionStore, NewCompletionRecord, ProgressTracker,
    QuizCatalog,
};
