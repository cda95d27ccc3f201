use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use quiz_core::Clock;
use quiz_core::model::{
    ArticleId, AuthenticatedUser, CompletionId, CompletionStatus, ProgressEntry, ProgressEvent,
    ProgressId, Quiz, QuizCompletion, QuizDraft, QuizId, UserId,
};

use crate::repository::{
    AuthGateway, BackendError, CompletionStore, NewCompletionRecord, ProgressTracker, QuizCatalog,
};

/// Backend operations, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListQuizzes,
    GetQuiz,
    QuizForArticle,
    CreateQuiz,
    UpdateQuiz,
    DeleteQuiz,
    RecordCompletion,
    CheckCompletion,
    UserCompletions,
    DeleteCompletion,
    RecordProgress,
    ProgressEntries,
    DeleteProgress,
    Login,
    Refresh,
    Logout,
}

#[derive(Default)]
struct State {
    quizzes: BTreeMap<QuizId, Quiz>,
    completions: BTreeMap<CompletionId, QuizCompletion>,
    progress: Vec<ProgressEntry>,
    accounts: HashMap<String, (String, AuthenticatedUser)>,
    logged_in: HashSet<UserId>,
    next_id: u64,
    failing: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory backend for tests and offline runs.
///
/// Every operation can be switched to fail with `BackendError::Unavailable`,
/// and every call is counted, whether it fails or not.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
    clock: Clock,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))
    }

    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock()?;
        *state.calls.entry(op).or_default() += 1;
        if state.failing.contains(&op) {
            return Err(BackendError::Unavailable(format!("{op:?} failure injected")));
        }
        Ok(state)
    }

    /// Seed a quiz as if the backend already stored it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the state lock is poisoned.
    pub fn insert_quiz(&self, quiz: Quiz) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        state.next_id = state.next_id.max(quiz.id().value());
        state.quizzes.insert(quiz.id(), quiz);
        Ok(())
    }

    /// Register credentials accepted by `login`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the state lock is poisoned.
    pub fn add_account(
        &self,
        password: impl Into<String>,
        user: AuthenticatedUser,
    ) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        state
            .accounts
            .insert(user.email.clone(), (password.into(), user));
        Ok(())
    }

    /// Make every subsequent `op` call fail until `recover` is called.
    pub fn fail(&self, op: Operation) {
        if let Ok(mut state) = self.lock() {
            state.failing.insert(op);
        }
    }

    pub fn recover(&self, op: Operation) {
        if let Ok(mut state) = self.lock() {
            state.failing.remove(&op);
        }
    }

    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.lock()
            .map(|state| state.calls.get(&op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn completions(&self) -> Vec<QuizCompletion> {
        self.lock()
            .map(|state| state.completions.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn progress(&self) -> Vec<ProgressEntry> {
        self.lock()
            .map(|state| state.progress.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QuizCatalog for InMemoryBackend {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, BackendError> {
        let state = self.enter(Operation::ListQuizzes)?;
        Ok(state.quizzes.values().cloned().collect())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, BackendError> {
        let state = self.enter(Operation::GetQuiz)?;
        state.quizzes.get(&id).cloned().ok_or(BackendError::NotFound)
    }

    async fn quiz_for_article(&self, article_id: ArticleId) -> Result<Option<Quiz>, BackendError> {
        let state = self.enter(Operation::QuizForArticle)?;
        Ok(state
            .quizzes
            .values()
            .find(|quiz| quiz.article_id() == article_id)
            .cloned())
    }

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, BackendError> {
        draft.validate()?;
        let mut state = self.enter(Operation::CreateQuiz)?;
        if state
            .quizzes
            .values()
            .any(|quiz| quiz.article_id() == draft.article_id)
        {
            // one quiz per article
            return Err(BackendError::HttpStatus(reqwest::StatusCode::CONFLICT));
        }
        let id = QuizId::new(state.next_id());
        let quiz = draft.clone().into_quiz(id);
        state.quizzes.insert(id, quiz.clone());
        Ok(quiz)
    }

    async fn update_quiz(&self, id: QuizId, draft: &QuizDraft) -> Result<Quiz, BackendError> {
        draft.validate()?;
        let mut state = self.enter(Operation::UpdateQuiz)?;
        let slot = state.quizzes.get_mut(&id).ok_or(BackendError::NotFound)?;
        *slot = draft.clone().into_quiz(id);
        Ok(slot.clone())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::DeleteQuiz)?;
        state
            .quizzes
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }
}

#[async_trait]
impl CompletionStore for InMemoryBackend {
    async fn record_completion(
        &self,
        record: &NewCompletionRecord,
    ) -> Result<QuizCompletion, BackendError> {
        let mut state = self.enter(Operation::RecordCompletion)?;
        let completion = QuizCompletion {
            id: CompletionId::new(state.next_id()),
            user_id: record.user_id,
            quiz_id: record.quiz_id,
            article_id: record.article_id,
            score: record.score,
            completed_at: self.clock.now(),
        };
        state.completions.insert(completion.id, completion.clone());
        Ok(completion)
    }

    async fn check_completion(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<CompletionStatus, BackendError> {
        let state = self.enter(Operation::CheckCompletion)?;
        let found = state
            .completions
            .values()
            .find(|c| c.user_id == user_id && c.article_id == article_id)
            .cloned();
        Ok(found.map_or_else(CompletionStatus::not_completed, CompletionStatus::completed))
    }

    async fn user_completions(&self, user_id: UserId) -> Result<Vec<QuizCompletion>, BackendError> {
        let state = self.enter(Operation::UserCompletions)?;
        Ok(state
            .completions
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_completion(&self, id: CompletionId) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::DeleteCompletion)?;
        state
            .completions
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }
}

#[async_trait]
impl ProgressTracker for InMemoryBackend {
    async fn record_progress(&self, event: &ProgressEvent) -> Result<ProgressEntry, BackendError> {
        let mut state = self.enter(Operation::RecordProgress)?;
        let entry = ProgressEntry {
            id: ProgressId::new(state.next_id()),
            user_id: event.user_id,
            content_type: event.content_type,
            points_collected: event.points_collected,
            date: self.clock.now(),
        };
        state.progress.push(entry.clone());
        Ok(entry)
    }

    async fn progress_entries(&self, user_id: UserId) -> Result<Vec<ProgressEntry>, BackendError> {
        let state = self.enter(Operation::ProgressEntries)?;
        Ok(state
            .progress
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_progress(&self, user_id: UserId) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::DeleteProgress)?;
        state.progress.retain(|entry| entry.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for InMemoryBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, BackendError> {
        let mut state = self.enter(Operation::Login)?;
        let user = match state.accounts.get(email) {
            Some((expected, user)) if expected == password => user.clone(),
            _ => return Err(BackendError::Unauthenticated),
        };
        state.logged_in.insert(user.id);
        Ok(user)
    }

    async fn refresh(&self) -> Result<String, BackendError> {
        let mut state = self.enter(Operation::Refresh)?;
        if state.logged_in.is_empty() {
            return Err(BackendError::Unauthenticated);
        }
        let n = state.next_id();
        Ok(format!("refreshed-{n}"))
    }

    async fn logout(&self, user_id: UserId) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::Logout)?;
        state.logged_in.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Choice, Question, Score};
    use quiz_core::time::{fixed_clock, fixed_now};

    fn draft(article: u64) -> QuizDraft {
        QuizDraft {
            title: "Breathing".into(),
            article_id: ArticleId::new(article),
            description: None,
            questions: vec![Question::new(
                "Box breathing counts to?",
                vec![Choice::correct("4"), Choice::wrong("10")],
            )],
        }
    }

    fn record(user: u64, article: u64) -> NewCompletionRecord {
        NewCompletionRecord {
            user_id: UserId::new(user),
            quiz_id: QuizId::new(1),
            article_id: ArticleId::new(article),
            score: Score::new(50).unwrap(),
        }
    }

    #[tokio::test]
    async fn catalog_enforces_one_quiz_per_article() {
        let repo = InMemoryBackend::new();
        let quiz = repo.create_quiz(&draft(5)).await.unwrap();
        assert_eq!(
            repo.quiz_for_article(ArticleId::new(5)).await.unwrap(),
            Some(quiz.clone())
        );
        assert!(repo.create_quiz(&draft(5)).await.is_err());
        assert!(repo.quiz_exists_for_article(ArticleId::new(5)).await.unwrap());
        assert!(!repo.quiz_exists_for_article(ArticleId::new(6)).await.unwrap());

        repo.delete_quiz(quiz.id()).await.unwrap();
        assert!(repo.get_quiz(quiz.id()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_state() {
        let repo = InMemoryBackend::new();
        let mut bad = draft(1);
        bad.questions.clear();
        assert!(matches!(
            repo.create_quiz(&bad).await,
            Err(BackendError::InvalidDraft(_))
        ));
        assert_eq!(repo.calls(Operation::CreateQuiz), 0);
    }

    #[tokio::test]
    async fn completion_record_check_delete() {
        let repo = InMemoryBackend::new().with_clock(fixed_clock());
        let created = repo.record_completion(&record(1, 9)).await.unwrap();
        assert_eq!(created.completed_at, fixed_now());

        let status = repo
            .check_completion(UserId::new(1), ArticleId::new(9))
            .await
            .unwrap();
        assert!(status.completed);
        assert_eq!(status.completion, Some(created.clone()));

        let other = repo
            .check_completion(UserId::new(2), ArticleId::new(9))
            .await
            .unwrap();
        assert!(!other.completed);

        repo.delete_completion(created.id).await.unwrap();
        assert!(matches!(
            repo.delete_completion(created.id).await,
            Err(BackendError::NotFound)
        ));
    }

    #[tokio::test]
    async fn injected_failures_are_counted() {
        let repo = InMemoryBackend::new();
        repo.fail(Operation::CheckCompletion);
        assert!(matches!(
            repo.check_completion(UserId::new(1), ArticleId::new(1)).await,
            Err(BackendError::Unavailable(_))
        ));
        repo.recover(Operation::CheckCompletion);
        assert!(repo
            .check_completion(UserId::new(1), ArticleId::new(1))
            .await
            .is_ok());
        assert_eq!(repo.calls(Operation::CheckCompletion), 2);
    }

    #[tokio::test]
    async fn login_requires_matching_password() {
        let repo = InMemoryBackend::new();
        let user = AuthenticatedUser {
            id: UserId::new(3),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.c".into(),
            role: "User".into(),
            access_token: "tok".into(),
        };
        repo.add_account("pw", user.clone()).unwrap();

        assert!(matches!(
            repo.login("a@b.c", "nope").await,
            Err(BackendError::Unauthenticated)
        ));
        assert!(matches!(repo.refresh().await, Err(BackendError::Unauthenticated)));
        assert_eq!(repo.login("a@b.c", "pw").await.unwrap(), user);
        assert!(repo.refresh().await.unwrap().starts_with("refreshed-"));
    }
}
