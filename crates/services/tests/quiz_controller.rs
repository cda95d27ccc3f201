use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backend::{BackendError, CompletionStore, InMemoryBackend, NewCompletionRecord, Operation};
use quiz_core::QuizSessionError;
use quiz_core::model::{
    ArticleId, Choice, CompletionId, CompletionStatus, Question, Quiz, QuizCompletion, QuizId,
    Score, UserContext, UserId,
};
use quiz_core::time::fixed_clock;
use services::{
    AppServices, AuthError, CompletionService, ControllerError, ProgressService, QuizController,
    QuizServices, QuizTiming, Step,
};
use tokio::time::{sleep, timeout};

const USER: UserId = UserId::new(11);
const ARTICLE: u64 = 40;

fn true_false_quiz() -> Quiz {
    Quiz::new(
        QuizId::new(1),
        ArticleId::new(ARTICLE),
        "Sleep basics",
        Some("Two quick checks".into()),
        vec![
            Question::new(
                "Teens need 8-10 hours of sleep.",
                vec![Choice::correct("True"), Choice::wrong("False")],
            ),
            Question::new(
                "Screens before bed help you fall asleep.",
                vec![Choice::wrong("True"), Choice::correct("False")],
            ),
        ],
    )
}

fn four_question_quiz() -> Quiz {
    let question = |n: usize| {
        Question::new(
            format!("Question {n}"),
            vec![Choice::correct("right"), Choice::wrong("wrong")],
        )
    };
    Quiz::new(
        QuizId::new(2),
        ArticleId::new(ARTICLE),
        "Stress",
        None,
        (1..=4).map(question).collect(),
    )
}

fn seeded(quiz: Quiz) -> InMemoryBackend {
    let repo = InMemoryBackend::new().with_clock(fixed_clock());
    repo.insert_quiz(quiz).unwrap();
    repo
}

fn services(repo: &InMemoryBackend) -> QuizServices {
    QuizServices {
        catalog: Arc::new(repo.clone()),
        completions: CompletionService::new(Arc::new(repo.clone())),
        progress: ProgressService::new(fixed_clock(), Arc::new(repo.clone())),
    }
}

/// Completion store whose writes answer only after `delay`.
struct SlowCompletions {
    inner: InMemoryBackend,
    delay: Duration,
}

#[async_trait]
impl CompletionStore for SlowCompletions {
    async fn record_completion(
        &self,
        record: &NewCompletionRecord,
    ) -> Result<QuizCompletion, BackendError> {
        sleep(self.delay).await;
        self.inner.record_completion(record).await
    }

    async fn check_completion(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<CompletionStatus, BackendError> {
        self.inner.check_completion(user_id, article_id).await
    }

    async fn user_completions(&self, user_id: UserId) -> Result<Vec<QuizCompletion>, BackendError> {
        self.inner.user_completions(user_id).await
    }

    async fn delete_completion(&self, id: CompletionId) -> Result<(), BackendError> {
        sleep(self.delay).await;
        self.inner.delete_completion(id).await
    }
}

async fn open_slow(repo: &InMemoryBackend, delay: Duration) -> QuizController {
    let slow = SlowCompletions {
        inner: repo.clone(),
        delay,
    };
    let services = QuizServices {
        completions: CompletionService::new(Arc::new(slow)),
        ..services(repo)
    };
    QuizController::open(
        services,
        UserContext::new(USER),
        ArticleId::new(ARTICLE),
        QuizTiming::default(),
    )
    .await
    .unwrap()
}

async fn open(repo: &InMemoryBackend) -> Result<QuizController, ControllerError> {
    QuizController::open(
        services(repo),
        UserContext::new(USER),
        ArticleId::new(ARTICLE),
        QuizTiming::default(),
    )
    .await
}

async fn store_prior_completion(repo: &InMemoryBackend, score: u32) {
    repo.record_completion(&NewCompletionRecord {
        user_id: USER,
        quiz_id: QuizId::new(1),
        article_id: ArticleId::new(ARTICLE),
        score: Score::new(score).unwrap(),
    })
    .await
    .unwrap();
}

async fn finish_true_false(controller: &mut QuizController) {
    controller.select_choice(0).await.unwrap();
    let last = controller.select_choice(1).await.unwrap();
    assert!(matches!(last.step, Step::Completed { .. }));
}

#[tokio::test(start_paused = true)]
async fn true_false_quiz_scores_full_marks_and_records_once() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();

    let first = controller.select_choice(0).await.unwrap();
    assert!(first.selection.is_correct);
    assert_eq!(first.step, Step::NextQuestion(1));

    let last = controller.select_choice(1).await.unwrap();
    let Step::Completed {
        outcome,
        completion,
    } = last.step
    else {
        panic!("expected completion, got {:?}", last.step);
    };
    assert_eq!((outcome.correct, outcome.incorrect, outcome.total), (2, 0, 2));
    assert_eq!(outcome.score.value(), 100);
    assert_eq!(completion.map(|c| c.score.value()), Some(100));

    assert_eq!(repo.calls(Operation::RecordCompletion), 1);
    let stored = repo.completions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score.value(), 100);
    assert_eq!(stored[0].user_id, USER);
    assert_eq!(repo.progress().len(), 1);

    let view = controller.view();
    assert!(view.question.is_none());
    assert!(view.can_retake);
    assert!(!controller.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn last_answer_is_part_of_the_score() {
    let repo = seeded(four_question_quiz());
    let mut controller = open(&repo).await.unwrap();

    for _ in 0..3 {
        controller.select_choice(1).await.unwrap();
    }
    let last = controller.select_choice(0).await.unwrap();

    let Step::Completed { outcome, .. } = last.step else {
        panic!("expected completion");
    };
    assert_eq!(outcome.correct + outcome.incorrect, 4);
    assert_eq!(outcome.score.value(), 25);
    assert_eq!(repo.completions()[0].score.value(), 25);
}

#[tokio::test(start_paused = true)]
async fn countdown_pauses_on_answer_and_resets_per_question() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();
    assert_eq!(controller.view().countdown, 20);

    sleep(Duration::from_millis(3_200)).await;
    assert_eq!(controller.view().countdown, 17);

    controller.choose(0).unwrap();
    let revealed = controller.view().question.unwrap();
    assert_eq!(revealed.selected, Some(0));
    assert_eq!(revealed.selected_is_correct, Some(true));

    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(controller.view().countdown, 17);

    assert_eq!(controller.settle().await.unwrap(), Step::NextQuestion(1));
    let view = controller.view();
    assert_eq!(view.countdown, 20);
    assert_eq!(view.question_number, 2);

    sleep(Duration::from_millis(2_000)).await;
    assert_eq!(controller.view().countdown, 18);
}

#[tokio::test(start_paused = true)]
async fn expired_countdown_changes_nothing_else() {
    let repo = seeded(true_false_quiz());
    let controller = open(&repo).await.unwrap();

    sleep(Duration::from_secs(30)).await;
    let view = controller.view();
    assert_eq!(view.countdown, 0);
    assert_eq!(view.question_number, 1);
    assert_eq!((view.correct, view.incorrect), (0, 0));
    assert_eq!(repo.calls(Operation::RecordCompletion), 0);
}

#[tokio::test(start_paused = true)]
async fn second_selection_for_same_question_is_rejected() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();

    controller.choose(0).unwrap();
    let err = controller.choose(1).unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Session(QuizSessionError::AlreadyAnswered { question_index: 0 })
    ));

    let view = controller.view();
    assert_eq!((view.correct, view.incorrect), (1, 0));
    assert_eq!(view.question.unwrap().selected, Some(0));
}

#[tokio::test(start_paused = true)]
async fn settle_without_answer_is_an_error() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();
    assert!(matches!(
        controller.settle().await,
        Err(ControllerError::NothingPending)
    ));
}

#[tokio::test(start_paused = true)]
async fn missing_quiz_is_reported() {
    let repo = InMemoryBackend::new();
    let err = open(&repo).await.unwrap_err();
    assert!(matches!(err, ControllerError::QuizNotFound(id) if id == ArticleId::new(ARTICLE)));
}

#[tokio::test(start_paused = true)]
async fn failed_completion_check_opens_the_quiz() {
    let repo = seeded(true_false_quiz());
    store_prior_completion(&repo, 50).await;
    repo.fail(Operation::CheckCompletion);

    let controller = open(&repo).await.unwrap();
    let view = controller.view();
    assert!(!view.already_completed);
    assert!(view.completion.is_none());
    assert!(view.question.is_some());
    assert!(controller.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn prior_completion_locks_until_retake() {
    let repo = seeded(true_false_quiz());
    store_prior_completion(&repo, 50).await;

    let mut controller = open(&repo).await.unwrap();
    let view = controller.view();
    assert!(view.already_completed);
    assert!(view.can_retake);
    assert_eq!(view.completion.map(|c| c.score.value()), Some(50));
    assert!(!controller.is_ticking());
    assert!(matches!(
        controller.choose(0),
        Err(ControllerError::AlreadyCompleted)
    ));

    controller.retake().await.unwrap();
    assert!(repo.completions().is_empty());
    assert!(controller.is_ticking());

    finish_true_false(&mut controller).await;
    let stored = repo.completions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score.value(), 100);
}

#[tokio::test(start_paused = true)]
async fn failed_retake_leaves_finished_attempt_untouched() {
    let repo = seeded(four_question_quiz());
    let mut controller = open(&repo).await.unwrap();
    for choice in [0, 1, 0, 0] {
        controller.select_choice(choice).await.unwrap();
    }
    let before = controller.view();
    assert_eq!(before.outcome.map(|o| o.score.value()), Some(75));

    repo.fail(Operation::DeleteCompletion);
    assert!(matches!(
        controller.retake().await,
        Err(ControllerError::RetakeFailed)
    ));

    assert_eq!(controller.view(), before);
    assert_eq!(repo.completions().len(), 1);
    assert!(!controller.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn retake_replaces_the_stored_record() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();
    controller.select_choice(1).await.unwrap();
    controller.select_choice(0).await.unwrap();
    assert_eq!(repo.completions()[0].score.value(), 0);

    controller.retake().await.unwrap();
    let view = controller.view();
    assert_eq!(view.question_number, 1);
    assert_eq!(view.countdown, 20);
    assert_eq!((view.correct, view.incorrect), (0, 0));
    assert!(view.outcome.is_none());
    assert!(view.completion.is_none());
    assert!(!view.can_retake);

    finish_true_false(&mut controller).await;
    let stored = repo.completions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score.value(), 100);
    assert_eq!(repo.calls(Operation::DeleteCompletion), 1);
}

#[tokio::test(start_paused = true)]
async fn retake_needs_a_stored_completion() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();
    assert!(matches!(
        controller.retake().await,
        Err(ControllerError::NoPriorCompletion)
    ));
}

#[tokio::test(start_paused = true)]
async fn record_failure_still_completes_the_attempt() {
    let repo = seeded(true_false_quiz());
    repo.fail(Operation::RecordCompletion);
    let mut controller = open(&repo).await.unwrap();

    controller.select_choice(0).await.unwrap();
    let last = controller.select_choice(1).await.unwrap();
    let Step::Completed {
        outcome,
        completion,
    } = last.step
    else {
        panic!("expected completion");
    };
    assert_eq!(outcome.score.value(), 100);
    assert!(completion.is_none());
    assert_eq!(repo.progress().len(), 1);
    assert!(!controller.view().can_retake);
}

#[tokio::test(start_paused = true)]
async fn progress_failure_does_not_block_the_record() {
    let repo = seeded(true_false_quiz());
    repo.fail(Operation::RecordProgress);
    let mut controller = open(&repo).await.unwrap();

    finish_true_false(&mut controller).await;
    assert_eq!(repo.completions().len(), 1);
    assert_eq!(repo.calls(Operation::RecordProgress), 1);
    assert!(repo.progress().is_empty());
}

#[tokio::test(start_paused = true)]
async fn closing_mid_attempt_sends_nothing() {
    let repo = seeded(true_false_quiz());
    let mut controller = open(&repo).await.unwrap();
    controller.select_choice(0).await.unwrap();
    controller.choose(1).unwrap();
    controller.close();

    sleep(Duration::from_secs(10)).await;
    assert_eq!(repo.calls(Operation::RecordCompletion), 0);
    assert_eq!(repo.calls(Operation::RecordProgress), 0);
}

#[tokio::test(start_paused = true)]
async fn leaving_after_completion_still_stores_the_result() {
    let repo = seeded(true_false_quiz());
    let mut controller = open_slow(&repo, Duration::from_millis(500)).await;
    controller.select_choice(0).await.unwrap();
    controller.choose(1).unwrap();

    // Past the reveal delay, before the slow store answers.
    sleep(Duration::from_millis(1_600)).await;
    assert_eq!(controller.view().outcome.map(|o| o.score.value()), Some(100));
    assert_eq!(repo.calls(Operation::RecordCompletion), 0);
    controller.close();

    sleep(Duration::from_secs(5)).await;
    let stored = repo.completions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score.value(), 100);
    assert_eq!(repo.progress().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_retake_can_be_retried() {
    let repo = seeded(true_false_quiz());
    store_prior_completion(&repo, 50).await;
    let mut controller = open_slow(&repo, Duration::from_millis(500)).await;

    assert!(
        timeout(Duration::from_millis(100), controller.retake())
            .await
            .is_err()
    );
    let view = controller.view();
    assert!(view.can_retake);
    assert_eq!(view.completion.map(|c| c.score.value()), Some(50));
    assert_eq!(repo.completions().len(), 1);

    controller.retake().await.unwrap();
    assert!(repo.completions().is_empty());
    assert_eq!(repo.calls(Operation::DeleteCompletion), 1);
    assert!(controller.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn app_services_require_a_logged_in_user() {
    let repo = seeded(true_false_quiz());
    let app = AppServices::in_memory(&repo, fixed_clock()).with_timing(QuizTiming::immediate());

    assert!(matches!(
        app.open_quiz(ArticleId::new(ARTICLE)).await,
        Err(ControllerError::Auth(AuthError::NotLoggedIn))
    ));
}
