use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use backend::QuizCatalog;
use quiz_core::model::{ArticleId, QuizCompletion, QuizId, UserContext, UserId};
use quiz_core::{Advance, Optimistic, QuizOutcome, QuizSession, QuizSessionError, Selection};
use tracing::{debug, info, warn};

use crate::completion_service::CompletionService;
use crate::error::ControllerError;
use crate::progress_service::ProgressService;
use crate::schedule::ScheduledTask;

use super::timing::QuizTiming;
use super::view::{ChoiceResult, QuizView, Step};

/// Collaborators a quiz screen talks to.
#[derive(Clone)]
pub struct QuizServices {
    pub catalog: Arc<dyn QuizCatalog>,
    pub completions: CompletionService,
    pub progress: ProgressService,
}

/// State shared with the ticker and the pending advance.
struct Shared {
    session: QuizSession,
    /// Last stored completion for this (user, article).
    completion: Optimistic<Option<QuizCompletion>>,
    last_step: Option<Result<Step, QuizSessionError>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // Critical sections never panic midway, so a poisoned state is still consistent.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs once the feedback delay is over.
///
/// Aborting this task before `advance` runs discards the answer's effect on
/// progression only. Once the attempt is completed, persistence moves to a
/// detached task so leaving the screen cannot lose the record.
fn advance_task(
    shared: Arc<Mutex<Shared>>,
    completions: CompletionService,
    progress: ProgressService,
    user_id: UserId,
) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let (advanced, quiz_id, article_id) = {
            let mut state = lock(&shared);
            let advanced = state.session.advance();
            let quiz = state.session.quiz();
            (advanced, quiz.id(), quiz.article_id())
        };

        match advanced {
            Ok(Advance::NextQuestion(index)) => {
                lock(&shared).last_step = Some(Ok(Step::NextQuestion(index)));
            }
            Ok(Advance::Completed(outcome)) => {
                info!(
                    %user_id,
                    %quiz_id,
                    score = %outcome.score,
                    correct = outcome.correct,
                    total = outcome.total,
                    "quiz completed"
                );
                let persist = tokio::spawn(persist_completion(
                    Arc::clone(&shared),
                    completions,
                    progress,
                    CompletedAttempt {
                        user_id,
                        quiz_id,
                        article_id,
                        outcome,
                    },
                ));
                // Dropping the handle detaches the task; it is never aborted.
                if let Err(e) = persist.await {
                    warn!(%quiz_id, error = %e, "completion task did not finish");
                }
            }
            Err(e) => {
                warn!(%quiz_id, error = %e, "advance rejected");
                lock(&shared).last_step = Some(Err(e));
            }
        }
    }
}

struct CompletedAttempt {
    user_id: UserId,
    quiz_id: QuizId,
    article_id: ArticleId,
    outcome: QuizOutcome,
}

/// Store the record and award the point concurrently; neither failure blocks the other.
async fn persist_completion(
    shared: Arc<Mutex<Shared>>,
    completions: CompletionService,
    progress: ProgressService,
    attempt: CompletedAttempt,
) {
    let CompletedAttempt {
        user_id,
        quiz_id,
        article_id,
        outcome,
    } = attempt;
    let (completion, ()) = tokio::join!(
        completions.record_completion(user_id, quiz_id, article_id, outcome.score),
        progress.award_quiz_point(user_id),
    );

    let mut state = lock(&shared);
    if let Some(stored) = &completion {
        state.completion.reset(Some(stored.clone()));
    }
    state.last_step = Some(Ok(Step::Completed {
        outcome,
        completion,
    }));
}

/// Hides the stored completion while its delete is in flight and puts it
/// back unless `confirm` is reached, including when the retake future is
/// dropped midway.
struct PendingRetake {
    shared: Arc<Mutex<Shared>>,
    settled: bool,
}

impl PendingRetake {
    fn stage(shared: &Arc<Mutex<Shared>>) -> Result<(Self, QuizCompletion), ControllerError> {
        let mut state = lock(shared);
        let prior = state
            .completion
            .current()
            .clone()
            .ok_or(ControllerError::NoPriorCompletion)?;
        state.completion.apply(|completion| *completion = None)?;
        let guard = Self {
            shared: Arc::clone(shared),
            settled: false,
        };
        Ok((guard, prior))
    }

    /// Commit the hidden state and restart the attempt in one critical section.
    fn confirm(mut self) {
        let mut state = lock(&self.shared);
        state.completion.confirm();
        state.session.restart();
        state.last_step = None;
        drop(state);
        self.settled = true;
    }
}

impl Drop for PendingRetake {
    fn drop(&mut self) {
        if !self.settled {
            lock(&self.shared).completion.rollback();
        }
    }
}

/// Drives one quiz attempt for one respondent.
///
/// Owns the session, the per-question countdown ticker and the delayed
/// advance after each answer. Dropping the controller stops both timers and
/// sends nothing for an unfinished attempt.
pub struct QuizController {
    user: UserContext,
    timing: QuizTiming,
    services: QuizServices,
    shared: Arc<Mutex<Shared>>,
    /// Set while a stored completion exists and no retake has started.
    locked: bool,
    ticker: Option<ScheduledTask>,
    pending_advance: Option<ScheduledTask>,
}

impl QuizController {
    /// Load the quiz attached to `article_id` and start an attempt.
    ///
    /// If the respondent already completed it, the attempt stays locked
    /// until `retake`.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::QuizNotFound` if the article has no quiz,
    /// `ControllerError::Backend` if the quiz cannot be loaded, or
    /// `ControllerError::Session` if it has no questions.
    pub async fn open(
        services: QuizServices,
        user: UserContext,
        article_id: ArticleId,
        timing: QuizTiming,
    ) -> Result<Self, ControllerError> {
        let quiz = services
            .catalog
            .quiz_for_article(article_id)
            .await?
            .ok_or(ControllerError::QuizNotFound(article_id))?;
        let status = services
            .completions
            .check_completion(user.user_id(), article_id)
            .await;
        let session = QuizSession::start_with_countdown(quiz, timing.question_seconds)?;

        let locked = status.completion.is_some();
        info!(
            user_id = %user.user_id(),
            %article_id,
            quiz_id = %session.quiz().id(),
            questions = session.total_questions(),
            already_completed = locked,
            "quiz opened"
        );

        let mut controller = Self {
            user,
            timing,
            services,
            shared: Arc::new(Mutex::new(Shared {
                session,
                completion: Optimistic::new(status.completion),
                last_step: None,
            })),
            locked,
            ticker: None,
            pending_advance: None,
        };
        if !locked {
            controller.start_ticker();
        }
        Ok(controller)
    }

    // ─── ANSWERING ────────────────────────────────────────────────────────────

    /// Select a choice, wait for the feedback delay, then move on.
    ///
    /// # Errors
    ///
    /// Returns the same errors as `choose`; the session is unchanged on error.
    pub async fn select_choice(
        &mut self,
        choice_index: usize,
    ) -> Result<ChoiceResult, ControllerError> {
        let selection = self.choose(choice_index)?;
        let step = self.settle().await?;
        Ok(ChoiceResult { selection, step })
    }

    /// Record the choice right away and schedule the advance.
    ///
    /// Use `settle` to wait for the advance; until then `view` shows the
    /// revealed answer.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::AlreadyCompleted` while a stored completion
    /// locks the quiz, or `ControllerError::Session` for a rejected selection.
    pub fn choose(&mut self, choice_index: usize) -> Result<Selection, ControllerError> {
        if self.locked {
            return Err(ControllerError::AlreadyCompleted);
        }
        let selection = {
            let mut shared = lock(&self.shared);
            let selection = shared.session.select_choice(choice_index)?;
            shared.last_step = None;
            selection
        };
        debug!(
            question = selection.question_index,
            choice = selection.choice_index,
            correct = selection.is_correct,
            "choice selected"
        );

        let advance = advance_task(
            Arc::clone(&self.shared),
            self.services.completions.clone(),
            self.services.progress.clone(),
            self.user.user_id(),
        );
        self.pending_advance = Some(ScheduledTask::after(self.timing.reveal_delay, advance));
        Ok(selection)
    }

    /// Wait for the scheduled advance and report where the attempt stands.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::NothingPending` if no answer was chosen
    /// since the last settle.
    pub async fn settle(&mut self) -> Result<Step, ControllerError> {
        if let Some(task) = self.pending_advance.as_mut() {
            task.join().await;
        }
        self.pending_advance = None;

        let (step, complete) = {
            let mut shared = lock(&self.shared);
            (shared.last_step.take(), shared.session.is_complete())
        };
        if complete {
            self.stop_ticker();
        }
        step.ok_or(ControllerError::NothingPending)?
            .map_err(ControllerError::from)
    }

    // ─── RETAKE ───────────────────────────────────────────────────────────────

    /// Delete the stored completion and start over.
    ///
    /// The record is hidden locally first and restored if the backend refuses
    /// the delete or the call is dropped before it answers; the finished
    /// attempt is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `NoPriorCompletion` without a stored record, `RetakePending`
    /// if a retake is in flight, or `RetakeFailed` if the delete failed.
    pub async fn retake(&mut self) -> Result<(), ControllerError> {
        let (pending, prior) = PendingRetake::stage(&self.shared)?;

        if !self.services.completions.delete_completion(prior.id).await {
            drop(pending);
            warn!(completion_id = %prior.id, "retake aborted; previous completion kept");
            return Err(ControllerError::RetakeFailed);
        }

        if let Some(mut task) = self.pending_advance.take() {
            task.cancel();
        }
        pending.confirm();
        self.locked = false;
        self.start_ticker();
        info!(
            user_id = %self.user.user_id(),
            completion_id = %prior.id,
            "quiz retake started"
        );
        Ok(())
    }

    // ─── LIFECYCLE ────────────────────────────────────────────────────────────

    fn start_ticker(&mut self) {
        let shared = Arc::clone(&self.shared);
        self.ticker = Some(ScheduledTask::every(self.timing.tick, move || {
            let mut state = lock(&shared);
            if state.session.is_complete() {
                return ControlFlow::Break(());
            }
            state.session.tick();
            ControlFlow::Continue(())
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    /// Leave the screen. Timers stop and an unfinished attempt is discarded;
    /// a completed attempt that is still being saved keeps saving.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_ticker();
        if let Some(mut task) = self.pending_advance.take() {
            task.cancel();
        }
    }

    // ─── QUERIES ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn user(&self) -> UserContext {
        self.user
    }

    #[must_use]
    pub fn timing(&self) -> QuizTiming {
        self.timing
    }

    /// True while the countdown ticker is running.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(ScheduledTask::is_active)
    }

    #[must_use]
    pub fn view(&self) -> QuizView {
        let shared = lock(&self.shared);
        let session = &shared.session;
        let quiz = session.quiz();
        let completion = shared.completion.current().clone();
        let can_retake = completion.is_some()
            && !shared.completion.is_pending()
            && (self.locked || session.is_complete());

        QuizView {
            quiz_id: quiz.id(),
            article_id: quiz.article_id(),
            title: quiz.title().to_owned(),
            description: quiz.description().map(str::to_owned),
            question: if self.locked {
                None
            } else {
                session.current_question()
            },
            question_number: session.question_index() + 1,
            total_questions: session.total_questions(),
            countdown: session.countdown(),
            correct: session.correct(),
            incorrect: session.incorrect(),
            outcome: session.outcome(),
            completion,
            already_completed: self.locked,
            can_retake,
        }
    }
}

impl Drop for QuizController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for QuizController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizController")
            .field("user", &self.user)
            .field("timing", &self.timing)
            .field("locked", &self.locked)
            .field("ticking", &self.is_ticking())
            .field("advance_pending", &self.pending_advance.is_some())
            .finish_non_exhaustive()
    }
}
