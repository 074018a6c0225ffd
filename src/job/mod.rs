//! Asynchronous jobs
//!
//! Every request runs as a job on its own worker thread. A job moves through
//! a small state machine:
//!
//! ```text
//! CREATED -> RUNNING -> (WAITING_FOR_ANSWER <-> RUNNING)* -> FINISHED
//! CANCELLED is reachable from any non-terminal state
//! ```
//!
//! FINISHED and CANCELLED are terminal. An interactive job that hits a
//! destructive step parks in WAITING_FOR_ANSWER behind a condition variable
//! until whoever holds the handle answers (or the optional answer timeout
//! expires); cancellation wakes the same gate. Status reads (state, progress
//! log, plan actions) are safe from any thread at any time.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use crate::error::{ExtmanError, Result};
use crate::executor::{ExecutionObserver, Executor};
use crate::job::question::{ConfirmationPort, NonInteractive, Question};
use crate::plan::{ActionKind, Plan, PlanAction};
use crate::repository::Repository;
use crate::resolver::{Planner, Request};
use crate::store::InstalledStore;

pub mod manager;
pub mod question;

/// Lifecycle states of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Created,
    Running,
    WaitingForAnswer,
    Finished,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Created => "CREATED",
            JobState::Running => "RUNNING",
            JobState::WaitingForAnswer => "WAITING_FOR_ANSWER",
            JobState::Finished => "FINISHED",
            JobState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Everything readable and writable about a job, behind one mutex.
struct JobInner {
    state: JobState,
    log: Vec<String>,
    plan: Option<Plan>,
    error: Option<ExtmanError>,
    question: Option<Question>,
    answer: Option<bool>,
    cancel_requested: bool,
}

struct JobShared {
    inner: Mutex<JobInner>,
    gate: Condvar,
}

/// Thread-safe handle to a job. Cloning is cheap; all clones observe the
/// same job.
#[derive(Clone)]
pub struct JobHandle {
    shared: Arc<JobShared>,
}

impl JobHandle {
    pub(crate) fn new() -> Self {
        JobHandle {
            shared: Arc::new(JobShared {
                inner: Mutex::new(JobInner {
                    state: JobState::Created,
                    log: Vec::new(),
                    plan: None,
                    error: None,
                    question: None,
                    answer: None,
                    cancel_requested: false,
                }),
                gate: Condvar::new(),
            }),
        }
    }

    // A poisoned job mutex means a worker panicked mid-update; the data is
    // still the best available answer, so readers recover the guard.
    fn lock(&self) -> MutexGuard<'_, JobInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    /// Snapshot of the progress log so far.
    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    /// The pending question, when the job is in WAITING_FOR_ANSWER.
    pub fn question(&self) -> Option<Question> {
        self.lock().question.clone()
    }

    /// Answer the pending question and resume the worker. Fails when no
    /// question is pending.
    pub fn answer(&self, answer: bool) -> Result<()> {
        let mut inner = self.lock();
        if inner.state != JobState::WaitingForAnswer || inner.question.is_none() {
            return Err(ExtmanError::IoError {
                message: "no question is pending on this job".to_string(),
            });
        }
        inner.answer = Some(answer);
        drop(inner);
        self.shared.gate.notify_all();
        Ok(())
    }

    /// Request cancellation. Terminal states are unaffected; a job parked on
    /// a question is woken, a running job stops at its next checkpoint.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if !inner.state.is_terminal() {
            inner.cancel_requested = true;
        }
        drop(inner);
        self.shared.gate.notify_all();
    }

    /// The plan's flattened actions, once planning has completed. While the
    /// job is still running the list is recomputed per call; after FINISHED
    /// it is served from the frozen cache.
    pub fn actions(&self) -> Option<Vec<PlanAction>> {
        self.lock().plan.as_ref().map(Plan::actions)
    }

    /// Block until the job reaches a terminal state.
    pub fn wait(&self) -> JobState {
        let mut inner = self.lock();
        while !inner.state.is_terminal() {
            inner = self
                .shared
                .gate
                .wait(inner)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        inner.state
    }

    /// Take the job's error, if it failed. Consuming, so the caller owns the
    /// diagnostic.
    pub fn take_error(&self) -> Option<ExtmanError> {
        self.lock().error.take()
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_ref().map(ToString::to_string)
    }

    // ---- worker side -----------------------------------------------------

    /// Run a request to completion on the current thread. Called by the
    /// manager's worker thread.
    pub(crate) fn run(
        &self,
        request: &Request,
        repository: &dyn Repository,
        store: &dyn InstalledStore,
        question_timeout: Option<Duration>,
    ) {
        self.transition(JobState::Running);
        self.push_log(format!("Starting job: {}", request.describe()));

        let outcome = self.run_inner(request, repository, store, question_timeout);
        self.finish(outcome);
    }

    fn run_inner(
        &self,
        request: &Request,
        repository: &dyn Repository,
        store: &dyn InstalledStore,
        question_timeout: Option<Duration>,
    ) -> Result<()> {
        let gate = AnswerGate {
            handle: self,
            timeout: question_timeout,
        };
        let non_interactive = NonInteractive;
        let confirmation: &dyn ConfirmationPort = if request.interactive() {
            &gate
        } else {
            &non_interactive
        };

        let plan = Planner::new(repository, store, confirmation).plan(request)?;
        self.check_cancelled()?;

        let actions = plan.actions();
        let effective = actions
            .iter()
            .filter(|a| a.kind != ActionKind::None)
            .count();
        self.push_log(format!(
            "Planned {} action(s), {} to apply",
            actions.len(),
            effective
        ));
        self.set_plan(plan.clone());

        let summary = Executor::new(repository, store).execute(&plan, self)?;
        self.push_log(format!(
            "Applied {} action(s), skipped {}",
            summary.applied, summary.skipped
        ));

        Ok(())
    }

    /// Park in WAITING_FOR_ANSWER until answered, cancelled, or timed out.
    fn ask(&self, question: Question, timeout: Option<Duration>) -> Result<bool> {
        let prompt = question.prompt.clone();

        let mut inner = self.lock();
        if inner.cancel_requested {
            return Err(ExtmanError::Cancelled);
        }
        inner.question = Some(question);
        inner.answer = None;
        inner.state = JobState::WaitingForAnswer;
        drop(inner);
        self.shared.gate.notify_all();

        let mut inner = self.lock();
        loop {
            if inner.cancel_requested {
                inner.question = None;
                return Err(ExtmanError::Cancelled);
            }
            if let Some(answer) = inner.answer.take() {
                inner.question = None;
                inner.state = JobState::Running;
                return Ok(answer);
            }

            match timeout {
                Some(duration) => {
                    let (guard, result) = self
                        .shared
                        .gate
                        .wait_timeout(inner, duration)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    inner = guard;
                    if result.timed_out() && inner.answer.is_none() {
                        inner.question = None;
                        inner.state = JobState::Running;
                        return Err(ExtmanError::AnswerTimeout { prompt });
                    }
                }
                None => {
                    inner = self
                        .shared
                        .gate
                        .wait(inner)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                }
            }
        }
    }

    fn transition(&self, state: JobState) {
        let mut inner = self.lock();
        if !inner.state.is_terminal() {
            inner.state = state;
        }
        drop(inner);
        self.shared.gate.notify_all();
    }

    fn set_plan(&self, plan: Plan) {
        self.lock().plan = Some(plan);
    }

    fn push_log(&self, message: String) {
        self.lock().log.push(message);
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.lock().cancel_requested {
            return Err(ExtmanError::Cancelled);
        }
        Ok(())
    }

    /// Enter a terminal state: CANCELLED when cancellation won the race,
    /// FINISHED otherwise, with the error (if any) attached to the status.
    /// The plan's action cache is frozen here and never recomputed again.
    fn finish(&self, outcome: Result<()>) {
        let mut inner = self.lock();

        let cancelled =
            inner.cancel_requested || matches!(outcome, Err(ExtmanError::Cancelled));

        if let Some(plan) = inner.plan.as_mut() {
            plan.freeze();
        }

        inner.state = if cancelled {
            JobState::Cancelled
        } else {
            JobState::Finished
        };

        match outcome {
            Ok(()) if !cancelled => inner.log.push("Job finished".to_string()),
            Ok(()) => inner.log.push("Job cancelled".to_string()),
            Err(e) => {
                inner.log.push(format!("Job failed: {e}"));
                if !matches!(e, ExtmanError::Cancelled) {
                    inner.error = Some(e);
                }
            }
        }

        drop(inner);
        self.shared.gate.notify_all();
    }
}

impl ExecutionObserver for JobHandle {
    fn log(&self, message: String) {
        self.push_log(message);
    }

    fn cancelled(&self) -> bool {
        self.lock().cancel_requested
    }
}

/// Confirmation port that routes questions through the job's answer gate.
struct AnswerGate<'a> {
    handle: &'a JobHandle,
    timeout: Option<Duration>,
}

impl ConfirmationPort for AnswerGate<'_> {
    fn confirm(&self, question: Question) -> Result<bool> {
        self.handle.ask(question, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionId;
    use crate::version::Version;
    use std::thread;

    #[test]
    fn test_state_display_matches_protocol_names() {
        assert_eq!(JobState::WaitingForAnswer.to_string(), "WAITING_FOR_ANSWER");
        assert_eq!(JobState::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Finished.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Created.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::WaitingForAnswer.is_terminal());
    }

    #[test]
    fn test_answer_without_pending_question_fails() {
        let handle = JobHandle::new();
        assert!(handle.answer(true).is_err());
    }

    #[test]
    fn test_ask_blocks_until_answered() {
        let handle = JobHandle::new();
        handle.transition(JobState::Running);

        let worker = handle.clone();
        let asked = thread::spawn(move || {
            let question = Question::cascade_removal(
                "core",
                "main",
                vec![ExtensionId::new("editor", Version::new("1.0"))],
            );
            worker.ask(question, None)
        });

        // Wait for the worker to park on the gate
        while handle.state() != JobState::WaitingForAnswer {
            thread::yield_now();
        }
        assert!(handle.question().is_some());

        handle.answer(true).unwrap();
        assert!(asked.join().unwrap().unwrap());
        assert_eq!(handle.state(), JobState::Running);
        assert!(handle.question().is_none());
    }

    #[test]
    fn test_cancel_wakes_parked_question() {
        let handle = JobHandle::new();
        handle.transition(JobState::Running);

        let worker = handle.clone();
        let asked = thread::spawn(move || {
            let question = Question::cascade_removal("core", "main", vec![]);
            worker.ask(question, None)
        });

        while handle.state() != JobState::WaitingForAnswer {
            thread::yield_now();
        }

        handle.cancel();
        assert!(matches!(
            asked.join().unwrap(),
            Err(ExtmanError::Cancelled)
        ));
    }

    #[test]
    fn test_ask_times_out() {
        let handle = JobHandle::new();
        handle.transition(JobState::Running);

        let question = Question::cascade_removal("core", "main", vec![]);
        let result = handle.ask(question, Some(Duration::from_millis(20)));

        assert!(matches!(result, Err(ExtmanError::AnswerTimeout { .. })));
        assert_eq!(handle.state(), JobState::Running);
        assert!(handle.question().is_none());
    }

    #[test]
    fn test_cancel_after_finish_is_ignored() {
        let handle = JobHandle::new();
        handle.transition(JobState::Running);
        handle.finish(Ok(()));
        assert_eq!(handle.state(), JobState::Finished);

        handle.cancel();
        assert_eq!(handle.state(), JobState::Finished);
    }

    #[test]
    fn test_finish_with_error_records_it() {
        let handle = JobHandle::new();
        handle.transition(JobState::Running);
        handle.finish(Err(ExtmanError::NotInstalled {
            name: "ghost".to_string(),
            namespace: "main".to_string(),
        }));

        assert_eq!(handle.state(), JobState::Finished);
        assert!(handle.error_message().unwrap().contains("ghost"));
        assert!(handle.take_error().is_some());
        // Consuming read
        assert!(handle.take_error().is_none());
    }

    #[test]
    fn test_cancellation_wins_over_outcome() {
        let handle = JobHandle::new();
        handle.transition(JobState::Running);
        handle.cancel();
        handle.finish(Ok(()));
        assert_eq!(handle.state(), JobState::Cancelled);
    }

    #[test]
    fn test_wait_returns_terminal_state() {
        let handle = JobHandle::new();
        let worker = handle.clone();
        let waiter = thread::spawn(move || worker.wait());

        handle.transition(JobState::Running);
        handle.finish(Ok(()));

        assert_eq!(waiter.join().unwrap(), JobState::Finished);
    }
}
