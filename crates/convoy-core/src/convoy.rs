//! The orchestration state machine.
//!
//! A [`Convoy`] coordinates a set of tasks under one of three aggregation
//! policies:
//!
//! - [`run`](Convoy::run): wait for every task; resolve to the first
//!   failure (siblings are cancelled as soon as any task fails), or `Ok`
//!   if all succeed.
//! - [`race`](Convoy::race): resolve to the first reported outcome,
//!   success or failure, and cancel everyone else immediately.
//! - [`repeat`](Convoy::repeat): keep running (and accepting) tasks until
//!   a failure is recorded; a success-only drain never ends it.
//!
//! Each start derives a child [`CancellationToken`] from the caller's
//! parent, so cancelling the parent winds the whole orchestration down
//! while the convoy's own trigger stays contained. Every piece of mutable
//! state lives behind one mutex; admission, injection, and reporting all
//! serialize on it, which is what makes the final result delivery
//! exactly-once no matter how many tasks report concurrently.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::barrier;
use crate::error::{Error, TaskResult};
use crate::task::{self, BoxedTask, Task};

/// Lifecycle of a convoy. Transitions only ever move forward:
/// `Idle -> {Run|Race|Repeat} -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Run,
    Race,
    Repeat,
    Finished,
}

/// Per-instance configuration, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Convert panics inside tasks into [`Error::Panic`] outcomes. Disable
    /// only for debugging: an uncaught panic kills its runtime task without
    /// reporting, so the orchestration may never complete.
    pub catch_panics: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { catch_panics: true }
    }
}

/// The orchestrator handle.
///
/// Cloning is cheap and shares the underlying state, so a task can hold a
/// clone and [`add`](Convoy::add) siblings while the orchestration is in
/// flight. Each instance can be started at most once.
#[derive(Clone)]
pub struct Convoy {
    shared: Arc<Shared>,
}

struct Shared {
    catch_panics: bool,
    state: Mutex<State>,
}

struct State {
    mode: Mode,
    /// Tasks accepted before the first start. Drained on start.
    pending: Vec<BoxedTask>,
    /// Tasks launched but not yet reported.
    outstanding: usize,
    /// True until the first report in race mode.
    first: bool,
    /// The recorded failure. `None` means success-so-far.
    failure: Option<Error>,
    /// The derived child token. Set once at start, immutable afterwards.
    cancel: Option<CancellationToken>,
    /// One-shot completion slot, taken exactly once under the lock.
    done: Option<oneshot::Sender<TaskResult>>,
}

impl Convoy {
    /// Creates an empty convoy with default options.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Creates an empty convoy with the given options.
    pub fn with_options(options: Options) -> Self {
        Self {
            shared: Arc::new(Shared {
                catch_panics: options.catch_panics,
                state: Mutex::new(State {
                    mode: Mode::Idle,
                    pending: Vec::new(),
                    outstanding: 0,
                    first: true,
                    failure: None,
                    cancel: None,
                    done: None,
                }),
            }),
        }
    }

    /// Creates a convoy pre-loaded with the given tasks.
    pub fn with_tasks(tasks: impl IntoIterator<Item = BoxedTask>) -> Self {
        let convoy = Self::new();
        convoy.extend(tasks);
        convoy
    }

    /// Adds a task.
    ///
    /// Before the first start the task is queued. Once the convoy is live
    /// it launches immediately against the current derived token. If the
    /// orchestration already finished that token is already cancelled, so
    /// late tasks observe cancellation at their first check and their
    /// outcomes are discarded.
    pub fn add(&self, task: impl Task) {
        self.submit(vec![task::boxed(task)]);
    }

    /// Adds every task in the iterator. Same semantics as [`add`](Self::add).
    pub fn extend(&self, tasks: impl IntoIterator<Item = BoxedTask>) {
        self.submit(tasks.into_iter().collect());
    }

    /// Runs all tasks to completion and returns the first failure, or `Ok`
    /// if every task succeeded. Any failure cancels the remaining tasks
    /// early.
    pub async fn run(&self, parent: &CancellationToken) -> TaskResult {
        self.launch(parent, Mode::Run).await
    }

    /// Returns the first reported outcome, success or failure, cancelling
    /// every other task as soon as it lands.
    pub async fn race(&self, parent: &CancellationToken) -> TaskResult {
        self.launch(parent, Mode::Race).await
    }

    /// Runs tasks until a failure is recorded. Succeeding tasks drain
    /// without ending the orchestration; a synthetic task waiting on the
    /// derived token guarantees there is always something to fail once
    /// cancellation is requested.
    pub async fn repeat(&self, parent: &CancellationToken) -> TaskResult {
        self.launch(parent, Mode::Repeat).await
    }

    /// Shared admission routine for the three entry points.
    async fn launch(&self, parent: &CancellationToken, mode: Mode) -> TaskResult {
        let (cancel, done) = {
            let mut state = self.shared.lock_state();

            match state.mode {
                Mode::Idle => {}
                Mode::Finished => return Err(Error::AlreadyFinished),
                _ => return Err(Error::AlreadyRunning),
            }

            let mut tasks = std::mem::take(&mut state.pending);

            if mode == Mode::Repeat {
                // Hold the convoy open until cancellation even if every
                // real task drains successfully.
                tasks.push(task::boxed(task::wait));
            }

            if tasks.is_empty() {
                // Undefined to run with no tasks; refuse before committing
                // any state so the instance stays startable.
                return Err(Error::NoTasks);
            }

            let cancel = parent.child_token();
            let (tx, rx) = oneshot::channel();

            state.mode = mode;
            state.outstanding = tasks.len();
            state.first = true;
            state.cancel = Some(cancel.clone());
            state.done = Some(tx);

            tracing::debug!(?mode, tasks = state.outstanding, "convoy started");

            for task in tasks {
                self.spawn(task, cancel.clone());
            }

            (cancel, rx)
        };

        let outcome = match done.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::other("completion slot dropped before delivery")),
        };

        cancel.cancel();
        outcome
    }

    /// Applies a batch of submitted tasks to the state machine. Shares the
    /// lock with `report` so admission and reporting cannot interleave.
    fn submit(&self, tasks: Vec<BoxedTask>) {
        let mut state = self.shared.lock_state();

        if state.mode == Mode::Idle {
            state.pending.extend(tasks);
            return;
        }

        // The token is always set once the convoy is live. Obtain it
        // before touching the count so a refused submission cannot leave
        // `outstanding` inflated.
        let cancel = match &state.cancel {
            Some(cancel) => cancel.clone(),
            None => return,
        };

        state.outstanding += tasks.len();

        tracing::trace!(tasks = tasks.len(), "tasks injected into live convoy");

        for task in tasks {
            self.spawn(task, cancel.clone());
        }
    }

    fn spawn(&self, task: BoxedTask, cancel: CancellationToken) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = barrier::shield(task, cancel, shared.catch_panics).await;
            shared.report(outcome);
        });
    }
}

impl Default for Convoy {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invoked exactly once per launched task, with its outcome.
    fn report(&self, outcome: TaskResult) {
        let mut state = self.lock_state();

        state.outstanding -= 1;

        match state.mode {
            Mode::Run | Mode::Repeat => {
                let failed = outcome.is_err();

                if state.failure.is_none() {
                    state.failure = outcome.err();
                }

                // Wind siblings down as soon as anything fails. The
                // recorded failure stays the first one observed: an early
                // success never masks a later failure.
                if failed {
                    if let Some(cancel) = &state.cancel {
                        cancel.cancel();
                    }
                }
            }
            Mode::Race => {
                if state.first {
                    state.failure = outcome.err();
                    state.first = false;
                }

                // The first report ends the race, success or not.
                if let Some(cancel) = &state.cancel {
                    cancel.cancel();
                }
            }
            // A task added after completion; its outcome is discarded.
            Mode::Finished => return,
            // Tasks only launch once the convoy is live.
            Mode::Idle => return,
        }

        tracing::trace!(outstanding = state.outstanding, "task reported");

        if state.outstanding > 0 {
            return;
        }

        // Repeat only ends once a failure has been recorded.
        if state.mode == Mode::Repeat && state.failure.is_none() {
            return;
        }

        state.mode = Mode::Finished;

        let outcome = match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        };

        tracing::debug!(ok = outcome.is_ok(), "convoy finished");

        // The Finished gate above plus the lock make this send happen
        // exactly once per lifetime.
        if let Some(done) = state.done.take() {
            let _ = done.send(outcome);
        }
    }
}

/// Runs the given tasks on a fresh convoy, returning the first failure and
/// cancelling any remaining tasks.
pub async fn run(
    parent: &CancellationToken,
    tasks: impl IntoIterator<Item = BoxedTask>,
) -> TaskResult {
    Convoy::with_tasks(tasks).run(parent).await
}

/// Races the given tasks on a fresh convoy, returning the first reported
/// outcome and cancelling the rest.
pub async fn race(
    parent: &CancellationToken,
    tasks: impl IntoIterator<Item = BoxedTask>,
) -> TaskResult {
    Convoy::with_tasks(tasks).race(parent).await
}
