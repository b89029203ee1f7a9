//! Error types for convoy orchestrations.

use std::time::Duration;

use thiserror::Error;

/// A shared error type for orchestration misuse, task outcomes, and faults.
///
/// Start-time misuse (`AlreadyRunning`, `AlreadyFinished`, `NoTasks`) is
/// surfaced synchronously by the entry points. Everything else is an
/// outcome produced by a task and aggregated by the orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// A second start attempt while an orchestration is in flight.
    #[error("already running")]
    AlreadyRunning,

    /// A start attempt on a convoy that already completed. Convoys are
    /// one-shot and cannot be restarted.
    #[error("finished execution")]
    AlreadyFinished,

    /// A `run`/`race` start with zero tasks.
    #[error("no tasks to execute")]
    NoTasks,

    /// The task observed cancellation and surfaced it as its outcome.
    #[error("cancelled")]
    Cancelled,

    /// A panic intercepted by the fault barrier, carrying the payload
    /// message and a captured backtrace.
    #[error("caught panic: {message}")]
    Panic { message: String, backtrace: String },

    /// An OS signal fired, carrying the raw signal number.
    #[error("received signal {0}")]
    Signal(i32),

    /// A deadline task's duration expired.
    #[error("deadline elapsed after {0:?}")]
    Elapsed(Duration),

    /// IO error (signal registration and other OS-facing task setup).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An arbitrary caller-defined failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The outcome of a single task execution.
pub type TaskResult = Result<(), Error>;

impl Error {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an `Other` error from a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(anyhow::Error::msg(message.into()))
    }

    /// Converts a caught panic payload into a `Panic` error, capturing a
    /// backtrace at the recovery point.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self::Panic {
            message,
            backtrace: std::backtrace::Backtrace::force_capture().to_string(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Cancelled error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a Panic error
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic { .. })
    }

    /// Check if this is a Signal error
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Signal(_))
    }

    /// Check if this is an Elapsed error
    pub fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }

    /// Check if this error is start-time misuse rather than a task outcome.
    pub fn is_start_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning | Self::AlreadyFinished | Self::NoTasks
        )
    }
}
