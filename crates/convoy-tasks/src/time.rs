//! Timer tasks.

use std::time::Duration;

use convoy_core::{Error, Task};
use tokio_util::sync::CancellationToken;

/// Returns a task that succeeds once the given duration has passed.
pub fn sleep(duration: Duration) -> impl Task {
    move |token: CancellationToken| async move {
        tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

/// Returns a task that succeeds once the given duration has passed.
/// Alias of [`sleep`], kept so both names read naturally at call sites.
pub fn timer(duration: Duration) -> impl Task {
    sleep(duration)
}

/// Returns a task that fails with [`Error::Elapsed`] once the given
/// duration has passed. Pairing this with a workload turns a `run` into a
/// deadline without the orchestrator special-casing timeouts.
pub fn timeout(duration: Duration) -> impl Task {
    move |token: CancellationToken| async move {
        tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(duration) => Err(Error::Elapsed(duration)),
        }
    }
}
