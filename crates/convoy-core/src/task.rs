//! The task contract.
//!
//! A [`Task`] is a unit of work that executes until it finishes or the
//! cancellation token it was handed is triggered. Any `FnOnce` closure (or
//! `async fn` item) taking a [`CancellationToken`] and returning a
//! [`TaskResult`] future satisfies the contract via the blanket impl, so
//! library factories and ad-hoc closures are interchangeable.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, TaskResult};

/// A unit of work run by a convoy.
///
/// The orchestrator invokes `run` at most once per submission, handing the
/// task the orchestration's derived cancellation token. Tasks are expected
/// to observe the token at their blocking points and return promptly once
/// it is cancelled; cancellation is cooperative and never forced.
#[async_trait]
pub trait Task: Send + 'static {
    async fn run(self: Box<Self>, token: CancellationToken) -> TaskResult;
}

#[async_trait]
impl<F, Fut> Task for F
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    async fn run(self: Box<Self>, token: CancellationToken) -> TaskResult {
        self(token).await
    }
}

/// A type-erased task, as stored and launched by the orchestrator.
pub type BoxedTask = Box<dyn Task>;

/// Erases a concrete task so tasks of different types can share a list.
pub fn boxed(task: impl Task) -> BoxedTask {
    Box::new(task)
}

/// A task that blocks until its token is cancelled, then surfaces the
/// cancellation.
pub async fn wait(token: CancellationToken) -> TaskResult {
    token.cancelled().await;
    Err(Error::Cancelled)
}

/// A task that returns immediately.
pub async fn noop(_token: CancellationToken) -> TaskResult {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_satisfies_contract() {
        let task = boxed(|_token: CancellationToken| async move { Ok(()) });
        assert!(task.run(CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn noop_returns_immediately() {
        let outcome = boxed(noop).run(CancellationToken::new()).await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn wait_surfaces_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let outcome = boxed(wait).run(token).await;
        assert!(outcome.is_err_and(|err| err.is_cancelled()));
    }
}
