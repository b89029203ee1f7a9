//! OS signal tasks (Unix only).

use convoy_core::{Error, Task};
use futures::future;
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio_util::sync::CancellationToken;

/// Returns a task that blocks until one of the given signals fires, then
/// fails with [`Error::Signal`] carrying the raw signal number.
///
/// Registration happens when the task starts, not when the factory is
/// called; a registration failure surfaces as [`Error::Io`]. With an empty
/// signal set the task simply waits for cancellation.
pub fn signal(kinds: impl IntoIterator<Item = SignalKind>) -> impl Task {
    let kinds: Vec<SignalKind> = kinds.into_iter().collect();
    move |token: CancellationToken| async move {
        let mut streams = Vec::with_capacity(kinds.len());
        for kind in kinds {
            streams.push((kind, unix_signal(kind)?));
        }

        if streams.is_empty() {
            token.cancelled().await;
            return Err(Error::Cancelled);
        }

        let waiters = streams
            .iter_mut()
            .map(|(kind, stream)| {
                Box::pin(async move {
                    stream.recv().await;
                    *kind
                })
            })
            .collect::<Vec<_>>();

        tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            (kind, _, _) = future::select_all(waiters) => {
                tracing::debug!(signal = kind.as_raw_value(), "signal received");
                Err(Error::Signal(kind.as_raw_value()))
            }
        }
    }
}

/// Returns a task that blocks until a terminate-style signal: SIGTERM
/// (kill default), SIGINT (ctrl+c), or SIGHUP (common kill signal).
pub fn interrupt() -> impl Task {
    signal([
        SignalKind::terminate(),
        SignalKind::interrupt(),
        SignalKind::hangup(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::boxed;

    #[tokio::test]
    async fn signal_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let outcome = boxed(signal([SignalKind::user_defined1()]))
            .run(token)
            .await;
        assert!(outcome.is_err_and(|err| err.is_cancelled()));
    }

    #[tokio::test]
    async fn empty_signal_set_waits_for_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let outcome = boxed(signal([])).run(token).await;
        assert!(outcome.is_err_and(|err| err.is_cancelled()));
    }

    #[tokio::test]
    async fn interrupt_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let outcome = boxed(interrupt()).run(token).await;
        assert!(outcome.is_err_and(|err| err.is_cancelled()));
    }
}
