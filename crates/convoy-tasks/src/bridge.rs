//! Cancellation-token bridge.

use convoy_core::{Error, Task};
use tokio_util::sync::CancellationToken;

/// Returns a task that waits on the given token as well as its own, so a
/// convoy can be wound down by a cancellation signal from outside its own
/// parent chain.
pub fn bridge(other: CancellationToken) -> impl Task {
    move |token: CancellationToken| async move {
        tokio::select! {
            _ = other.cancelled() => Err(Error::Cancelled),
            _ = token.cancelled() => Err(Error::Cancelled),
        }
    }
}
