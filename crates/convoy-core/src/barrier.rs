//! Fault containment around task execution.
//!
//! Every launched task runs behind this barrier. With `catch_panics` set
//! (the default), a panic inside the task is converted into
//! [`Error::Panic`](crate::Error::Panic) so the orchestration can aggregate
//! it like any other failure instead of losing the task silently. With it
//! unset the panic unwinds the spawned runtime task unmodified, which can
//! leave the orchestration incomplete; that mode exists for debugging only.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, TaskResult};
use crate::task::BoxedTask;

pub(crate) async fn shield(
    task: BoxedTask,
    token: CancellationToken,
    catch_panics: bool,
) -> TaskResult {
    if !catch_panics {
        return task.run(token).await;
    }

    match AssertUnwindSafe(task.run(token)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(Error::from_panic(payload)),
    }
}
