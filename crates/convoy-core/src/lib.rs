//! Structured-concurrency task orchestration.
//!
//! A convoy runs a set of independently executing tasks, coordinates their
//! cancellation through a shared [`CancellationToken`], and aggregates
//! their outcomes under one of three policies (run-all, race-first,
//! repeat-until-failure). Tasks can be injected into an orchestration that
//! is already running.
//!
//! # Example
//!
//! ```no_run
//! use convoy_core::{boxed, run, Error, TaskResult};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> TaskResult {
//! let parent = CancellationToken::new();
//!
//! run(
//!     &parent,
//!     [
//!         boxed(|token: CancellationToken| async move {
//!             token.cancelled().await;
//!             Err(Error::Cancelled)
//!         }),
//!         boxed(|_token: CancellationToken| async move {
//!             // do some work, then wind everyone down
//!             Err(Error::other("worker stopped"))
//!         }),
//!     ],
//! )
//! .await
//! # }
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod error;
pub mod task;

mod barrier;
mod convoy;

// Re-export the public surface at the crate root
pub use convoy::{Convoy, Options, race, run};
pub use error::{Error, TaskResult};
pub use task::{BoxedTask, Task, boxed, noop, wait};
