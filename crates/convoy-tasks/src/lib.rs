//! Pre-built tasks for convoy orchestrations.
//!
//! Every factory here returns an `impl Task` that observes its
//! cancellation token at each blocking point, so they compose with
//! user-defined tasks under any of the orchestration policies. A typical
//! server loop races its workload against [`interrupt`] and a shutdown
//! [`bridge`], whichever fires first winds the rest down.

mod bridge;
#[cfg(unix)]
mod signal;
mod time;

pub use bridge::bridge;
#[cfg(unix)]
pub use signal::{interrupt, signal};
pub use time::{sleep, timeout, timer};

// Primitive tasks from the core, re-exported for completeness.
pub use convoy_core::{noop, wait};
