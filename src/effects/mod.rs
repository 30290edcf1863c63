//! Effect execution: the imperative shell around coalesced reducers.
//!
//! Reducers stay pure. They only declare funks, which the coalescing
//! wrappers park under `pendingEffects`. A runner subscribed to the store
//! turns those descriptors into work after each commit:
//!
//! - **Invocation**: each operation is called synchronously with its args
//! - **Completion**: the returned Stillwater effect runs on a Tokio task
//! - **Feedback**: `Some(event)` is dispatched back into the store
//!
//! Two ways to attach the shell are provided. [`run_funks`] subscribes to a
//! store and reacts to every committed change. [`funk_middleware`] wraps a
//! store and runs funks as part of each `dispatch` made through it.
//!
//! Funks are attempted once. Nothing is retried, and failures are logged
//! rather than converted into events.

mod middleware;
mod runner;

pub use middleware::{funk_middleware, funk_middleware_persistent, FunkMiddleware};
pub use runner::{run_funks, run_funks_persistent};
