//! Funks: declarative side effects for pure reducers
//!
//! Funks is built on Stillwater's "pure core, imperative shell" philosophy.
//! A reducer stays a pure function of `(state, event)`. When it wants I/O to
//! happen it declares a *funk*, an operation plus its arguments, against the
//! event it is processing. A coalescing wrapper harvests those declarations
//! into the emitted state, and a runner executes them after the state has
//! been committed, dispatching whatever events they resolve to.
//!
//! # Core Concepts
//!
//! - **Funk**: Immutable effect descriptor via [`Funk`] and [`Operation`]
//! - **Channel**: Hidden per-event accumulator written by [`declare`]
//! - **Coalescing**: [`coalesce`] and [`coalesce_persistent`] surface funks
//!   under `pendingEffects`
//! - **Runner**: [`run_funks`] and [`run_funks_persistent`] execute them
//!   from a subscription, [`funk_middleware`] from `dispatch`
//!
//! # Example
//!
//! ```rust
//! use funks::{coalesce, declare, Funk, MemoryStore, Operation, Record, Store};
//! use serde_json::json;
//! use std::convert::Infallible;
//! use stillwater::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Action {
//!     First,
//!     Second { payload: String },
//! }
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Doc {
//!     text: String,
//! }
//!
//! let async_op: Operation<Action> = Operation::new("async_op", |_| {
//!     pure(Some(Action::Second { payload: "new payload".into() })).boxed()
//! });
//!
//! let store: MemoryStore<Record<Doc, Action>, Action> =
//!     MemoryStore::new(coalesce(move |_doc: Doc, action: &Action| {
//!         Ok::<_, Infallible>(match action {
//!             Action::First => {
//!                 declare(action, Funk::new(async_op.clone(), vec![json!("payload")]));
//!                 Doc { text: "foo".into() }
//!             }
//!             Action::Second { payload } => Doc { text: payload.clone() },
//!         })
//!     }));
//!
//! store.dispatch(Action::First).unwrap();
//! let state = store.get_state();
//! assert_eq!(state.text, "foo");
//! assert_eq!(state.pending_effects()[0].args(), &[json!("payload")]);
//!
//! store
//!     .dispatch(Action::Second { payload: "new payload".into() })
//!     .unwrap();
//! let state = store.get_state();
//! assert_eq!(state.text, "new payload");
//! assert!(state.pending_effects().is_empty());
//! ```

pub mod builder;
pub mod coalesce;
pub mod core;
pub mod effects;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use builder::{persistent_store, record_store, StoreBuilder};
pub use coalesce::{coalesce, coalesce_persistent, FunkState, Record, StateMap};
pub use core::{declare, try_declare, Funk, Operation, OperationError};
pub use effects::{
    funk_middleware, funk_middleware_persistent, run_funks, run_funks_persistent, FunkMiddleware,
};
pub use error::FunkError;
pub use store::{MemoryStore, Store, Subscription};
