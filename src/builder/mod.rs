//! Builder API for ergonomic store construction.
//!
//! This module provides a fluent builder and shorthand constructors for
//! stores driven by coalesced reducers.

pub mod error;
pub mod store;

pub use error::BuildError;
pub use store::StoreBuilder;

use crate::coalesce::{coalesce, coalesce_persistent, Record, StateMap};
use crate::core::{Environment, Event};
use crate::store::MemoryStore;

/// Create a store whose reducer is wrapped with [`coalesce`], starting from
/// the reducer's default application state and no pending effects.
///
/// # Example
///
/// ```
/// use funks::builder::record_store;
/// use funks::coalesce::Record;
/// use funks::store::{MemoryStore, Store};
/// use std::convert::Infallible;
///
/// #[derive(Debug)]
/// enum Action {
///     Bump,
/// }
///
/// let store: MemoryStore<Record<u32, Action>, Action> =
///     record_store(|n: u32, _: &Action| -> Result<u32, Infallible> { Ok(n + 1) });
///
/// store.dispatch(Action::Bump).unwrap();
/// assert_eq!(*store.get_state(), 1);
/// ```
pub fn record_store<S, E, Env, Er, F>(reduce: F) -> MemoryStore<Record<S, E, Env>, E, Er>
where
    S: Default,
    E: Event,
    Env: Environment,
    F: Fn(S, &E) -> Result<S, Er> + Send + Sync + 'static,
{
    MemoryStore::new(coalesce(reduce))
}

/// Create a store whose reducer is wrapped with [`coalesce_persistent`],
/// starting from [`StateMap::default`].
///
/// # Example
///
/// ```
/// use funks::builder::persistent_store;
/// use funks::coalesce::StateMap;
/// use funks::store::{MemoryStore, Store};
/// use serde_json::json;
/// use std::convert::Infallible;
///
/// #[derive(Debug)]
/// enum Action {
///     Rename(String),
/// }
///
/// let store: MemoryStore<StateMap<Action>, Action> = persistent_store(
///     |map: StateMap<Action>, Action::Rename(name): &Action| -> Result<_, Infallible> {
///         Ok(map.set("name", name.as_str()))
///     },
/// );
///
/// store.dispatch(Action::Rename("ada".into())).unwrap();
/// assert_eq!(
///     store.get_state().to_plain(),
///     json!({"name": "ada", "pendingEffects": []})
/// );
/// ```
pub fn persistent_store<E, Env, Er, F>(reduce: F) -> MemoryStore<StateMap<E, Env>, E, Er>
where
    E: Event,
    Env: Environment,
    F: Fn(StateMap<E, Env>, &E) -> Result<StateMap<E, Env>, Er> + Send + Sync + 'static,
{
    MemoryStore::new(coalesce_persistent(reduce))
}
