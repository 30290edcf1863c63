//! Reducer wrappers that harvest declared funks into state.
//!
//! A coalescing wrapper runs an ordinary reducer, collects every funk the
//! reducer declared against the event (see [`declare`](crate::core::declare)),
//! and returns the reducer's state with `pendingEffects` replaced by exactly
//! those funks. The list is overwritten on every transition, even when
//! empty, so effects never carry over into a later event's state.
//!
//! Two state shapes are supported with identical semantics:
//! - [`Record`]: application state `S` next to a `pendingEffects` field
//! - [`StateMap`]: a persistent map with `pendingEffects` as one of its keys
//!
//! # Example
//!
//! ```rust
//! use funks::coalesce::{coalesce, Record};
//! use funks::core::{declare, has_channel, Funk, Operation};
//! use serde_json::json;
//! use std::convert::Infallible;
//! use stillwater::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Action {
//!     Fetch(u64),
//!     Fetched(String),
//! }
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Page {
//!     loading: bool,
//! }
//!
//! let fetch: Operation<Action> = Operation::new("fetch", |_| {
//!     pure(Some(Action::Fetched("body".into()))).boxed()
//! });
//!
//! let reducer = coalesce(move |_page: Page, action: &Action| -> Result<Page, Infallible> {
//!     match action {
//!         Action::Fetch(id) => {
//!             declare(action, Funk::new(fetch.clone(), vec![json!(id)]));
//!             Ok(Page { loading: true })
//!         }
//!         Action::Fetched(_) => Ok(Page { loading: false }),
//!     }
//! });
//!
//! let action = Action::Fetch(7);
//! let state: Record<Page, Action> = reducer(Record::default(), &action).unwrap();
//! assert!(state.loading);
//! assert_eq!(state.pending_effects()[0].args(), &[json!(7)]);
//! assert!(!has_channel(&action));
//!
//! let state = reducer(state, &Action::Fetched("body".into())).unwrap();
//! assert!(state.pending_effects().is_empty());
//! ```

mod map;
mod record;

pub use map::{Entry, StateMap};
pub use record::Record;

use crate::core::{Environment, Event, Funk, Scope};
use tracing::trace;

/// Reserved state key holding the funks declared by the last transition.
pub const PENDING_EFFECTS: &str = "pendingEffects";

/// State containers that carry a `pendingEffects` list.
pub trait FunkState<E: Event, Env: Environment>: Sized {
    /// Funks declared during the transition that produced this state.
    fn pending_effects(&self) -> &[Funk<E, Env>];

    /// Replace `pendingEffects` wholesale.
    fn with_pending_effects(self, funks: Vec<Funk<E, Env>>) -> Self;
}

/// Run `reduce` with a channel open for `event` and collect what it declared.
///
/// The channel is closed before this returns, whether `reduce` succeeds,
/// fails or unwinds. On failure the declarations are dropped.
fn harvest<E, Env, T, Er>(
    event: &E,
    reduce: impl FnOnce() -> Result<T, Er>,
) -> Result<(T, Vec<Funk<E, Env>>), Er>
where
    E: Event,
    Env: Environment,
{
    let scope = Scope::<E, Env>::open(event);
    let next = reduce()?;
    let funks = scope.harvest();
    trace!(declared = funks.len(), "harvested funks");
    Ok((next, funks))
}

/// Wrap a reducer over application state so it produces a [`Record`].
///
/// The wrapped reducer never sees `pendingEffects`; it receives the
/// record's application state and returns the next one. Reducer errors are
/// returned unchanged and nothing is harvested.
pub fn coalesce<S, E, Env, Er, F>(
    reduce: F,
) -> impl Fn(Record<S, E, Env>, &E) -> Result<Record<S, E, Env>, Er> + Send + Sync + 'static
where
    E: Event,
    Env: Environment,
    F: Fn(S, &E) -> Result<S, Er> + Send + Sync + 'static,
{
    move |record: Record<S, E, Env>, event: &E| {
        let (state, funks) = harvest(event, || reduce(record.into_state(), event))?;
        Ok(Record::<S, E, Env>::new(state).with_pending_effects(funks))
    }
}

/// Wrap a reducer over a [`StateMap`] so its declared funks land under
/// [`PENDING_EFFECTS`].
///
/// Same contract as [`coalesce`], except that the reducer sees the whole
/// map, `pendingEffects` included, and whatever it leaves there is
/// overwritten.
pub fn coalesce_persistent<E, Env, Er, F>(
    reduce: F,
) -> impl Fn(StateMap<E, Env>, &E) -> Result<StateMap<E, Env>, Er> + Send + Sync + 'static
where
    E: Event,
    Env: Environment,
    F: Fn(StateMap<E, Env>, &E) -> Result<StateMap<E, Env>, Er> + Send + Sync + 'static,
{
    move |map: StateMap<E, Env>, event: &E| {
        let (next, funks) = harvest(event, || reduce(map, event))?;
        Ok(next.with_pending_effects(funks))
    }
}
