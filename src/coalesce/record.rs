//! Record state: application fields plus a `pendingEffects` sibling.

use super::FunkState;
use crate::core::{Environment, Event, Funk};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::ops::Deref;

/// Flat state record produced by [`coalesce`](super::coalesce).
///
/// Holds the reducer's application state `S` and the funks declared during
/// the transition that produced it. Serializes flat, with `S`'s fields next
/// to `"pendingEffects"`, and derefs to `S` so application fields read
/// naturally.
///
/// # Example
///
/// ```rust
/// use funks::coalesce::Record;
/// use serde::Serialize;
/// use serde_json::json;
///
/// #[derive(Clone, Debug, Default, PartialEq, Serialize)]
/// struct Doc {
///     text: String,
/// }
///
/// #[derive(Debug)]
/// enum Action {}
///
/// let record: Record<Doc, Action> = Record::new(Doc { text: "initial".into() });
///
/// assert_eq!(record.text, "initial");
/// assert!(record.pending_effects().is_empty());
/// assert_eq!(
///     record.to_plain().unwrap(),
///     json!({"text": "initial", "pendingEffects": []})
/// );
/// ```
#[derive(Serialize)]
#[serde(bound(serialize = "S: Serialize"))]
pub struct Record<S, E: Event, Env: Environment = ()> {
    #[serde(flatten)]
    state: S,
    #[serde(rename = "pendingEffects")]
    pending_effects: Vec<Funk<E, Env>>,
}

impl<S, E: Event, Env: Environment> Record<S, E, Env> {
    /// Wrap application state with no pending effects.
    pub fn new(state: S) -> Self {
        Self {
            state,
            pending_effects: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Funks declared during the transition that produced this record.
    pub fn pending_effects(&self) -> &[Funk<E, Env>] {
        &self.pending_effects
    }

    /// Plain JSON view, the same shape the record serializes to.
    pub fn to_plain(&self) -> Result<Value, serde_json::Error>
    where
        S: Serialize,
    {
        serde_json::to_value(self)
    }
}

impl<S, E: Event, Env: Environment> FunkState<E, Env> for Record<S, E, Env> {
    fn pending_effects(&self) -> &[Funk<E, Env>] {
        &self.pending_effects
    }

    fn with_pending_effects(self, funks: Vec<Funk<E, Env>>) -> Self {
        Self {
            state: self.state,
            pending_effects: funks,
        }
    }
}

impl<S, E: Event, Env: Environment> Deref for Record<S, E, Env> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S: Default, E: Event, Env: Environment> Default for Record<S, E, Env> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Clone, E: Event, Env: Environment> Clone for Record<S, E, Env> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            pending_effects: self.pending_effects.clone(),
        }
    }
}

impl<S: PartialEq, E: Event, Env: Environment> PartialEq for Record<S, E, Env> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.pending_effects == other.pending_effects
    }
}

impl<S: fmt::Debug, E: Event, Env: Environment> fmt::Debug for Record<S, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("state", &self.state)
            .field("pending_effects", &self.pending_effects)
            .finish()
    }
}
