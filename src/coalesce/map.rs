//! Persistent map state.
//!
//! [`StateMap`] is an immutable, string-keyed map. Every write returns a new
//! map and leaves the original untouched. Cloning a map is O(1). A write
//! copies the key index, which is O(n) in the number of top-level keys, but
//! the values themselves are shared between the old and new map through
//! `Arc`; only the entry being written is new.

use super::{FunkState, PENDING_EFFECTS};
use crate::core::{Environment, Event, Funk};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value stored in a [`StateMap`].
pub enum Entry<E: Event, Env: Environment = ()> {
    /// Application data.
    Value(Value),
    /// Effect descriptors, used for `pendingEffects`.
    Funks(Vec<Funk<E, Env>>),
}

impl<E: Event, Env: Environment> Entry<E, Env> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Funks(_) => None,
        }
    }

    pub fn as_funks(&self) -> Option<&[Funk<E, Env>]> {
        match self {
            Self::Value(_) => None,
            Self::Funks(funks) => Some(funks),
        }
    }

    pub fn to_plain(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Funks(funks) => Value::Array(funks.iter().map(Funk::to_plain).collect()),
        }
    }
}

impl<E: Event, Env: Environment> From<Value> for Entry<E, Env> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<E: Event, Env: Environment> From<Vec<Funk<E, Env>>> for Entry<E, Env> {
    fn from(funks: Vec<Funk<E, Env>>) -> Self {
        Self::Funks(funks)
    }
}

impl<E: Event, Env: Environment> Clone for Entry<E, Env> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Funks(funks) => Self::Funks(funks.clone()),
        }
    }
}

impl<E: Event, Env: Environment> PartialEq for Entry<E, Env> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Funks(a), Self::Funks(b)) => a == b,
            _ => false,
        }
    }
}

impl<E: Event, Env: Environment> fmt::Debug for Entry<E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Funks(funks) => f.debug_tuple("Funks").field(funks).finish(),
        }
    }
}

impl<E: Event, Env: Environment> Serialize for Entry<E, Env> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Funks(funks) => funks.serialize(serializer),
        }
    }
}

/// Persistent map state produced by [`coalesce_persistent`](super::coalesce_persistent).
///
/// `pendingEffects` lives under [`PENDING_EFFECTS`] as an [`Entry::Funks`];
/// everything else is JSON data reached through [`get`](Self::get),
/// [`get_in`](Self::get_in) and their setters.
///
/// # Example
///
/// ```rust
/// use funks::coalesce::StateMap;
/// use serde_json::json;
///
/// #[derive(Debug)]
/// enum Action {}
///
/// let empty: StateMap<Action> = StateMap::new();
/// let map = empty.set("text", "foo").set_in(&["user", "name"], "ada");
///
/// assert!(empty.is_empty());
/// assert_eq!(map.get("text"), Some(&json!("foo")));
/// assert_eq!(map.get_in(&["user", "name"]), Some(&json!("ada")));
/// assert_eq!(map.to_plain(), json!({"text": "foo", "user": {"name": "ada"}}));
/// ```
pub struct StateMap<E: Event, Env: Environment = ()> {
    entries: Arc<BTreeMap<String, Arc<Entry<E, Env>>>>,
}

impl<E: Event, Env: Environment> StateMap<E, Env> {
    /// An empty map, without even a `pendingEffects` key.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(BTreeMap::new()),
        }
    }

    /// Application value at `key`. `None` for missing keys and funk entries.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_entry(key).and_then(Entry::as_value)
    }

    pub fn get_entry(&self, key: &str) -> Option<&Entry<E, Env>> {
        self.entries.get(key).map(Arc::as_ref)
    }

    /// Follow `path` through nested JSON objects (and arrays, by index).
    pub fn get_in(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter().try_fold(self.get(first)?, |value, segment| match value {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => value.get(*segment),
        })
    }

    /// Return a new map with `key` set to `value`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_entry(key, Entry::Value(value.into()))
    }

    pub fn set_entry(&self, key: impl Into<String>, entry: Entry<E, Env>) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(key.into(), Arc::new(entry));
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Return a new map with the value at `path` set, creating intermediate
    /// objects as needed. Non-object values along the path are replaced.
    pub fn set_in(&self, path: &[&str], value: impl Into<Value>) -> Self {
        let Some((first, rest)) = path.split_first() else {
            return self.clone();
        };
        let mut root = self.get(first).cloned().unwrap_or(Value::Null);
        assign(&mut root, rest, value.into());
        self.set(*first, root)
    }

    /// Return a new map without `key`.
    pub fn remove(&self, key: &str) -> Self {
        if !self.entries.contains_key(key) {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.remove(key);
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Funks stored under `pendingEffects`, empty when absent.
    pub fn pending_effects(&self) -> &[Funk<E, Env>] {
        self.get_entry(PENDING_EFFECTS)
            .and_then(Entry::as_funks)
            .unwrap_or(&[])
    }

    /// Plain JSON object view of the whole map.
    pub fn to_plain(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.to_plain()))
                .collect(),
        )
    }
}

fn assign(target: &mut Value, path: &[&str], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(object) = target {
        let child = object.entry(*segment).or_insert(Value::Null);
        assign(child, rest, value);
    }
}

impl<E: Event, Env: Environment> FunkState<E, Env> for StateMap<E, Env> {
    fn pending_effects(&self) -> &[Funk<E, Env>] {
        StateMap::pending_effects(self)
    }

    fn with_pending_effects(self, funks: Vec<Funk<E, Env>>) -> Self {
        self.set_entry(PENDING_EFFECTS, Entry::Funks(funks))
    }
}

/// An empty map with `pendingEffects` set to an empty list.
impl<E: Event, Env: Environment> Default for StateMap<E, Env> {
    fn default() -> Self {
        Self::new().set_entry(PENDING_EFFECTS, Entry::Funks(Vec::new()))
    }
}

impl<E: Event, Env: Environment> Clone for StateMap<E, Env> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<E: Event, Env: Environment> PartialEq for StateMap<E, Env> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || self.entries == other.entries
    }
}

impl<E: Event, Env: Environment> fmt::Debug for StateMap<E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<E: Event, Env: Environment> Serialize for StateMap<E, Env> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in self.entries.iter() {
            map.serialize_entry(key, entry.as_ref())?;
        }
        map.end()
    }
}

impl<E: Event, Env: Environment> From<Map<String, Value>> for StateMap<E, Env> {
    fn from(object: Map<String, Value>) -> Self {
        object.into_iter().collect()
    }
}

impl<E: Event, Env: Environment, K: Into<String>> FromIterator<(K, Value)> for StateMap<E, Env> {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(key, value)| (key.into(), Arc::new(Entry::Value(value))))
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }
}
