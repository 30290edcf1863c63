//! Builder for constructing stores.

use crate::builder::error::BuildError;
use crate::core::Event;
use crate::store::{MemoryStore, Reducer};
use std::convert::Infallible;

/// Builder for constructing a [`MemoryStore`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use funks::builder::StoreBuilder;
/// use funks::store::Store;
/// use std::convert::Infallible;
///
/// let store = StoreBuilder::<u32, u32, Infallible>::new()
///     .initial(1)
///     .reducer(|n, delta: &u32| Ok(n + delta))
///     .build()
///     .unwrap();
///
/// store.dispatch(41).unwrap();
/// assert_eq!(store.get_state(), 42);
/// ```
pub struct StoreBuilder<S, E: Event, Er = Infallible> {
    initial: Option<S>,
    reducer: Option<Reducer<S, E, Er>>,
}

impl<S, E: Event, Er> StoreBuilder<S, E, Er> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            reducer: None,
        }
    }

    /// Set the initial state.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Start from `S::default()`.
    pub fn default_state(self) -> Self
    where
        S: Default,
    {
        self.initial(S::default())
    }

    /// Set the reducer (required).
    pub fn reducer<F>(mut self, reducer: F) -> Self
    where
        F: Fn(S, &E) -> Result<S, Er> + Send + Sync + 'static,
    {
        self.reducer = Some(Box::new(reducer));
        self
    }

    /// Build the store.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<MemoryStore<S, E, Er>, BuildError> {
        let reducer = self.reducer.ok_or(BuildError::MissingReducer)?;
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        Ok(MemoryStore::from_parts(initial, reducer))
    }
}

impl<S, E: Event, Er> Default for StoreBuilder<S, E, Er> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coalesce::{coalesce, Record};
    use crate::store::Store;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Push(char),
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = StoreBuilder::<String, Op>::new().initial(String::new()).build();
        assert!(matches!(result, Err(BuildError::MissingReducer)));

        let result = StoreBuilder::<String, Op>::new()
            .reducer(|s, _: &Op| Ok(s))
            .build();
        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_creates_working_store() {
        let store = StoreBuilder::<String, Op>::new()
            .default_state()
            .reducer(|mut s: String, Op::Push(c): &Op| {
                s.push(*c);
                Ok(s)
            })
            .build()
            .unwrap();

        store.dispatch(Op::Push('h')).unwrap();
        store.dispatch(Op::Push('i')).unwrap();

        assert_eq!(store.get_state(), "hi");
    }

    #[test]
    fn builder_accepts_coalesced_reducer() {
        let store = StoreBuilder::<Record<u32, Op>, Op>::new()
            .default_state()
            .reducer(coalesce(|n: u32, _: &Op| Ok(n + 1)))
            .build()
            .unwrap();

        store.dispatch(Op::Push('x')).unwrap();

        let state = store.get_state();
        assert_eq!(*state, 1);
        assert!(state.pending_effects().is_empty());
    }
}
