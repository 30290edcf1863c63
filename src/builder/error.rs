//! Build errors for the store builder.

use thiserror::Error;

/// Errors that can occur when building a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) or .default_state() before .build()")]
    MissingInitialState,

    #[error("Reducer not specified. Call .reducer(f) before .build()")]
    MissingReducer,
}
