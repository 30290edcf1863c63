//! Dispatch error types.

use thiserror::Error;

/// Errors that can occur while dispatching an event.
#[derive(Debug, PartialEq, Error)]
pub enum DispatchError<Er> {
    /// The reducer rejected the event. State was left unchanged and no
    /// listener was notified.
    #[error("reducer failed: {0}")]
    Reducer(#[source] Er),
}

impl<Er> DispatchError<Er> {
    /// The reducer's own error, unchanged.
    pub fn into_reducer_error(self) -> Er {
        match self {
            Self::Reducer(e) => e,
        }
    }
}
