//! Crate-level error types.

use thiserror::Error;

/// Errors raised by the funk bookkeeping itself.
///
/// Domain failures never show up here: reducer errors are returned
/// unchanged by the wrappers and operation errors stay with the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunkError {
    /// A funk was declared against an event that no coalescing reducer is processing.
    #[error("funk declared outside a coalescing reducer")]
    NoActiveReduction,

    /// The declared funk runs in a different environment than the reducer's state.
    #[error("funk environment mismatch: reducer expects {expected}, declared {found}")]
    EnvironmentMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The runner was attached outside a Tokio runtime.
    #[error("funk runner must be attached from within a Tokio runtime")]
    NoRuntime,
}
