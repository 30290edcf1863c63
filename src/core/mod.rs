//! Core funk types and bookkeeping.
//!
//! This module contains the pure side of the library:
//! - Effect descriptors via [`Funk`] and [`Operation`]
//! - The per-event channel that reducers declare funks into
//! - The [`Event`] and [`Environment`] marker traits
//!
//! Nothing here performs I/O. Declaring a funk records data; running it is
//! the job of the runner in [`crate::effects`].

mod channel;
mod event;
mod funk;

pub(crate) use channel::Scope;
pub use channel::{declare, has_channel, open_channels, try_declare};
pub use event::{Environment, Event};
pub use funk::{arg, Completion, Funk, Operation, OperationError, OperationFn};
