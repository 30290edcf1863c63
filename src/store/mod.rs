//! The store collaborator: a single state cell with dispatch and
//! change notification.
//!
//! The runner in [`crate::effects`] only depends on the [`Store`] trait, so
//! any store that commits state synchronously on `dispatch` and notifies
//! subscribers afterwards can drive funks. [`MemoryStore`] is the in-process
//! implementation shipped with the crate.

pub mod error;
mod memory;

pub use error::DispatchError;
pub use memory::{MemoryStore, Reducer};

use crate::core::Event;
use std::fmt;

/// Identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle leaves the listener attached; call
/// [`unsubscribe`](Self::unsubscribe) to detach it. Detaching stops future
/// notifications only, work already started by the listener keeps running.
pub struct Subscription {
    id: SubscriptionId,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(id: SubscriptionId, detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Detach the listener from the store.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// A single authoritative state cell driven by events.
///
/// Implementations must notify every listener after each committed change,
/// and every listener must observe the state committed by the change it is
/// notified about. A `dispatch` called from outside any notification commits
/// before it returns; one called from inside a listener may be queued until
/// the current notification has finished.
pub trait Store: Send + Sync + 'static {
    type State;
    type Event: Event;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Apply `event` through the reducer and commit the resulting state.
    fn dispatch(&self, event: Self::Event) -> Result<(), Self::Error>;

    /// Current committed state.
    fn get_state(&self) -> Self::State;

    /// Register a listener called after each committed state change.
    fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static;
}
