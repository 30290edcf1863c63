//! In-memory store.

use super::{DispatchError, Store, Subscription, SubscriptionId};
use crate::core::Event;
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, debug_span, trace, warn};
use uuid::Uuid;

/// Type alias for reducer functions driven by a [`MemoryStore`].
pub type Reducer<S, E, Er> = Box<dyn Fn(S, &E) -> Result<S, Er> + Send + Sync>;

type Listener = Arc<dyn Fn() + Send + Sync>;
type Listeners = Arc<Mutex<Vec<(SubscriptionId, Listener)>>>;

/// Single-cell store holding state `S` reduced by events `E`.
///
/// Dispatches are serialized: reduce, commit and listener notification
/// happen under one re-entrant lock, so every listener reads the state the
/// notifying dispatch committed. Dispatches from other threads wait their
/// turn. A listener may dispatch on the same thread: the event is queued and
/// applied once every listener has seen the current state, before the
/// outermost `dispatch` returns. A queued event the reducer rejects is
/// logged and dropped, since its caller has already returned `Ok`.
///
/// # Example
///
/// ```rust
/// use funks::store::{MemoryStore, Store};
/// use std::convert::Infallible;
///
/// enum Counter {
///     Increment,
///     Decrement,
/// }
///
/// let store = MemoryStore::new(|n: i64, event: &Counter| -> Result<i64, Infallible> {
///     Ok(match event {
///         Counter::Increment => n + 1,
///         Counter::Decrement => n - 1,
///     })
/// });
///
/// store.dispatch(Counter::Increment).unwrap();
/// store.dispatch(Counter::Increment).unwrap();
/// store.dispatch(Counter::Decrement).unwrap();
/// assert_eq!(store.get_state(), 1);
/// ```
pub struct MemoryStore<S, E: Event, Er = Infallible> {
    state: Mutex<S>,
    reducer: Reducer<S, E, Er>,
    listeners: Listeners,
    dispatching: ReentrantMutex<()>,
    /// Set while listeners run; only read by the thread holding `dispatching`.
    notifying: AtomicBool,
    queued: Mutex<VecDeque<E>>,
    next_id: AtomicU64,
}

impl<S, E: Event, Er> MemoryStore<S, E, Er> {
    /// Create a store starting from `S::default()`.
    pub fn new<F>(reducer: F) -> Self
    where
        S: Default,
        F: Fn(S, &E) -> Result<S, Er> + Send + Sync + 'static,
    {
        Self::with_state(S::default(), reducer)
    }

    /// Create a store starting from `initial`.
    pub fn with_state<F>(initial: S, reducer: F) -> Self
    where
        F: Fn(S, &E) -> Result<S, Er> + Send + Sync + 'static,
    {
        Self::from_parts(initial, Box::new(reducer))
    }

    pub(crate) fn from_parts(initial: S, reducer: Reducer<S, E, Er>) -> Self {
        Self {
            state: Mutex::new(initial),
            reducer,
            listeners: Arc::new(Mutex::new(Vec::new())),
            dispatching: ReentrantMutex::new(()),
            notifying: AtomicBool::new(false),
            queued: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<S, E, Er> MemoryStore<S, E, Er>
where
    S: Clone,
    E: Event,
    Er: std::error::Error,
{
    /// Reduce, commit and notify for one event. Caller holds `dispatching`.
    fn apply(&self, event: E) -> Result<(), DispatchError<Er>> {
        let id = Uuid::new_v4();
        let span = debug_span!("dispatch", %id);
        let _entered = span.enter();

        let current = self.state.lock().clone();
        let next = (self.reducer)(current, &event).map_err(|e| {
            debug!(error = %e, "reducer rejected event");
            DispatchError::Reducer(e)
        })?;
        *self.state.lock() = next;

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        trace!(listeners = listeners.len(), "state committed");

        let _notifying = Notifying::enter(&self.notifying);
        for listener in listeners {
            listener();
        }
        Ok(())
    }
}

/// Marks a notification in progress, cleared even if a listener panics.
struct Notifying<'a>(&'a AtomicBool);

impl<'a> Notifying<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Notifying<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S, E, Er> Store for MemoryStore<S, E, Er>
where
    S: Clone + Send + 'static,
    E: Event,
    Er: std::error::Error + Send + Sync + 'static,
{
    type State = S;
    type Event = E;
    type Error = DispatchError<Er>;

    fn dispatch(&self, event: E) -> Result<(), DispatchError<Er>> {
        let _serial = self.dispatching.lock();
        if self.notifying.load(Ordering::Acquire) {
            self.queued.lock().push_back(event);
            trace!("event queued behind current notification");
            return Ok(());
        }

        self.apply(event)?;
        loop {
            let next = self.queued.lock().pop_front();
            let Some(next) = next else {
                break;
            };
            if let Err(e) = self.apply(next) {
                warn!(error = %e, "queued event rejected");
            }
        }
        Ok(())
    }

    fn get_state(&self) -> S {
        self.state.lock().clone()
    }

    fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        debug!(subscription = id.0, "listener attached");

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(id, move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().retain(|(other, _)| *other != id);
                debug!(subscription = id.0, "listener detached");
            }
        })
    }
}

impl<S: fmt::Debug, E: Event, Er> fmt::Debug for MemoryStore<S, E, Er> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("state", &*self.state.lock())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
