//! Dispatch-interposing runner.

use super::runner::launch;
use crate::coalesce::{FunkState, Record, StateMap};
use crate::core::{Environment, Event};
use crate::error::FunkError;
use crate::store::{Store, Subscription};
use parking_lot::ReentrantMutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::debug;

/// A store adapter that runs pending funks as part of `dispatch`.
///
/// Every event goes to the wrapped store first. Once the inner dispatch
/// returns, the middleware reads the committed state and runs its
/// `pendingEffects` exactly as [`run_funks`](super::run_funks) does. Events
/// the effects resolve to are dispatched back through the middleware, so
/// their own funks run too.
///
/// Dispatching through the middleware is serialized, and the state is read
/// under the same lock. Events dispatched directly into the inner store
/// bypass the middleware and their funks are not run.
pub struct FunkMiddleware<St: Store, Env: Environment> {
    inner: Arc<St>,
    env: Env,
    handle: Handle,
    dispatching: ReentrantMutex<()>,
    this: Weak<Self>,
}

/// Wrap a store whose state is a [`Record`] with a [`FunkMiddleware`].
///
/// # Errors
///
/// Returns [`FunkError::NoRuntime`] when called outside a Tokio runtime.
///
/// # Example
///
/// ```rust
/// use funks::builder::record_store;
/// use funks::core::{declare, Funk, Operation};
/// use funks::effects::funk_middleware;
/// use funks::store::Store;
/// use std::convert::Infallible;
/// use stillwater::prelude::*;
///
/// #[derive(Debug)]
/// enum Action {
///     Ping,
///     Pong,
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let pong: Operation<Action> = Operation::new("pong", |_| pure(Some(Action::Pong)).boxed());
///
/// let store = std::sync::Arc::new(record_store(move |count: u32, action: &Action| {
///     if let Action::Ping = action {
///         declare(action, Funk::new(pong.clone(), vec![]));
///     }
///     Ok::<_, Infallible>(count + 1)
/// }));
/// let store = funk_middleware(store, ()).unwrap();
///
/// store.dispatch(Action::Ping).unwrap();
/// # while *store.get_state() < 2 {
/// #     tokio::task::yield_now().await;
/// # }
/// # }
/// ```
pub fn funk_middleware<St, S, E, Env>(
    store: Arc<St>,
    env: Env,
) -> Result<Arc<FunkMiddleware<St, Env>>, FunkError>
where
    St: Store<State = Record<S, E, Env>, Event = E>,
    E: Event,
    Env: Environment,
{
    FunkMiddleware::wrap(store, env)
}

/// Wrap a store whose state is a [`StateMap`] with a [`FunkMiddleware`].
///
/// # Errors
///
/// Returns [`FunkError::NoRuntime`] when called outside a Tokio runtime.
pub fn funk_middleware_persistent<St, E, Env>(
    store: Arc<St>,
    env: Env,
) -> Result<Arc<FunkMiddleware<St, Env>>, FunkError>
where
    St: Store<State = StateMap<E, Env>, Event = E>,
    E: Event,
    Env: Environment,
{
    FunkMiddleware::wrap(store, env)
}

impl<St, Env> FunkMiddleware<St, Env>
where
    St: Store,
    St::State: FunkState<St::Event, Env>,
    Env: Environment,
{
    fn wrap(inner: Arc<St>, env: Env) -> Result<Arc<Self>, FunkError> {
        let handle = Handle::try_current().map_err(|_| FunkError::NoRuntime)?;
        debug!("funk middleware attached");
        Ok(Arc::new_cyclic(|this| Self {
            inner,
            env,
            handle,
            dispatching: ReentrantMutex::new(()),
            this: Weak::clone(this),
        }))
    }
}

impl<St: Store, Env: Environment> FunkMiddleware<St, Env> {
    /// The wrapped store.
    pub fn inner(&self) -> &Arc<St> {
        &self.inner
    }
}

impl<St, Env> Store for FunkMiddleware<St, Env>
where
    St: Store,
    St::State: FunkState<St::Event, Env>,
    Env: Environment,
{
    type State = St::State;
    type Event = St::Event;
    type Error = St::Error;

    fn dispatch(&self, event: St::Event) -> Result<(), St::Error> {
        let _serial = self.dispatching.lock();
        self.inner.dispatch(event)?;
        let state = self.inner.get_state();
        launch(
            &self.handle,
            state.pending_effects(),
            &self.env,
            Weak::clone(&self.this),
        );
        Ok(())
    }

    fn get_state(&self) -> St::State {
        self.inner.get_state()
    }

    fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.subscribe(listener)
    }
}

impl<St: Store + fmt::Debug, Env: Environment> fmt::Debug for FunkMiddleware<St, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunkMiddleware")
            .field("inner", &self.inner)
            .finish()
    }
}
