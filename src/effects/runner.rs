//! Store subscriber that executes pending funks.

use crate::coalesce::{FunkState, Record, StateMap};
use crate::core::{Environment, Event, Funk};
use crate::error::FunkError;
use crate::store::{Store, Subscription};
use std::sync::{Arc, Weak};
use stillwater::effect::Effect;
use tokio::runtime::Handle;
use tracing::{debug, error, trace, warn};

/// Attach a runner to a store whose state is a [`Record`].
///
/// After every committed change the runner reads `pendingEffects` from the
/// freshly committed state and, in declaration order, calls each funk's
/// operation with its arguments. The operation call is synchronous; the
/// returned effect is spawned on the current Tokio runtime with `env`, and
/// when it resolves to `Some(event)` that event is dispatched back into the
/// store. `None` dispatches nothing and errors are logged.
///
/// The runner holds the store weakly: once every other handle is dropped,
/// outstanding effects finish without dispatching.
///
/// # Errors
///
/// Returns [`FunkError::NoRuntime`] when called outside a Tokio runtime.
///
/// # Example
///
/// ```rust
/// use funks::builder::record_store;
/// use funks::coalesce::Record;
/// use funks::core::{declare, Funk, Operation};
/// use funks::effects::run_funks;
/// use funks::store::{MemoryStore, Store};
/// use std::convert::Infallible;
/// use std::sync::Arc;
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
/// let store: Arc<MemoryStore<Record<Vec<&'static str>, Action>, Action>> =
///     Arc::new(record_store(move |mut log: Vec<&'static str>, action: &Action| {
///         match action {
///             Action::Ping => {
///                 declare(action, Funk::new(pong.clone(), vec![]));
///                 log.push("ping");
///             }
///             Action::Pong => log.push("pong"),
///         }
///         Ok::<_, Infallible>(log)
///     }));
///
/// let _runner = run_funks(&store, ()).unwrap();
/// store.dispatch(Action::Ping).unwrap();
/// # while store.get_state().len() < 2 {
/// #     tokio::task::yield_now().await;
/// # }
/// # assert_eq!(*store.get_state(), vec!["ping", "pong"]);
/// # }
/// ```
pub fn run_funks<St, S, E, Env>(store: &Arc<St>, env: Env) -> Result<Subscription, FunkError>
where
    St: Store<State = Record<S, E, Env>, Event = E>,
    E: Event,
    Env: Environment,
{
    attach(store, env)
}

/// Attach a runner to a store whose state is a [`StateMap`].
///
/// Behaves exactly like [`run_funks`].
///
/// # Errors
///
/// Returns [`FunkError::NoRuntime`] when called outside a Tokio runtime.
pub fn run_funks_persistent<St, E, Env>(
    store: &Arc<St>,
    env: Env,
) -> Result<Subscription, FunkError>
where
    St: Store<State = StateMap<E, Env>, Event = E>,
    E: Event,
    Env: Environment,
{
    attach(store, env)
}

fn attach<St, Env>(store: &Arc<St>, env: Env) -> Result<Subscription, FunkError>
where
    St: Store,
    St::State: FunkState<St::Event, Env>,
    Env: Environment,
{
    let handle = Handle::try_current().map_err(|_| FunkError::NoRuntime)?;
    let weak = Arc::downgrade(store);

    let subscription = store.subscribe(move || {
        let Some(store) = weak.upgrade() else {
            return;
        };
        let state = store.get_state();
        launch(&handle, state.pending_effects(), &env, Arc::downgrade(&store));
    });

    debug!(subscription = ?subscription.id(), "funk runner attached");
    Ok(subscription)
}

/// Invoke each funk in order and spawn its effect on `handle`.
///
/// Resolved events are dispatched into `target`, unless it has been dropped
/// by then.
pub(super) fn launch<T, Env>(
    handle: &Handle,
    funks: &[Funk<T::Event, Env>],
    env: &Env,
    target: Weak<T>,
) where
    T: Store,
    Env: Environment,
{
    if funks.is_empty() {
        return;
    }
    trace!(count = funks.len(), "running pending funks");

    for funk in funks {
        let operation = funk.operation().name().to_string();
        let effect = funk.invoke();
        let env = env.clone();
        let target = Weak::clone(&target);

        handle.spawn(async move {
            match effect.run(&env).await {
                Ok(Some(event)) => match target.upgrade() {
                    Some(store) => {
                        if let Err(e) = store.dispatch(event) {
                            error!(%operation, error = %e, "dispatch of funk result failed");
                        }
                    }
                    None => debug!(%operation, "store dropped before funk resolved"),
                },
                Ok(None) => trace!(%operation, "funk resolved without an event"),
                Err(e) => warn!(%operation, error = %e, "funk failed"),
            }
        });
    }
}
