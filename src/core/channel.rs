//! Per-event channels that collect declared funks.
//!
//! A reducer only ever sees `&E`, so funks cannot be stored on the event
//! itself. Instead each in-flight event is keyed by identity (its address
//! and type) into a thread-local side table. A coalescing wrapper opens a
//! frame for the event before calling the reducer and closes it on return,
//! so the channel lives strictly inside one wrapper call and the event is
//! never touched.
//!
//! Frames stack per event: a coalesced reducer that delegates to another
//! coalesced reducer with the same event gets its own frame, and each
//! wrapper harvests only what was declared while its frame was on top.
//!
//! Zero-sized events have no address of their own, so they are keyed by
//! type alone: every value of a zero-sized event type is the same event.
//! Declaring against any of them while one is being reduced lands in that
//! reduction's channel.

use super::event::{Environment, Event};
use super::funk::Funk;
use crate::error::FunkError;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EventKey {
    addr: usize,
    type_id: TypeId,
}

impl EventKey {
    fn of<E: Event>(event: &E) -> Self {
        let addr = if std::mem::size_of::<E>() == 0 {
            0
        } else {
            event as *const E as *const () as usize
        };
        Self {
            addr,
            type_id: TypeId::of::<E>(),
        }
    }
}

struct Frame {
    /// `TypeId` of the `Vec<Funk<E, Env>>` the owning wrapper will harvest.
    expects: TypeId,
    expects_name: &'static str,
    /// Created on the first declaration.
    funks: Option<Box<dyn Any>>,
}

thread_local! {
    static CHANNELS: RefCell<HashMap<EventKey, Vec<Frame>>> = RefCell::new(HashMap::new());
}

/// Declare a funk against the event currently being reduced.
///
/// The funk is appended to the event's channel, creating the channel on
/// first use. Declaration order is preserved.
///
/// # Panics
///
/// Panics if `event` is not being processed by a coalescing reducer on this
/// thread, or if the funk's environment differs from the one the reducer's
/// state expects. Both are programming errors: nothing would ever harvest
/// the funk. Use [`try_declare`] to handle them as values.
///
/// Events are matched by identity, not by value. For a zero-sized event
/// type all values share one identity, so declaring against any value of
/// that type succeeds while another value of it is being reduced.
///
/// # Example
///
/// ```rust
/// use funks::coalesce::{coalesce, Record};
/// use funks::core::{declare, Funk, Operation};
/// use serde_json::json;
/// use std::convert::Infallible;
/// use stillwater::prelude::*;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Action {
///     Save(String),
///     Saved,
/// }
///
/// let save: Operation<Action> = Operation::new("save", |_| pure(Some(Action::Saved)).boxed());
///
/// let reducer = coalesce(move |count: u32, action: &Action| -> Result<u32, Infallible> {
///     if let Action::Save(body) = action {
///         declare(action, Funk::new(save.clone(), vec![json!(body)]));
///     }
///     Ok(count + 1)
/// });
///
/// let state: Record<u32, Action> = reducer(Record::default(), &Action::Save("doc".into())).unwrap();
/// assert_eq!(state.pending_effects().len(), 1);
/// assert_eq!(*state, 1);
/// ```
pub fn declare<E: Event, Env: Environment>(event: &E, funk: Funk<E, Env>) {
    if let Err(e) = try_declare(event, funk) {
        panic!("{e}");
    }
}

/// Fallible form of [`declare`].
pub fn try_declare<E: Event, Env: Environment>(
    event: &E,
    funk: Funk<E, Env>,
) -> Result<(), FunkError> {
    let key = EventKey::of(event);
    CHANNELS.with(|channels| {
        let mut channels = channels.borrow_mut();
        let frame = channels
            .get_mut(&key)
            .and_then(|frames| frames.last_mut())
            .ok_or(FunkError::NoActiveReduction)?;

        if frame.expects != TypeId::of::<Vec<Funk<E, Env>>>() {
            return Err(FunkError::EnvironmentMismatch {
                expected: frame.expects_name,
                found: type_name::<Env>(),
            });
        }

        let funks = frame
            .funks
            .get_or_insert_with(|| Box::new(Vec::<Funk<E, Env>>::new()) as Box<dyn Any>);
        if let Some(funks) = funks.downcast_mut::<Vec<Funk<E, Env>>>() {
            funks.push(funk);
        }
        Ok(())
    })
}

/// Whether `event` currently has a channel frame on this thread.
///
/// Always `false` once the coalescing wrapper that received the event has
/// returned.
pub fn has_channel<E: Event>(event: &E) -> bool {
    let key = EventKey::of(event);
    CHANNELS.with(|channels| channels.borrow().contains_key(&key))
}

/// Number of events with an open channel on this thread.
pub fn open_channels() -> usize {
    CHANNELS.with(|channels| channels.borrow().len())
}

/// A channel frame held open for the duration of one reducer call.
///
/// Dropping the scope without harvesting discards whatever was declared,
/// which is what happens when the reducer fails or panics.
pub(crate) struct Scope<E: Event, Env: Environment> {
    key: EventKey,
    closed: bool,
    _marker: PhantomData<fn() -> Funk<E, Env>>,
}

impl<E: Event, Env: Environment> Scope<E, Env> {
    pub(crate) fn open(event: &E) -> Self {
        let key = EventKey::of(event);
        CHANNELS.with(|channels| {
            channels.borrow_mut().entry(key).or_default().push(Frame {
                expects: TypeId::of::<Vec<Funk<E, Env>>>(),
                expects_name: type_name::<Env>(),
                funks: None,
            });
        });
        Self {
            key,
            closed: false,
            _marker: PhantomData,
        }
    }

    /// Close the frame and return the funks declared into it, in order.
    pub(crate) fn harvest(mut self) -> Vec<Funk<E, Env>> {
        self.close()
            .and_then(|frame| frame.funks)
            .and_then(|funks| funks.downcast::<Vec<Funk<E, Env>>>().ok())
            .map(|funks| *funks)
            .unwrap_or_default()
    }

    fn close(&mut self) -> Option<Frame> {
        if self.closed {
            return None;
        }
        self.closed = true;
        CHANNELS.with(|channels| {
            let mut channels = channels.borrow_mut();
            let frames = channels.get_mut(&self.key)?;
            let frame = frames.pop();
            if frames.is_empty() {
                channels.remove(&self.key);
            }
            frame
        })
    }
}

impl<E: Event, Env: Environment> Drop for Scope<E, Env> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Operation;
    use serde_json::json;
    use stillwater::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Action {
        Load,
        Loaded,
    }

    fn load() -> Operation<Action> {
        Operation::new("load", |_| pure(Some(Action::Loaded)).boxed())
    }

    #[test]
    fn open_scope_attaches_channel_until_harvest() {
        let event = Action::Load;
        let scope = Scope::<Action, ()>::open(&event);

        assert!(has_channel(&event));
        assert!(scope.harvest().is_empty());
        assert!(!has_channel(&event));
    }

    #[test]
    fn harvest_preserves_declaration_order() {
        let op = load();
        let event = Action::Load;
        let scope = Scope::<Action, ()>::open(&event);

        declare(&event, Funk::new(op.clone(), vec![json!(1)]));
        declare(&event, Funk::new(op.clone(), vec![json!(2)]));

        let funks = scope.harvest();
        assert_eq!(
            funks,
            vec![
                Funk::new(op.clone(), vec![json!(1)]),
                Funk::new(op, vec![json!(2)]),
            ]
        );
        assert_eq!(open_channels(), 0);
    }

    #[test]
    fn dropping_scope_discards_declarations() {
        let event = Action::Load;
        {
            let _scope = Scope::<Action, ()>::open(&event);
            declare(&event, Funk::new(load(), vec![]));
        }

        assert!(!has_channel(&event));
        assert_eq!(
            try_declare(&event, Funk::new(load(), vec![])),
            Err(FunkError::NoActiveReduction)
        );
    }

    #[test]
    fn try_declare_without_scope_is_an_error() {
        let event = Action::Load;
        let result = try_declare(&event, Funk::new(load(), vec![]));

        assert_eq!(result, Err(FunkError::NoActiveReduction));
        assert!(!has_channel(&event));
    }

    #[test]
    #[should_panic(expected = "outside a coalescing reducer")]
    fn declare_without_scope_panics() {
        let event = Action::Load;
        declare(&event, Funk::new(load(), vec![]));
    }

    #[test]
    fn channels_are_keyed_by_event_identity() {
        let first = Action::Load;
        let second = Action::Load;
        let scope = Scope::<Action, ()>::open(&first);

        assert_eq!(
            try_declare(&second, Funk::new(load(), vec![])),
            Err(FunkError::NoActiveReduction)
        );
        assert!(scope.harvest().is_empty());
    }

    #[test]
    fn nested_scopes_harvest_their_own_declarations() {
        let op = load();
        let event = Action::Load;

        let outer = Scope::<Action, ()>::open(&event);
        declare(&event, Funk::new(op.clone(), vec![json!("outer")]));

        let inner = Scope::<Action, ()>::open(&event);
        declare(&event, Funk::new(op.clone(), vec![json!("inner")]));
        let inner_funks = inner.harvest();

        assert!(has_channel(&event));
        let outer_funks = outer.harvest();

        assert_eq!(inner_funks, vec![Funk::new(op.clone(), vec![json!("inner")])]);
        assert_eq!(outer_funks, vec![Funk::new(op, vec![json!("outer")])]);
        assert!(!has_channel(&event));
    }

    #[test]
    fn environment_mismatch_is_rejected() {
        #[derive(Clone)]
        struct OtherEnv;

        let event = Action::Load;
        let scope = Scope::<Action, ()>::open(&event);
        let foreign: Operation<Action, OtherEnv> =
            Operation::new("foreign", |_| pure(None).boxed());

        let result = try_declare(&event, Funk::new(foreign, vec![]));

        assert!(matches!(result, Err(FunkError::EnvironmentMismatch { .. })));
        assert!(scope.harvest().is_empty());
    }

    #[test]
    fn channels_are_per_thread() {
        let event = Action::Load;
        let scope = Scope::<Action, ()>::open(&event);
        let addr = &event as *const Action as usize;

        let seen_elsewhere = std::thread::spawn(move || {
            CHANNELS.with(|channels| {
                channels.borrow().keys().any(|key| key.addr == addr)
            })
        })
        .join()
        .unwrap();

        assert!(!seen_elsewhere);
        assert!(scope.harvest().is_empty());
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tick;

    #[test]
    fn zero_sized_events_share_one_channel() {
        let tick: Operation<Tick> = Operation::new("tick", |_| pure(None).boxed());
        let reduced = Tick;
        let other = Tick;
        let scope = Scope::<Tick, ()>::open(&reduced);

        assert!(has_channel(&other));
        try_declare(&other, Funk::new(tick, vec![json!(1)])).unwrap();

        let funks = scope.harvest();
        assert_eq!(funks.len(), 1);
        assert!(!has_channel(&reduced));
    }
}
