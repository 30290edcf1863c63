//! Event marker trait.

/// Anything a reducer can consume and an operation can produce.
///
/// Events are plain values describing what happened. They must be `Send`
/// so that effects resolving on another task can hand them back to the
/// store, and `'static` so that the channel side table can key them by type.
///
/// The trait is implemented for every qualifying type; there is nothing to
/// implement by hand.
///
/// # Example
///
/// ```rust
/// use funks::core::Event;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Action {
///     Fetch { id: u64 },
///     Fetched { body: String },
/// }
///
/// fn assert_event<E: Event>() {}
/// assert_event::<Action>();
/// ```
pub trait Event: Send + 'static {}

impl<T: Send + 'static> Event for T {}

/// Environment an operation's deferred effect runs against.
///
/// This is the dependency-injection seam for effects: HTTP clients, database
/// pools, clocks. The runner clones it once per spawned effect. Use `()` when
/// operations need nothing.
pub trait Environment: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Environment for T {}
