//! Effect descriptors: an operation plus the arguments to call it with.
//!
//! A [`Funk`] is pure data. Declaring one performs no I/O; it only records
//! the intent to call [`Operation`] with `args` once the reducer has
//! finished and the new state has been committed.

use super::event::{Environment, Event};
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use thiserror::Error;

/// Failure of an operation or of its deferred result.
///
/// The runner never retries and never turns these into events. An operation
/// that wants its failure observed should resolve to an error-shaped event
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// An argument was missing or had the wrong shape.
    #[error("argument {index} is invalid: {reason}")]
    InvalidArgument { index: usize, reason: String },

    /// The operation itself failed.
    #[error("operation failed: {0}")]
    Failed(String),
}

impl OperationError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Deferred result of invoking an operation.
pub type Completion<E, Env> = BoxedEffect<Option<E>, OperationError, Env>;

/// Type alias for operation functions.
pub type OperationFn<E, Env> = dyn Fn(&[Value]) -> Completion<E, Env> + Send + Sync;

/// A named, shareable operation.
///
/// Invoking the operation is synchronous and returns a Stillwater effect.
/// The effect is the deferred part: the runner executes it against its
/// environment and dispatches `Some(event)` when it resolves.
///
/// Two operations are equal when they share the same underlying function
/// and name; clones of one operation are therefore equal to each other.
///
/// # Example
///
/// ```rust
/// use funks::core::{arg, Operation};
/// use stillwater::prelude::*;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Action {
///     Greeted(String),
/// }
///
/// let greet: Operation<Action> = Operation::new("greet", |args| match arg::<String>(args, 0) {
///     Ok(name) => pure(Some(Action::Greeted(format!("hello {name}")))).boxed(),
///     Err(e) => fail(e).boxed(),
/// });
///
/// assert_eq!(greet.name(), "greet");
/// ```
pub struct Operation<E: Event, Env: Environment = ()> {
    name: Cow<'static, str>,
    call: Arc<OperationFn<E, Env>>,
}

impl<E: Event, Env: Environment> Operation<E, Env> {
    /// Create an operation from a function producing a fresh effect per call.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, call: F) -> Self
    where
        F: Fn(&[Value]) -> Completion<E, Env> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    /// Name used in logs and plain renderings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the operation with the given arguments.
    pub fn invoke(&self, args: &[Value]) -> Completion<E, Env> {
        (self.call)(args)
    }
}

impl<E: Event, Env: Environment> Clone for Operation<E, Env> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            call: Arc::clone(&self.call),
        }
    }
}

impl<E: Event, Env: Environment> PartialEq for Operation<E, Env> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call) && self.name == other.name
    }
}

impl<E: Event, Env: Environment> fmt::Debug for Operation<E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation").field(&self.name).finish()
    }
}

/// An effect descriptor: which operation to call and with what.
///
/// Immutable once created. Equality is structural over the operation and
/// the argument list.
pub struct Funk<E: Event, Env: Environment = ()> {
    operation: Operation<E, Env>,
    args: Vec<Value>,
}

impl<E: Event, Env: Environment> Funk<E, Env> {
    pub fn new(operation: Operation<E, Env>, args: Vec<Value>) -> Self {
        Self { operation, args }
    }

    pub fn operation(&self) -> &Operation<E, Env> {
        &self.operation
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Call the operation with this funk's arguments.
    pub fn invoke(&self) -> Completion<E, Env> {
        self.operation.invoke(&self.args)
    }

    /// Plain JSON rendering: `{"operation": name, "args": [...]}`.
    pub fn to_plain(&self) -> Value {
        json!({
            "operation": self.operation.name(),
            "args": self.args,
        })
    }
}

impl<E: Event, Env: Environment> Clone for Funk<E, Env> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            args: self.args.clone(),
        }
    }
}

impl<E: Event, Env: Environment> PartialEq for Funk<E, Env> {
    fn eq(&self, other: &Self) -> bool {
        self.operation == other.operation && self.args == other.args
    }
}

impl<E: Event, Env: Environment> fmt::Debug for Funk<E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Funk")
            .field("operation", &self.operation.name())
            .field("args", &self.args)
            .finish()
    }
}

impl<E: Event, Env: Environment> Serialize for Funk<E, Env> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut funk = serializer.serialize_struct("Funk", 2)?;
        funk.serialize_field("operation", self.operation.name())?;
        funk.serialize_field("args", &self.args)?;
        funk.end()
    }
}

/// Decode the argument at `index`.
///
/// # Example
///
/// ```rust
/// use funks::core::arg;
/// use serde_json::json;
///
/// let args = vec![json!("payload"), json!(3)];
/// assert_eq!(arg::<String>(&args, 0).unwrap(), "payload");
/// assert_eq!(arg::<u32>(&args, 1).unwrap(), 3);
/// assert!(arg::<u32>(&args, 2).is_err());
/// ```
pub fn arg<T: DeserializeOwned>(args: &[Value], index: usize) -> Result<T, OperationError> {
    let value = args.get(index).ok_or_else(|| OperationError::InvalidArgument {
        index,
        reason: format!("expected at least {} arguments, got {}", index + 1, args.len()),
    })?;
    serde_json::from_value(value.clone()).map_err(|e| OperationError::InvalidArgument {
        index,
        reason: e.to_string(),
    })
}
