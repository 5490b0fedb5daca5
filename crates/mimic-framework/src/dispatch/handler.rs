//! Handlers and listeners.
//!
//! A [`Handler`] is one callback for one [`EventKind`] with a [`Priority`].
//! A [`Listener`] is an object that declares several handlers bound to itself:
//!
//! ```rust,ignore
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! impl Greeter {
//!     fn on_connect(&self, event: &mut UserConnectEvent) -> HandlerResult {
//!         info!(user = event.user().name(), "{}", self.greeting);
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for Greeter {
//!     fn handlers(self: Arc<Self>) -> Vec<Handler> {
//!         vec![Handler::bound(&self, Self::on_connect).priority(Priority::Monitor)]
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::Priority;
use crate::error::HandlerResult;
use crate::event::{CanonicalEvent, EventKind, EventVariant};

/// Type-erased handler callback.
pub type Callback = Arc<dyn Fn(&mut CanonicalEvent) -> HandlerResult + Send + Sync>;

/// A callback registered for one event kind.
#[derive(Clone)]
pub struct Handler {
    kind: EventKind,
    priority: Priority,
    ignore_cancelled: bool,
    name: Cow<'static, str>,
    callback: Callback,
}

impl Handler {
    /// Creates a handler for every event accepted by `kind`.
    pub fn new<F>(kind: EventKind, f: F) -> Self
    where
        F: Fn(&mut CanonicalEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self::from_callback(kind, Arc::new(f), std::any::type_name::<F>())
    }

    /// Creates a handler for the concrete event type `E`.
    pub fn typed<E, F>(f: F) -> Self
    where
        E: EventVariant,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        let name = std::any::type_name::<F>();
        let callback: Callback = Arc::new(move |event: &mut CanonicalEvent| {
            match E::from_event_mut(event) {
                Some(event) => f(event),
                None => Ok(()),
            }
        });
        Self::from_callback(E::KIND, callback, name)
    }

    /// Creates a handler for `E` that calls a method of `listener`.
    ///
    /// The handler is named after the method's path, for example
    /// `greeter::Greeter::on_connect`.
    pub fn bound<L, E, M>(listener: &Arc<L>, method: M) -> Self
    where
        L: Send + Sync + 'static,
        E: EventVariant,
        M: Fn(&L, &mut E) -> HandlerResult + Send + Sync + 'static,
    {
        let listener = Arc::clone(listener);
        Self::typed(move |event: &mut E| method(&listener, event))
            .named(std::any::type_name::<M>())
    }

    /// Creates a handler for `kind` that calls a method of `listener`.
    pub fn bound_kind<L, M>(listener: &Arc<L>, kind: EventKind, method: M) -> Self
    where
        L: Send + Sync + 'static,
        M: Fn(&L, &mut CanonicalEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let listener = Arc::clone(listener);
        Self::new(kind, move |event| method(&listener, event)).named(std::any::type_name::<M>())
    }

    pub(crate) fn from_callback(kind: EventKind, callback: Callback, name: &'static str) -> Self {
        Self {
            kind,
            priority: Priority::default(),
            ignore_cancelled: false,
            name: Cow::Borrowed(name),
            callback,
        }
    }

    /// Sets the priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Skips this handler for events that are already cancelled.
    pub fn ignore_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }

    /// Sets the name used in logs.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn get_priority(&self) -> Priority {
        self.priority
    }

    pub fn is_ignoring_cancelled(&self) -> bool {
        self.ignore_cancelled
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Invokes the callback.
    pub fn call(&self, event: &mut CanonicalEvent) -> HandlerResult {
        (self.callback)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("ignore_cancelled", &self.ignore_cancelled)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An object that contributes a set of handlers.
///
/// Listeners are registered by identity: registering the same `Arc` twice is a
/// no-op, and unregistering removes every handler it declared.
pub trait Listener: Send + Sync + 'static {
    /// Declares the handlers of this listener.
    fn handlers(self: Arc<Self>) -> Vec<Handler>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
