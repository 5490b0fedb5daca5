//! Inline subscribers with filters and expiry.
//!
//! ```rust,ignore
//! let welcome = Subscriber::builder(EventKind::UserConnect)
//!     .filter(|event| event.user().is_some_and(|user| user.name() != "bot"))
//!     .expire_after(1)
//!     .handler(|event| {
//!         info!("first human connected");
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let subscription = bus.subscribe(welcome);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use mimic_core::RegistrationError;

use crate::dispatch::Priority;
use crate::dispatch::handler::Callback;
use crate::error::HandlerResult;
use crate::event::{CanonicalEvent, EventKind};

/// A predicate evaluated against each candidate event.
pub type Predicate = Arc<dyn Fn(&CanonicalEvent) -> bool + Send + Sync>;

/// A handler plus the conditions under which it runs and expires.
pub struct Subscriber {
    pub(crate) kind: EventKind,
    pub(crate) priority: Priority,
    pub(crate) ignore_cancelled: bool,
    pub(crate) name: Cow<'static, str>,
    pub(crate) filters: Vec<Predicate>,
    pub(crate) expire_when: Vec<Predicate>,
    pub(crate) expire_after: Option<u32>,
    pub(crate) callback: Callback,
}

impl Subscriber {
    /// Starts a subscriber for events accepted by `kind`.
    pub fn builder(kind: EventKind) -> SubscriberBuilder {
        SubscriberBuilder {
            kind,
            priority: Priority::default(),
            ignore_cancelled: false,
            name: None,
            filters: Vec::new(),
            expire_when: Vec::new(),
            expire_after: None,
            callback: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("name", &self.name)
            .field("filters", &self.filters.len())
            .field("expire_after", &self.expire_after)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Subscriber`].
pub struct SubscriberBuilder {
    kind: EventKind,
    priority: Priority,
    ignore_cancelled: bool,
    name: Option<Cow<'static, str>>,
    filters: Vec<Predicate>,
    expire_when: Vec<Predicate>,
    expire_after: Option<u32>,
    callback: Option<Callback>,
}

impl SubscriberBuilder {
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Skips the subscriber for events that are already cancelled.
    pub fn ignore_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }

    /// Adds a filter. The handler only runs when every filter passes.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&CanonicalEvent) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Unsubscribes, without running the handler, on the first event for which
    /// `predicate` holds.
    pub fn expire_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CanonicalEvent) -> bool + Send + Sync + 'static,
    {
        self.expire_when.push(Arc::new(predicate));
        self
    }

    /// Unsubscribes after the handler ran `invocations` times. Zero is
    /// rejected by [`build`](Self::build).
    pub fn expire_after(mut self, invocations: u32) -> Self {
        self.expire_after = Some(invocations);
        self
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CanonicalEvent) -> HandlerResult + Send + Sync + 'static,
    {
        if self.name.is_none() {
            self.name = Some(Cow::Borrowed(std::any::type_name::<F>()));
        }
        self.callback = Some(Arc::new(f));
        self
    }

    /// Finishes the subscriber. Fails when no handler was set or when
    /// `expire_after(0)` was requested.
    pub fn build(self) -> Result<Subscriber, RegistrationError> {
        let callback = self.callback.ok_or(RegistrationError::Incomplete("handler"))?;
        if self.expire_after == Some(0) {
            return Err(RegistrationError::Invalid {
                setting: "expire_after",
                reason: "must allow at least one invocation",
            });
        }
        Ok(Subscriber {
            kind: self.kind,
            priority: self.priority,
            ignore_cancelled: self.ignore_cancelled,
            name: self.name.unwrap_or(Cow::Borrowed("subscriber")),
            filters: self.filters,
            expire_when: self.expire_when,
            expire_after: self.expire_after,
            callback,
        })
    }
}
