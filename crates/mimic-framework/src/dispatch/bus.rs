//! The event bus.
//!
//! # Dispatch
//!
//! When an event is dispatched:
//!
//! 1. The registry is snapshotted, so registrations made by handlers only take
//!    effect for later events
//! 2. Every handler whose kind accepts the event's concrete kind is collected
//! 3. Handlers are stably sorted by [`Priority`]; ties keep registration order,
//!    then declaration order within a listener
//! 4. Each handler runs in turn. A failing or panicking handler is logged and
//!    the remaining handlers still run
//!
//! Dispatch is synchronous on the caller's thread.

use std::borrow::Cow;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{Level, debug, error, span, trace, warn};

use crate::dispatch::handler::{Handler, Listener};
use crate::dispatch::subscriber::Subscriber;
use crate::dispatch::Priority;
use crate::error::{HandlerResult, panic_message};
use crate::event::{CanonicalEvent, EventKind, EventVariant};

/// Handlers contributed by one listener or one inline registration.
#[derive(Clone)]
struct Registration {
    id: u64,
    listener: Option<Arc<dyn Listener>>,
    name: Cow<'static, str>,
    handlers: Vec<Handler>,
}

impl Registration {
    fn is_listener<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|own| std::ptr::addr_eq(Arc::as_ptr(own), Arc::as_ptr(listener)))
    }
}

#[derive(Default)]
struct Inner {
    registrations: RwLock<Arc<Vec<Registration>>>,
    next_id: AtomicU64,
    slow_handler_warn: Option<Duration>,
}

impl Inner {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn push(&self, registration: Registration) {
        let mut guard = self.registrations.write();
        Arc::make_mut(&mut guard).push(registration);
    }

    fn remove(&self, id: u64) -> bool {
        let mut guard = self.registrations.write();
        let Some(index) = guard.iter().position(|r| r.id == id) else {
            return false;
        };
        Arc::make_mut(&mut guard).remove(index);
        true
    }

    fn contains(&self, id: u64) -> bool {
        self.registrations.read().iter().any(|r| r.id == id)
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Handle to an inline registration.
///
/// Dropping the handle does not unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    bus: Weak<Inner>,
}

impl Subscription {
    /// Removes the registration. Returns `false` if it was already removed.
    pub fn unsubscribe(&self) -> bool {
        self.bus.upgrade().is_some_and(|inner| inner.remove(self.id))
    }

    /// Returns `true` while the registration is still on the bus.
    pub fn is_active(&self) -> bool {
        self.bus.upgrade().is_some_and(|inner| inner.contains(self.id))
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// EventBus
// =============================================================================

/// Priority-ordered, fault-isolating event dispatch.
///
/// `EventBus` is a cheap handle; clones share the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bus that logs handler invocations slower than
    /// `threshold` at `warn` level.
    pub fn with_slow_handler_warning(threshold: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                slow_handler_warn: Some(threshold),
                ..Inner::default()
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Registers every handler declared by `listener`.
    ///
    /// Returns `false` if this listener instance is already registered.
    pub fn register_listener(&self, listener: Arc<dyn Listener>) -> bool {
        if self.is_registered(&listener) {
            return false;
        }

        let handlers = Arc::clone(&listener).handlers();
        let name = Cow::Owned(listener.name().to_owned());

        let mut guard = self.inner.registrations.write();
        if guard.iter().any(|r| r.is_listener(&listener)) {
            return false;
        }
        debug!(listener = %name, handlers = handlers.len(), "Registered listener");
        Arc::make_mut(&mut guard).push(Registration {
            id: self.inner.next_id(),
            listener: Some(listener),
            name,
            handlers,
        });
        true
    }

    /// Removes every handler of `listener`.
    ///
    /// Returns `false` if the listener was not registered.
    pub fn unregister_listener<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        let mut guard = self.inner.registrations.write();
        let Some(index) = guard.iter().position(|r| r.is_listener(listener)) else {
            return false;
        };
        let removed = Arc::make_mut(&mut guard).remove(index);
        debug!(listener = %removed.name, "Unregistered listener");
        true
    }

    /// Returns `true` if `listener` is registered.
    pub fn is_registered<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.inner
            .registrations
            .read()
            .iter()
            .any(|r| r.is_listener(listener))
    }

    /// Registers a single handler.
    pub fn register(&self, handler: Handler) -> Subscription {
        let id = self.inner.next_id();
        debug!(
            handler = handler.get_name(),
            event = %handler.kind(),
            priority = %handler.get_priority(),
            "Registered handler"
        );
        self.inner.push(Registration {
            id,
            listener: None,
            name: Cow::Owned(handler.get_name().to_owned()),
            handlers: vec![handler],
        });
        self.subscription(id)
    }

    /// Registers a closure for every event accepted by `kind`.
    pub fn register_handler<F>(&self, kind: EventKind, f: F) -> Subscription
    where
        F: Fn(&mut CanonicalEvent) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Handler::new(kind, f))
    }

    /// Registers a closure for the concrete event type `E`.
    pub fn on<E, F>(&self, f: F) -> Subscription
    where
        E: EventVariant,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Handler::typed(f))
    }

    /// Registers a subscriber with filters and expiry.
    pub fn subscribe(&self, subscriber: Subscriber) -> Subscription {
        let id = self.inner.next_id();
        let subscription = self.subscription(id);

        let Subscriber {
            kind,
            priority,
            ignore_cancelled,
            name,
            filters,
            expire_when,
            expire_after,
            callback,
        } = subscriber;

        let handle = subscription.clone();
        let remaining = expire_after.map(AtomicU32::new);
        let wrapped = move |event: &mut CanonicalEvent| -> HandlerResult {
            if !filters.iter().all(|filter| filter(event)) {
                return Ok(());
            }
            if expire_when.iter().any(|predicate| predicate(event)) {
                handle.unsubscribe();
                return Ok(());
            }
            if let Some(remaining) = &remaining {
                match remaining.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    n.checked_sub(1)
                }) {
                    Ok(1) => {
                        handle.unsubscribe();
                    }
                    Ok(_) => {}
                    Err(_) => return Ok(()),
                }
            }
            callback(event)
        };

        let mut handler = Handler::new(kind, wrapped)
            .priority(priority)
            .named(name.clone());
        if ignore_cancelled {
            handler = handler.ignore_cancelled();
        }

        debug!(subscriber = %name, event = %kind, "Registered subscriber");
        self.inner.push(Registration {
            id,
            listener: None,
            name,
            handlers: vec![handler],
        });
        subscription
    }

    fn subscription(&self, id: u64) -> Subscription {
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns `true` if any handler would receive an event of `kind`.
    pub fn subscribed(&self, kind: EventKind) -> bool {
        self.inner
            .registrations
            .read()
            .iter()
            .flat_map(|r| r.handlers.iter())
            .any(|h| h.kind().accepts(kind))
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner
            .registrations
            .read()
            .iter()
            .filter(|r| r.listener.is_some())
            .count()
    }

    /// Returns the number of registered handlers, inline ones included.
    pub fn handler_count(&self) -> usize {
        self.inner
            .registrations
            .read()
            .iter()
            .map(|r| r.handlers.len())
            .sum()
    }

    /// Removes every registration.
    pub fn clear(&self) {
        *self.inner.registrations.write() = Arc::new(Vec::new());
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Dispatches `event` and returns it, possibly mutated by handlers.
    pub fn dispatch(&self, mut event: CanonicalEvent) -> CanonicalEvent {
        let kind = event.kind();
        let span = span!(Level::DEBUG, "dispatch", event = %kind);
        let _enter = span.enter();

        let snapshot = Arc::clone(&self.inner.registrations.read());
        let mut matching: Vec<(&Registration, &Handler)> = snapshot
            .iter()
            .flat_map(|registration| {
                registration
                    .handlers
                    .iter()
                    .filter(|handler| handler.kind().accepts(kind))
                    .map(move |handler| (registration, handler))
            })
            .collect();
        matching.sort_by_key(|(_, handler)| handler.get_priority());

        for (registration, handler) in matching {
            if handler.is_ignoring_cancelled() && event.is_cancelled() {
                trace!(handler = handler.get_name(), "Skipping handler for cancelled event");
                continue;
            }
            self.invoke(kind, registration, handler, &mut event);
        }

        event
    }

    fn invoke(
        &self,
        kind: EventKind,
        registration: &Registration,
        handler: &Handler,
        event: &mut CanonicalEvent,
    ) {
        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| handler.call(event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(
                event = %kind,
                handler = handler.get_name(),
                listener = %registration.name,
                priority = %handler.get_priority(),
                error = %err,
                "Event handler failed"
            ),
            Err(panic) => error!(
                event = %kind,
                handler = handler.get_name(),
                listener = %registration.name,
                priority = %handler.get_priority(),
                panic = panic_message(panic.as_ref()),
                "Event handler panicked"
            ),
        }

        if let Some(threshold) = self.inner.slow_handler_warn {
            let elapsed = started.elapsed();
            if elapsed > threshold {
                warn!(
                    event = %kind,
                    handler = handler.get_name(),
                    listener = %registration.name,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Slow event handler"
                );
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listener_count())
            .field("handler_count", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Cancellable, UserChatEvent, UserConnectEvent, UserDisconnectEvent};
    use mimic_core::User;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use uuid::Uuid;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn chat(message: &str) -> CanonicalEvent {
        UserChatEvent::new(User::new(Uuid::new_v4(), "Steve"), message).into()
    }

    fn record(bus: &EventBus, log: &Log, label: &'static str, priority: Priority) {
        let log = Arc::clone(log);
        bus.register(
            Handler::new(EventKind::UserChat, move |_| {
                log.lock().push(label);
                Ok(())
            })
            .priority(priority),
        );
    }

    #[test]
    fn test_priority_order() {
        let bus = EventBus::new();
        let log = Log::default();
        record(&bus, &log, "low", Priority::Low);
        record(&bus, &log, "high", Priority::High);
        record(&bus, &log, "normal", Priority::Normal);
        record(&bus, &log, "monitor", Priority::Monitor);

        bus.dispatch(chat("hi"));
        assert_eq!(*log.lock(), ["high", "normal", "low", "monitor"]);
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let bus = EventBus::new();
        let log = Log::default();
        record(&bus, &log, "first", Priority::Normal);
        record(&bus, &log, "second", Priority::Normal);
        record(&bus, &log, "third", Priority::Normal);

        bus.dispatch(chat("hi"));
        assert_eq!(*log.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn test_failing_handlers_are_isolated() {
        let bus = EventBus::new();
        bus.register(
            Handler::new(EventKind::UserChat, |_| Err("boom".into())).priority(Priority::Highest),
        );
        bus.register(
            Handler::new(EventKind::UserChat, |_| panic!("handler panic"))
                .priority(Priority::High),
        );
        bus.on::<UserChatEvent, _>(|chat| {
            chat.set_message("rewritten");
            Ok(())
        });

        let event = bus.dispatch(chat("original"));
        let chat = event.downcast_ref::<UserChatEvent>().unwrap();
        assert_eq!(chat.message(), "rewritten");
    }

    #[test]
    fn test_cancellation_is_visible_downstream() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let skipped = Arc::new(AtomicUsize::new(0));

        bus.on::<UserChatEvent, _>(|chat| {
            chat.set_cancelled(true);
            Ok(())
        });
        let observed = Arc::clone(&seen);
        bus.register(
            Handler::new(EventKind::UserChat, move |event| {
                *observed.lock() = Some(event.is_cancelled());
                Ok(())
            })
            .priority(Priority::Monitor),
        );
        let counter = Arc::clone(&skipped);
        bus.register(
            Handler::new(EventKind::UserChat, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .priority(Priority::Low)
            .ignore_cancelled(),
        );

        let event = bus.dispatch(chat("spam"));
        assert!(event.is_cancelled());
        assert_eq!(*seen.lock(), Some(true));
        assert_eq!(skipped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_from_spawned_tasks() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.on::<UserChatEvent, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                tokio::spawn(async move { bus.dispatch(chat("hi")) })
            })
            .collect();
        for task in tasks {
            let event = tokio_test::assert_ok!(task.await);
            assert!(!event.is_cancelled());
        }
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_parent_kind_receives_children() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.register_handler(EventKind::User, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.dispatch(chat("hi"));
        bus.dispatch(UserDisconnectEvent::new(User::new(Uuid::nil(), "Alex")).into());
        bus.dispatch(crate::event::CustomEvent::new("ping", serde_json::Value::Null).into());
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(bus.subscribed(EventKind::UserChat));
        assert!(!bus.subscribed(EventKind::Custom));
    }

    struct Moderation {
        log: Log,
    }

    impl Moderation {
        fn first(&self, _: &mut UserChatEvent) -> HandlerResult {
            self.log.lock().push("first");
            Ok(())
        }

        fn second(&self, _: &mut UserChatEvent) -> HandlerResult {
            self.log.lock().push("second");
            Ok(())
        }

        fn connect(&self, event: &mut UserConnectEvent) -> HandlerResult {
            event.cancel_with("maintenance");
            Ok(())
        }
    }

    impl Listener for Moderation {
        fn handlers(self: Arc<Self>) -> Vec<Handler> {
            vec![
                Handler::bound(&self, Self::first),
                Handler::bound(&self, Self::second),
                Handler::bound(&self, Self::connect).priority(Priority::Lowest),
            ]
        }
    }

    #[test]
    fn test_listener_set_semantics() {
        let bus = EventBus::new();
        let log = Log::default();
        let listener = Arc::new(Moderation {
            log: Arc::clone(&log),
        });

        assert!(bus.register_listener(listener.clone()));
        assert!(!bus.register_listener(listener.clone()));
        assert_eq!(bus.listener_count(), 1);

        bus.dispatch(chat("hi"));
        assert_eq!(*log.lock(), ["first", "second"]);

        let connect = bus.dispatch(UserConnectEvent::new(User::new(Uuid::nil(), "Alex")).into());
        let connect = connect.downcast_ref::<UserConnectEvent>().unwrap();
        assert!(connect.is_cancelled());
        assert_eq!(connect.cancel_reason().plain_text(), "maintenance");

        assert!(bus.unregister_listener(&listener));
        assert!(!bus.unregister_listener(&listener));
        assert_eq!(bus.handler_count(), 0);
    }

    #[test]
    fn test_bound_handlers_are_named_after_their_method() {
        let listener = Arc::new(Moderation {
            log: Log::default(),
        });
        let handlers = listener.handlers();
        let names: Vec<&str> = handlers.iter().map(Handler::get_name).collect();

        assert!(names[0].ends_with("Moderation::first"));
        assert!(names[1].ends_with("Moderation::second"));
        assert!(names[2].ends_with("Moderation::connect"));
    }

    #[test]
    fn test_registration_during_dispatch_uses_snapshot() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let counter = Arc::clone(&count);
        bus.register(
            Handler::new(EventKind::UserChat, move |_| {
                let counter = Arc::clone(&counter);
                inner_bus.register_handler(EventKind::UserChat, move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
                Ok(())
            })
            .priority(Priority::Highest),
        );

        bus.dispatch(chat("one"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        bus.dispatch(chat("two"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscriber_expire_after() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let subscription = bus.subscribe(
            Subscriber::builder(EventKind::UserChat)
                .expire_after(2)
                .handler(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build()
                .unwrap(),
        );

        for _ in 0..4 {
            bus.dispatch(chat("hi"));
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!subscription.is_active());
    }

    #[test]
    fn test_subscriber_filter_and_expire_when() {
        let bus = EventBus::new();
        let log = Log::default();
        let sink = Arc::clone(&log);
        let subscription = bus.subscribe(
            Subscriber::builder(EventKind::UserChat)
                .filter(|event| {
                    event
                        .downcast_ref::<UserChatEvent>()
                        .is_some_and(|chat| chat.message() != "ignored")
                })
                .expire_when(|event| {
                    event
                        .downcast_ref::<UserChatEvent>()
                        .is_some_and(|chat| chat.message() == "stop")
                })
                .handler(move |event| {
                    if let Some(chat) = event.downcast_ref::<UserChatEvent>() {
                        sink.lock().push(if chat.message() == "a" { "a" } else { "b" });
                    }
                    Ok(())
                })
                .build()
                .unwrap(),
        );

        bus.dispatch(chat("a"));
        bus.dispatch(chat("ignored"));
        bus.dispatch(chat("b"));
        assert!(subscription.is_active());
        bus.dispatch(chat("stop"));
        bus.dispatch(chat("a"));

        assert_eq!(*log.lock(), ["a", "b"]);
        assert!(!subscription.is_active());
    }

    #[test]
    fn test_unsubscribe_and_clear() {
        let bus = EventBus::new();
        let subscription = bus.register_handler(EventKind::Any, |_| Ok(()));
        assert!(subscription.is_active());
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());

        bus.register_handler(EventKind::Any, |_| Ok(()));
        bus.clear();
        assert_eq!(bus.handler_count(), 0);
        assert!(!bus.subscribed(EventKind::UserChat));
    }
}
