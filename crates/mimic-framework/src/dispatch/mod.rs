//! Event dispatch.
//!
//! - [`Handler`] / [`Listener`]: callbacks and the objects that declare them
//! - [`Subscriber`]: an inline handler with filters and expiry
//! - [`EventBus`]: priority-ordered, fault-isolating dispatch

mod bus;
mod handler;
mod priority;
mod subscriber;

pub use bus::{EventBus, Subscription};
pub use handler::{Callback, Handler, Listener};
pub use priority::Priority;
pub use subscriber::{Predicate, Subscriber, SubscriberBuilder};
