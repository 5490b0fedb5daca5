//! Canonical events.
//!
//! Every event a plugin can observe is a variant of the closed
//! [`CanonicalEvent`] enum. Each variant wraps a plain struct that can also be
//! used on its own through the [`EventVariant`] trait:
//!
//! ```rust,ignore
//! bus.on::<UserChatEvent>(|chat| {
//!     if chat.message().contains("spam") {
//!         chat.set_cancelled(true);
//!     }
//!     Ok(())
//! });
//! ```
//!
//! Host-raised events derive `MappedEvent` and list the host-native types they
//! are built from; see [`EventTranslator`](crate::EventTranslator).

mod custom;
mod kind;
mod proxy;
mod server;
mod user;

pub use custom::CustomEvent;
pub use kind::EventKind;
pub use proxy::{ProxyUserConnectedEvent, ProxyUserServerConnectedEvent};
pub use server::{ServerUserGameModeChangeEvent, ServerUserKickEvent};
pub use user::{Disconnector, UserChatEvent, UserConnectEvent, UserDisconnectEvent};

use mimic_core::{Component, User};

/// Reason shown when a host or handler gives none.
pub const DEFAULT_DISCONNECT_REASON: &str = "Disconnected";

fn default_reason() -> Component {
    Component::text(DEFAULT_DISCONNECT_REASON)
}

/// An event that handlers can cancel.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);
}

/// A concrete event type wrapped by one [`CanonicalEvent`] variant.
pub trait EventVariant: Send + Sync + Sized + 'static {
    /// The variant's kind.
    const KIND: EventKind;

    /// Borrows the event out of the enum if the variant matches.
    fn from_event(event: &CanonicalEvent) -> Option<&Self>;

    /// Mutably borrows the event out of the enum if the variant matches.
    fn from_event_mut(event: &mut CanonicalEvent) -> Option<&mut Self>;

    /// Wraps the event into the enum.
    fn into_event(self) -> CanonicalEvent;
}

macro_rules! canonical_events {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// Any event a plugin can observe.
        #[derive(Debug, Clone)]
        pub enum CanonicalEvent {
            $($variant($ty)),+
        }

        impl CanonicalEvent {
            /// Returns the concrete kind.
            pub fn kind(&self) -> EventKind {
                match self {
                    $(Self::$variant(_) => EventKind::$variant),+
                }
            }
        }

        $(
            impl EventVariant for $ty {
                const KIND: EventKind = EventKind::$variant;

                fn from_event(event: &CanonicalEvent) -> Option<&Self> {
                    match event {
                        CanonicalEvent::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn from_event_mut(event: &mut CanonicalEvent) -> Option<&mut Self> {
                    match event {
                        CanonicalEvent::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn into_event(self) -> CanonicalEvent {
                    CanonicalEvent::$variant(self)
                }
            }

            impl From<$ty> for CanonicalEvent {
                fn from(event: $ty) -> Self {
                    CanonicalEvent::$variant(event)
                }
            }
        )+
    };
}

canonical_events! {
    UserConnect(UserConnectEvent),
    UserChat(UserChatEvent),
    UserDisconnect(UserDisconnectEvent),
    ServerUserKick(ServerUserKickEvent),
    ServerUserGameModeChange(ServerUserGameModeChangeEvent),
    ProxyUserConnected(ProxyUserConnectedEvent),
    ProxyUserServerConnected(ProxyUserServerConnectedEvent),
    Custom(CustomEvent),
}

impl CanonicalEvent {
    /// Returns the cancellable view of the event, if it has one.
    pub fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        match self {
            Self::UserConnect(event) => Some(event),
            Self::UserChat(event) => Some(event),
            _ => None,
        }
    }

    fn as_cancellable_mut(&mut self) -> Option<&mut dyn Cancellable> {
        match self {
            Self::UserConnect(event) => Some(event),
            Self::UserChat(event) => Some(event),
            _ => None,
        }
    }

    /// Returns `true` if the event is cancellable and cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.as_cancellable().is_some_and(|event| event.is_cancelled())
    }

    /// Sets the cancellation flag. Returns `false` if the event cannot be
    /// cancelled.
    pub fn set_cancelled(&mut self, cancelled: bool) -> bool {
        match self.as_cancellable_mut() {
            Some(event) => {
                event.set_cancelled(cancelled);
                true
            }
            None => false,
        }
    }

    /// The user the event is about, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::UserConnect(event) => Some(event.user()),
            Self::UserChat(event) => Some(event.user()),
            Self::UserDisconnect(event) => Some(event.user()),
            Self::ServerUserKick(event) => Some(event.user()),
            Self::ServerUserGameModeChange(event) => Some(event.user()),
            Self::ProxyUserConnected(event) => Some(event.user()),
            Self::ProxyUserServerConnected(event) => Some(event.user()),
            Self::Custom(_) => None,
        }
    }

    /// Borrows the concrete event.
    pub fn downcast_ref<E: EventVariant>(&self) -> Option<&E> {
        E::from_event(self)
    }

    /// Mutably borrows the concrete event.
    pub fn downcast_mut<E: EventVariant>(&mut self) -> Option<&mut E> {
        E::from_event_mut(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn steve() -> User {
        User::new(Uuid::new_v4(), "Steve")
    }

    #[test]
    fn test_kind_matches_variant() {
        let event = CanonicalEvent::from(UserChatEvent::new(steve(), "hi"));
        assert_eq!(event.kind(), EventKind::UserChat);
        assert_eq!(event.kind(), UserChatEvent::KIND);
        assert!(event.downcast_ref::<UserChatEvent>().is_some());
        assert!(event.downcast_ref::<UserConnectEvent>().is_none());
    }

    #[test]
    fn test_cancellation_only_on_cancellable_events() {
        let mut chat = CanonicalEvent::from(UserChatEvent::new(steve(), "hi"));
        assert!(chat.set_cancelled(true));
        assert!(chat.is_cancelled());

        let mut quit = CanonicalEvent::from(UserDisconnectEvent::new(steve()));
        assert!(!quit.set_cancelled(true));
        assert!(!quit.is_cancelled());
    }

    #[test]
    fn test_connect_cancel_reason_defaults() {
        let mut connect = UserConnectEvent::new(steve());
        assert_eq!(connect.cancel_reason(), Component::text("Disconnected"));

        connect.cancel_with("Server is full");
        assert!(connect.is_cancelled());
        assert_eq!(connect.cancel_reason().plain_text(), "Server is full");
    }

    #[test]
    fn test_kick_reason_defaults() {
        let kick = ServerUserKickEvent::new(steve(), None);
        assert_eq!(kick.reason().plain_text(), "Disconnected");
    }

    #[test]
    fn test_custom_event_payload() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Score {
            points: u32,
        }

        let event = CustomEvent::with_data("score", &Score { points: 3 }).unwrap();
        assert_eq!(event.name(), "score");
        assert_eq!(event.data::<Score>().unwrap(), Score { points: 3 });
    }
}
