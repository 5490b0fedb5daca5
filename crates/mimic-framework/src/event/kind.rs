//! Event kinds and their hierarchy.

use std::fmt;

/// Discriminator of a [`CanonicalEvent`](super::CanonicalEvent).
///
/// Kinds form a hierarchy rooted at [`EventKind::Any`]. A handler registered
/// for a kind receives every event whose concrete kind descends from it, so a
/// handler for [`EventKind::User`] sees chats, connects and kicks alike.
///
/// ```text
/// Any ─┬─ User ──┬─ UserConnect / UserChat / UserDisconnect
///      │         ├─ (server and proxy user events)
///      ├─ Server ┴─ ServerUserKick / ServerUserGameModeChange
///      ├─ Proxy ─── ProxyUserConnected / ProxyUserServerConnected
///      └─ Custom
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Any,
    User,
    Server,
    Proxy,
    UserConnect,
    UserChat,
    UserDisconnect,
    ServerUserKick,
    ServerUserGameModeChange,
    ProxyUserConnected,
    ProxyUserServerConnected,
    Custom,
}

impl EventKind {
    /// Every kind, abstract ones first.
    pub const ALL: [EventKind; 12] = [
        Self::Any,
        Self::User,
        Self::Server,
        Self::Proxy,
        Self::UserConnect,
        Self::UserChat,
        Self::UserDisconnect,
        Self::ServerUserKick,
        Self::ServerUserGameModeChange,
        Self::ProxyUserConnected,
        Self::ProxyUserServerConnected,
        Self::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::User => "user",
            Self::Server => "server",
            Self::Proxy => "proxy",
            Self::UserConnect => "user_connect",
            Self::UserChat => "user_chat",
            Self::UserDisconnect => "user_disconnect",
            Self::ServerUserKick => "server_user_kick",
            Self::ServerUserGameModeChange => "server_user_game_mode_change",
            Self::ProxyUserConnected => "proxy_user_connected",
            Self::ProxyUserServerConnected => "proxy_user_server_connected",
            Self::Custom => "custom",
        }
    }

    /// Direct parents in the hierarchy.
    pub fn parents(self) -> &'static [EventKind] {
        match self {
            Self::Any => &[],
            Self::User | Self::Server | Self::Proxy | Self::Custom => &[Self::Any],
            Self::UserConnect | Self::UserChat | Self::UserDisconnect => &[Self::User],
            Self::ServerUserKick | Self::ServerUserGameModeChange => &[Self::Server, Self::User],
            Self::ProxyUserConnected | Self::ProxyUserServerConnected => &[Self::Proxy, Self::User],
        }
    }

    /// Returns `true` for grouping kinds that no event is an instance of.
    pub fn is_abstract(self) -> bool {
        matches!(self, Self::Any | Self::User | Self::Server | Self::Proxy)
    }

    /// Returns `true` if a handler for `self` receives events of kind
    /// `concrete`.
    pub fn accepts(self, concrete: EventKind) -> bool {
        self == concrete
            || concrete
                .parents()
                .iter()
                .any(|parent| self.accepts(*parent))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_accepts_everything() {
        assert!(EventKind::ALL.iter().all(|kind| EventKind::Any.accepts(*kind)));
    }

    #[test]
    fn test_server_events_are_user_events() {
        assert!(EventKind::User.accepts(EventKind::ServerUserKick));
        assert!(EventKind::Server.accepts(EventKind::ServerUserKick));
        assert!(EventKind::User.accepts(EventKind::ProxyUserServerConnected));
        assert!(!EventKind::Server.accepts(EventKind::UserChat));
        assert!(!EventKind::UserChat.accepts(EventKind::User));
        assert!(!EventKind::User.accepts(EventKind::Custom));
    }
}
