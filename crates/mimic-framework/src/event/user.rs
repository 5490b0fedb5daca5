//! Events every host raises for its users.

use mimic_core::{Component, User};
use mimic_macros::MappedEvent;

use super::{Cancellable, default_reason};

/// A user is connecting. Cancelling refuses the connection.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(crate = "mimic_core", natives = [
    "org.bukkit.event.player.PlayerLoginEvent",
    "net.md_5.bungee.api.event.PostLoginEvent",
    "net.minestom.server.event.player.AsyncPlayerPreLoginEvent",
    "com.velocitypowered.api.event.connection.LoginEvent",
])]
pub struct UserConnectEvent {
    #[mapped(names = ["getPlayer()", "player"], transform = "mimic.User")]
    user: User,
    #[mapped(names = ["cancelled", "isCancelled()"], platform_specific)]
    cancelled: bool,
    cancel_reason: Option<Component>,
}

impl UserConnectEvent {
    pub fn new(user: User) -> Self {
        Self {
            user,
            cancelled: false,
            cancel_reason: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Cancels the connection, showing `reason` to the user.
    pub fn cancel_with(&mut self, reason: impl Into<Component>) {
        self.cancelled = true;
        self.cancel_reason = Some(reason.into());
    }

    /// Message shown to the user when the connection is refused.
    pub fn cancel_reason(&self) -> Component {
        self.cancel_reason.clone().unwrap_or_else(default_reason)
    }
}

impl Cancellable for UserConnectEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Host glue that removes a user, used when a [`UserConnectEvent`] ends up
/// cancelled. The cancellation flag alone does not carry the reason.
pub trait Disconnector: Send + Sync {
    /// Disconnects `user`, showing `reason`.
    fn disconnect(&self, user: &User, reason: &Component);
}

/// A user sent a chat message. The message may be rewritten by handlers.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(crate = "mimic_core", natives = [
    "org.bukkit.event.player.AsyncPlayerChatEvent",
    "net.md_5.bungee.api.event.ChatEvent",
    "net.minestom.server.event.player.PlayerChatEvent",
    "com.velocitypowered.api.event.player.PlayerChatEvent",
])]
pub struct UserChatEvent {
    #[mapped(names = ["getPlayer()", "getSender()", "player"], transform = "mimic.User")]
    user: User,
    #[mapped(names = ["message", "getMessage()"])]
    message: String,
    #[mapped(names = ["cancelled", "isCancelled()"], platform_specific)]
    cancelled: bool,
}

impl UserChatEvent {
    pub fn new(user: User, message: impl Into<String>) -> Self {
        Self {
            user,
            message: message.into(),
            cancelled: false,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}

impl Cancellable for UserChatEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// A user left.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(crate = "mimic_core", natives = [
    "org.bukkit.event.player.PlayerQuitEvent",
    "net.md_5.bungee.api.event.PlayerDisconnectEvent",
    "net.minestom.server.event.player.PlayerDisconnectEvent",
    "com.velocitypowered.api.event.connection.DisconnectEvent",
])]
pub struct UserDisconnectEvent {
    #[mapped(names = ["getPlayer()", "player"], transform = "mimic.User")]
    user: User,
}

impl UserDisconnectEvent {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}
