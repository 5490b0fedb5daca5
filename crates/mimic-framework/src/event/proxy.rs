//! Events raised only by proxies.

use mimic_core::User;
use mimic_macros::MappedEvent;

/// A user finished connecting to the proxy and was placed on a server.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(crate = "mimic_core", natives = [
    "net.md_5.bungee.api.event.ServerConnectedEvent",
    "com.velocitypowered.api.event.player.ServerPostConnectEvent",
])]
pub struct ProxyUserConnectedEvent {
    #[mapped(names = ["getPlayer()", "player"], transform = "mimic.User")]
    user: User,
    #[mapped(names = ["getServer()", "server"], transform = "string")]
    server: String,
}

impl ProxyUserConnectedEvent {
    pub fn new(user: User, server: impl Into<String>) -> Self {
        Self {
            user,
            server: server.into(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

/// A user moved between backend servers.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(crate = "mimic_core", natives = [
    "net.md_5.bungee.api.event.ServerSwitchEvent",
    "com.velocitypowered.api.event.player.ServerConnectedEvent",
])]
pub struct ProxyUserServerConnectedEvent {
    #[mapped(names = ["getPlayer()", "player"], transform = "mimic.User")]
    user: User,
    #[mapped(names = ["getServer()", "server"], transform = "string")]
    server: String,
    #[mapped(names = ["getPreviousServer()", "from"], platform_specific, transform = "string")]
    previous_server: Option<String>,
}

impl ProxyUserServerConnectedEvent {
    pub fn new(user: User, server: impl Into<String>, previous_server: Option<String>) -> Self {
        Self {
            user,
            server: server.into(),
            previous_server,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn previous_server(&self) -> Option<&str> {
        self.previous_server.as_deref()
    }
}
