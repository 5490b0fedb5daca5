//! Events raised only by game servers.

use mimic_core::{Component, GameMode, User};
use mimic_macros::MappedEvent;

use super::default_reason;

/// A user was kicked from the server.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(crate = "mimic_core", natives = [
    "org.bukkit.event.player.PlayerKickEvent",
    "net.minestom.server.event.player.PlayerKickEvent",
])]
pub struct ServerUserKickEvent {
    #[mapped(names = ["getPlayer()", "player"], transform = "mimic.User")]
    user: User,
    #[mapped(names = ["reason", "getReason()"], platform_specific, transform = "mimic.Component")]
    reason: Option<Component>,
}

impl ServerUserKickEvent {
    pub fn new(user: User, reason: Option<Component>) -> Self {
        Self { user, reason }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// The kick message, `"Disconnected"` when the host gave none.
    pub fn reason(&self) -> Component {
        self.reason.clone().unwrap_or_else(default_reason)
    }
}

/// A user's game mode is changing.
#[derive(Debug, Clone, MappedEvent)]
#[mapped(
    crate = "mimic_core",
    natives = ["org.bukkit.event.player.PlayerGameModeChangeEvent"]
)]
pub struct ServerUserGameModeChangeEvent {
    #[mapped(names = ["getPlayer()", "player"], transform = "mimic.User")]
    user: User,
    #[mapped(names = ["getNewGameMode()", "newGameMode"], transform = "mimic.GameMode")]
    new_game_mode: GameMode,
}

impl ServerUserGameModeChangeEvent {
    pub fn new(user: User, new_game_mode: GameMode) -> Self {
        Self {
            user,
            new_game_mode,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn new_game_mode(&self) -> GameMode {
        self.new_game_mode
    }
}
