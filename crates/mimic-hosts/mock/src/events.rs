//! Native players and events as the simulated host raises them.
//!
//! Server events follow the Bukkit shape (accessors such as `getPlayer()`,
//! a private `cancelled` field behind `isCancelled()`); proxy events follow
//! the Velocity shape (public fields plus accessors).

use std::sync::Arc;

use uuid::Uuid;

use mimic_core::Value;

use crate::object::MockObject;

pub const PLAYER: &str = "mock.entity.Player";
pub const CRAFT_PLAYER: &str = "mock.entity.CraftPlayer";
pub const GAME_MODE: &str = "mock.GameMode";
pub const REGISTERED_SERVER: &str = "mock.proxy.RegisteredServer";

pub const LOGIN: &str = "org.bukkit.event.player.PlayerLoginEvent";
pub const CHAT: &str = "org.bukkit.event.player.AsyncPlayerChatEvent";
pub const QUIT: &str = "org.bukkit.event.player.PlayerQuitEvent";
pub const KICK: &str = "org.bukkit.event.player.PlayerKickEvent";
pub const GAME_MODE_CHANGE: &str = "org.bukkit.event.player.PlayerGameModeChangeEvent";
pub const SERVER_POST_CONNECT: &str = "com.velocitypowered.api.event.player.ServerPostConnectEvent";
pub const SERVER_CONNECTED: &str = "com.velocitypowered.api.event.player.ServerConnectedEvent";

/// A connected player. Its runtime type is [`CRAFT_PLAYER`], a subtype of
/// [`PLAYER`].
pub fn player(id: Uuid, name: &str) -> Value {
    MockObject::new(CRAFT_PLAYER)
        .with_accessor("getUniqueId", id.to_string())
        .with_accessor("getName", name)
        .into_value()
}

pub fn game_mode(name: &str) -> Value {
    MockObject::new(GAME_MODE)
        .with_accessor("name", name)
        .into_value()
}

pub fn server(name: &str) -> Value {
    MockObject::new(REGISTERED_SERVER)
        .with_accessor("getName", name)
        .into_value()
}

fn player_event(type_name: &str, player: &Value) -> MockObject {
    MockObject::new(type_name).with_accessor("getPlayer", player.clone())
}

fn cancellable(event: MockObject) -> MockObject {
    event
        .with_field("cancelled", false)
        .with_getter("isCancelled", "cancelled")
}

pub fn login(player: &Value) -> Arc<MockObject> {
    Arc::new(cancellable(player_event(LOGIN, player)))
}

pub fn chat(player: &Value, message: &str) -> Arc<MockObject> {
    Arc::new(cancellable(
        player_event(CHAT, player)
            .with_field("message", message)
            .with_getter("getMessage", "message"),
    ))
}

pub fn quit(player: &Value) -> Arc<MockObject> {
    Arc::new(player_event(QUIT, player))
}

/// `reason` is a host component, or `None` on hosts that do not expose one.
pub fn kick(player: &Value, reason: Option<Value>) -> Arc<MockObject> {
    let event = player_event(KICK, player);
    Arc::new(match reason {
        Some(reason) => event.with_accessor("getReason", reason),
        None => event,
    })
}

pub fn game_mode_change(player: &Value, mode: &str) -> Arc<MockObject> {
    Arc::new(
        player_event(GAME_MODE_CHANGE, player).with_accessor("getNewGameMode", game_mode(mode)),
    )
}

pub fn server_post_connect(player: &Value, server_name: &str) -> Arc<MockObject> {
    Arc::new(
        MockObject::new(SERVER_POST_CONNECT)
            .with_field("player", player.clone())
            .with_accessor("getServer", server(server_name)),
    )
}

pub fn server_connected(
    player: &Value,
    server_name: &str,
    previous: Option<&str>,
) -> Arc<MockObject> {
    Arc::new(
        MockObject::new(SERVER_CONNECTED)
            .with_field("player", player.clone())
            .with_accessor("getServer", server(server_name))
            .with_accessor("getPreviousServer", previous.map(server)),
    )
}
