//! # Mimic Mock Host
//!
//! An in-memory host runtime for exercising Mimic without a game server.
//!
//! [`MockHost`] resolves a full copy of the presentation family, either under
//! its usual package or relocated, and can drop individual types to simulate
//! an older host. [`events`] builds native players and events shaped like the
//! ones real servers and proxies raise.
//!
//! ```rust,ignore
//! use mimic_host_mock::{MockHost, events};
//!
//! let host = Arc::new(MockHost::new());
//! MockHost::install(&registry)?;
//!
//! let player = events::player(Uuid::new_v4(), "Steve");
//! let native = events::chat(&player, "hello");
//! ```

pub mod adventure;
pub mod events;
mod host;
mod object;

pub use adventure::{MockType, adventure_types};
pub use host::{MockHost, PLATFORM, game_mode_to_canonical, player_to_user, server_to_name};
pub use object::MockObject;
