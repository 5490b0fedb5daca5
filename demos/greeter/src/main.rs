//! Greeter Example
//!
//! A small plugin written only against canonical Mimic types, run on the
//! simulated host from `mimic-host-mock`.
//!
//! The plugin:
//! - turns away banned players at login, with a red disconnect message
//! - greets everyone else once the login went through
//! - censors chat and drops chat commands
//! - announces the number of online players on a repeating task
//!
//! # Usage
//!
//! ```bash
//! cargo run --package greeter -- --players 4 --banned Herobrine
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mimic::prelude::*;
use mimic_host_mock::{MockHost, MockObject, events};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "greeter", about = "Run the greeter plugin on a simulated server")]
struct Args {
    /// Configuration file (defaults to ./mimic.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulate a host that relocated the presentation library
    #[arg(long)]
    shaded: bool,

    /// Number of players joining
    #[arg(short, long, default_value_t = 3)]
    players: usize,

    /// Player names refused at login
    #[arg(long, value_delimiter = ',')]
    banned: Vec<String>,

    /// Seconds between announcements
    #[arg(long, default_value_t = 2)]
    announce_every: u64,
}

// ============================================================================
// Plugin
// ============================================================================

const CENSORED: &[&str] = &["creeper", "griefing"];

struct Greeter {
    banned: Vec<String>,
    online: AtomicU32,
}

impl Greeter {
    fn new(banned: Vec<String>) -> Self {
        Self {
            banned,
            online: AtomicU32::new(0),
        }
    }

    fn check_ban(&self, event: &mut UserConnectEvent) -> HandlerResult {
        let name = event.user().name();
        if self.banned.iter().any(|b| b.eq_ignore_ascii_case(name)) {
            let reason = Component::text("You are banned from this server").color(NamedColor::Red);
            event.cancel_with(reason);
        }
        Ok(())
    }

    fn welcome(&self, event: &mut UserConnectEvent) -> HandlerResult {
        let online = self.online.fetch_add(1, Ordering::SeqCst) + 1;
        info!(user = event.user().name(), online, "Welcome!");
        Ok(())
    }

    fn farewell(&self, event: &mut UserDisconnectEvent) -> HandlerResult {
        // Quits for logins we never saw must not wrap the counter.
        let _ = self
            .online
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        info!(user = event.user().name(), "Goodbye");
        Ok(())
    }

    fn moderate_chat(&self, event: &mut UserChatEvent) -> HandlerResult {
        if event.message().starts_with('!') {
            event.set_cancelled(true);
            return Ok(());
        }
        let mut message = event.message().to_owned();
        for word in CENSORED {
            message = message.replace(word, &"*".repeat(word.len()));
        }
        event.set_message(message);
        Ok(())
    }

    fn log_chat(&self, event: &mut UserChatEvent) -> HandlerResult {
        info!(user = event.user().name(), message = event.message(), "<chat>");
        Ok(())
    }

    fn log_game_mode(&self, event: &mut ServerUserGameModeChangeEvent) -> HandlerResult {
        info!(
            user = event.user().name(),
            mode = %event.new_game_mode(),
            "Game mode changed"
        );
        Ok(())
    }
}

impl Listener for Greeter {
    fn handlers(self: Arc<Self>) -> Vec<Handler> {
        vec![
            Handler::bound(&self, Self::check_ban).priority(Priority::Highest),
            Handler::bound(&self, Self::welcome)
                .priority(Priority::Monitor)
                .ignore_cancelled(),
            Handler::bound(&self, Self::farewell),
            Handler::bound(&self, Self::moderate_chat).priority(Priority::Low),
            Handler::bound(&self, Self::log_chat)
                .priority(Priority::Monitor)
                .ignore_cancelled(),
            Handler::bound(&self, Self::log_game_mode),
        ]
    }

    fn name(&self) -> &str {
        "greeter"
    }
}

// ============================================================================
// Simulated server
// ============================================================================

const NAMES: &[&str] = &["Steve", "Alex", "Herobrine", "Notch", "Jeb", "Dinnerbone"];

fn simulate_player(mimic: &Mimic, name: &str) {
    let player = events::player(Uuid::new_v4(), name);

    let login = events::login(&player);
    mimic.handle_native_event(login.as_ref());
    if login.get("cancelled").as_bool() == Some(true) {
        warn!(user = name, "Login refused by a plugin");
        return;
    }

    for message in ["hello there", "watch out for the creeper", "!tp spawn"] {
        let chat = events::chat(&player, message);
        mimic.handle_native_event(chat.as_ref());
    }
    mimic.handle_native_event(events::game_mode_change(&player, "CREATIVE").as_ref());
}

fn simulate_quit(mimic: &Mimic, name: &str) {
    let player = events::player(Uuid::new_v4(), name);
    mimic.handle_native_event(events::quit(&player).as_ref());
}

fn send_title(mimic: &Mimic, online: u32) -> Result<()> {
    let title = Title::new(
        Component::text("Mimic").color(NamedColor::Gold),
        Component::text(format!("{online} online")),
    );
    let native = mimic
        .bridge()
        .to_host(&title)
        .context("Failed to convert title for the host")?;
    if let Some(object) = native.downcast_ref::<MockObject>() {
        info!(title = ?object, "Sent title");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let host = if args.shaded {
        MockHost::shaded()
    } else {
        MockHost::new()
    };

    let mut builder = Mimic::builder(Arc::new(host)).transformers(MockHost::install);
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let mimic = builder.build()?;

    let greeter = Arc::new(Greeter::new(args.banned.clone()));
    mimic.register_listener(greeter.clone());

    mimic.bus().on::<CustomEvent, _>(|event| {
        info!(name = event.name(), payload = %event.payload(), "Custom event");
        Ok(())
    });

    let announcer = Arc::clone(&greeter);
    let announcements = Task::builder(move || {
        info!(online = announcer.online.load(Ordering::SeqCst), "Announcement");
    })
    .asynchronous()
    .repeat(Schedule::seconds(args.announce_every))
    .build();
    mimic.schedule(&announcements)?;

    for name in NAMES.iter().cycle().take(args.players) {
        simulate_player(&mimic, name);
    }
    if let Some(first) = NAMES.first().filter(|_| args.players > 1) {
        simulate_quit(&mimic, first);
    }
    send_title(&mimic, greeter.online.load(Ordering::SeqCst))?;

    mimic.post(CustomEvent::new(
        "greeter:summary",
        serde_json::json!({ "online": greeter.online.load(Ordering::SeqCst) }),
    ));

    info!("Running until Ctrl+C");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = tokio::time::sleep(Duration::from_secs(args.announce_every * 3 + 1)) => {}
    }

    announcements.cancel();
    mimic.shutdown();
    Ok(())
}
