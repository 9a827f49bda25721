mod config;
mod control;
mod game;
mod input;
mod lifecycle;
mod runtime;
mod score;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, Level};

use crate::config::GameConfig;
use crate::control::command::LoggingSink;
use crate::input::controller::ChannelLink;
use crate::runtime::GameRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("KotH drone core v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let cfg = GameConfig::load_or_default();
    cfg.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: hill {}..{} cm, enemy {}/{}/{} cm, magazine {}",
        cfg.hill_min_distance,
        cfg.hill_max_distance,
        cfg.enemy_min_distance,
        cfg.enemy_shooting_distance,
        cfg.enemy_max_distance,
        cfg.magazine_capacity
    );

    // The controller decoder and the flight transport plug in here; the
    // feed stays alive so the link reports timeouts, not a disconnect.
    let (link, _controller_feed) = ChannelLink::new(64);
    let sink = Arc::new(LoggingSink);

    let runtime = GameRuntime::spawn(cfg, link, sink);
    runtime.start_match();

    // Run until a terminal outcome or Ctrl+C
    let mut outcome_rx = runtime.outcome();
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received");
    };

    tokio::select! {
        _ = outcome_rx.changed() => {
            if let Some(outcome) = *outcome_rx.borrow() {
                info!("Terminal outcome: {:?}", outcome);
            }
        }
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    runtime.shutdown().await;
    info!("Stopped");

    Ok(())
}
