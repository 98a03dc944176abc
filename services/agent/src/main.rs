mod attributes;
mod config;
mod session;

use crate::config::{Config, CHANNEL_CAPACITY};
use crate::session::AgentSession;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
struct Cli {
    /// Room bridge URL, overriding the environment.
    #[arg(long)]
    room_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting room agent...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    if let Some(room_url) = args.room_url {
        config.room_url = room_url;
    }

    // --- 4. Join the Room ---
    let room_config = roomvoice::RoomConfig::builder()
        .with_url(&config.room_url)
        .with_token(&config.room_token)
        .with_identity(&config.room_identity)
        .build();
    let mut room = roomvoice::connect_room(CHANNEL_CAPACITY, room_config)
        .await
        .context("Failed to join room")?;
    tracing::info!("Joined room as {}", room.identity());

    // --- 5. Wait for a Participant and Launch the Session ---
    let participant = room
        .wait_for_participant()
        .await
        .context("Failed waiting for a participant")?;
    tracing::info!("Driving session for participant {}", participant.identity);

    let (agent, mut client) = AgentSession::launch(&participant, &config)
        .await
        .context("Failed to launch session")?;

    // --- 6. Run Until the Encounter Ends ---
    tokio::select! {
        result = agent.run(&mut room, &mut client) => {
            result.context("Session loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }

    if let Ok(stats) = client.stats() {
        tracing::info!(
            "Session usage: total_tokens={}, input_tokens={}, output_tokens={}",
            stats.total_tokens(),
            stats.input_tokens(),
            stats.output_tokens()
        );
    }
    tracing::info!("Shutting down...");
    Ok(())
}
