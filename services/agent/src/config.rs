//! Application Configuration Module
//!
//! Centralizes configuration for the agent service. Settings are loaded
//! from environment variables once at startup and passed to the rest of
//! the application as a single struct.

use std::env;
use tracing::Level;

// --- Application Constants ---

/// Capacity of the event channels backing the room and model connections.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub room_url: String,
    pub room_token: String,
    pub room_identity: String,
    pub realtime_base_url: Option<String>,
    pub realtime_model: Option<String>,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `ROOM_URL`: (Optional) The room bridge to join. Defaults to "ws://localhost:7880".
    // *   `ROOM_TOKEN`: The join token for the room. Required.
    // *   `ROOM_IDENTITY`: (Optional) The identity to join under. Defaults to "assistant".
    // *   `REALTIME_BASE_URL`: (Optional) Overrides the model endpoint base URL.
    // *   `REALTIME_MODEL`: (Optional) Overrides the realtime model name.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();

        let room_url = env::var("ROOM_URL").unwrap_or_else(|_| "ws://localhost:7880".to_string());
        let room_token = env::var("ROOM_TOKEN")
            .map_err(|_| ConfigError::MissingVar("ROOM_TOKEN must be set".to_string()))?;
        let room_identity = env::var("ROOM_IDENTITY").unwrap_or_else(|_| "assistant".to_string());

        let realtime_base_url = env::var("REALTIME_BASE_URL").ok();
        let realtime_model = env::var("REALTIME_MODEL").ok();

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            room_url,
            room_token,
            room_identity,
            realtime_base_url,
            realtime_model,
            log_level,
        })
    }
}
