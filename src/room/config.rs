use crate::room::consts::{DEFAULT_IDENTITY, DEFAULT_URL, ROOM_IDENTITY, ROOM_TOKEN, ROOM_URL};
use secrecy::SecretString;

/// Connection settings for the room bridge.
pub struct RoomConfig {
    url: String,
    token: SecretString,
    identity: String,
}

pub struct RoomConfigBuilder {
    config: RoomConfig,
}

impl RoomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RoomConfig::new(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.config.url = url.to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.config.token = SecretString::from(token.to_string());
        self
    }

    pub fn with_identity(mut self, identity: &str) -> Self {
        self.config.identity = identity.to_string();
        self
    }

    pub fn build(self) -> RoomConfig {
        self.config
    }
}

impl RoomConfig {
    /// Defaults: local bridge, join token from the environment.
    pub fn new() -> Self {
        Self {
            url: std::env::var(ROOM_URL).unwrap_or_else(|_| DEFAULT_URL.to_string()),
            token: std::env::var(ROOM_TOKEN)
                .unwrap_or_else(|_| "".to_string())
                .into(),
            identity: std::env::var(ROOM_IDENTITY).unwrap_or_else(|_| DEFAULT_IDENTITY.to_string()),
        }
    }

    pub fn builder() -> RoomConfigBuilder {
        RoomConfigBuilder::new()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}
