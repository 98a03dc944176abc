use crate::types;
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;

mod config;
mod consts;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

/// WebSocket client for the realtime model endpoint.
///
/// Client events are queued on an mpsc channel and written by a send task;
/// server events are fanned out on a broadcast channel by a receive task.
pub struct Client {
    capacity: usize,
    config: Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, config: Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text)).await {
                    tracing::error!("failed to send message: {}", e);
                }
            }
        });

        let stats = self.stats.clone();
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                };
                match message {
                    Message::Text(text) => {
                        dispatch_server_event(&text, &s_tx, &stats);
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {:?}", bin);
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let close_event = types::ServerEvent::Close {
                            reason: reason.map(|v| format!("{:?}", v)),
                        };
                        if let Err(e) = s_tx.send(close_event) {
                            tracing::error!("failed to send close event: {}", e);
                        }
                        break;
                    }
                    _ => {}
                }
            }
            drop(c_tx);
            drop(s_tx);
        });
        Ok(())
    }

    /// Subscribe to server events.
    pub async fn server_events(&mut self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    /// Snapshot of accumulated token usage.
    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    /// Send a `session.update` event with the given configuration.
    pub async fn update_session(&mut self, config: types::session::Session) -> Result<()> {
        let event = types::ClientEvent::SessionUpdate(
            types::events::client::SessionUpdateEvent::new(config),
        );
        self.send_client_event(event).await
    }

    /// Send a `conversation.item.create` event.
    pub async fn create_conversation_item(&mut self, item: types::Item) -> Result<()> {
        let event = types::ClientEvent::ConversationItemCreate(
            types::events::client::ConversationItemCreateEvent::new(item),
        );
        self.send_client_event(event).await
    }

    /// Send a `response.create` event.
    pub async fn create_response(&mut self) -> Result<()> {
        let event =
            types::ClientEvent::ResponseCreate(types::events::client::ResponseCreateEvent::new());
        self.send_client_event(event).await
    }
}

/// Parses one text frame, records usage from finished responses, and fans the
/// event out to subscribers.
fn dispatch_server_event(text: &str, s_tx: &ServerTx, stats: &Arc<Mutex<Stats>>) {
    let event = match serde_json::from_str::<types::ServerEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
            return;
        }
    };

    if let types::ServerEvent::ResponseDone(done) = &event {
        if let Some(usage) = done.response().usage() {
            tracing::debug!(
                "total_tokens: {}, input_tokens: {}, output_tokens: {}",
                usage.total_tokens(),
                usage.input_tokens(),
                usage.output_tokens()
            );
            if let Ok(mut stats_guard) = stats.lock() {
                stats_guard.update_usage(
                    usage.total_tokens(),
                    usage.input_tokens(),
                    usage.output_tokens(),
                );
            } else {
                tracing::error!("failed to update stats");
            }
        }
    }

    if let Err(e) = s_tx.send(event) {
        tracing::error!("failed to send event: {}", e);
    }
}

pub async fn connect_with_config(capacity: usize, config: Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_with_config_rejects_a_malformed_base_url() {
        let config = Config::builder()
            .with_base_url("not a url")
            .with_api_key("test-key")
            .build();

        let result = connect_with_config(8, config).await;
        assert!(result.is_err());
    }
}
