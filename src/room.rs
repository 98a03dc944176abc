use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;

mod config;
mod consts;
mod events;
mod utils;

pub use config::{RoomConfig, RoomConfigBuilder};
pub use events::{
    ParticipantInfo, RoomEvent, RoomInfo, TrackInfo, TrackSource, Transcription,
    TranscriptionSegment,
};

use events::RoomClientEvent;

type RoomClientTx = tokio::sync::mpsc::Sender<RoomClientEvent>;
type RoomEventTx = tokio::sync::broadcast::Sender<RoomEvent>;
pub type RoomRx = tokio::sync::broadcast::Receiver<RoomEvent>;

/// WebSocket client for the room bridge.
///
/// Same shape as the model client: outbound events are queued on an mpsc
/// channel and written by a send task; room events are fanned out on a
/// broadcast channel by a receive task. The receive task also keeps
/// registries of remote participants and local track publications, so a
/// subscriber that arrives late can still discover who is already there.
pub struct Room {
    capacity: usize,
    config: RoomConfig,
    c_tx: Option<RoomClientTx>,
    e_tx: Option<RoomEventTx>,
    remote_participants: Arc<Mutex<Vec<ParticipantInfo>>>,
    local_tracks: Arc<Mutex<Vec<TrackInfo>>>,
}

impl Room {
    fn new(capacity: usize, config: RoomConfig) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            e_tx: None,
            remote_participants: Arc::new(Mutex::new(Vec::new())),
            local_tracks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already joined"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (e_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.e_tx = Some(e_tx.clone());

        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send room message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize room event: {}", e);
                    }
                }
            }
        });

        let local_identity = self.config.identity().to_string();
        let remote_participants = self.remote_participants.clone();
        let local_tracks = self.local_tracks.clone();
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read room message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => match serde_json::from_str::<RoomEvent>(&text) {
                        Ok(event) => {
                            track_room_state(
                                &event,
                                &local_identity,
                                &remote_participants,
                                &local_tracks,
                            );
                            if let Err(e) = e_tx.send(event) {
                                tracing::error!("failed to send room event: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::error!(
                                "failed to deserialize room event: {}, text=> {:?}",
                                e,
                                text
                            );
                        }
                    },
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary room message: {:?}", bin);
                    }
                    Message::Close(reason) => {
                        tracing::info!("room connection closed: {:?}", reason);
                        let close_event = RoomEvent::Close {
                            reason: reason.map(|v| format!("{:?}", v)),
                        };
                        if let Err(e) = e_tx.send(close_event) {
                            tracing::error!("failed to send room close event: {}", e);
                        }
                        break;
                    }
                    _ => {}
                }
            }
            drop(c_tx);
            drop(e_tx);
        });
        Ok(())
    }

    /// Subscribe to room events.
    pub async fn events(&mut self) -> Result<RoomRx> {
        match self.e_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not joined yet")),
        }
    }

    /// The identity this client joined the room under.
    pub fn identity(&self) -> &str {
        self.config.identity()
    }

    /// Snapshot of tracks published under the local identity.
    pub fn local_tracks(&self) -> Result<Vec<TrackInfo>> {
        if let Ok(tracks) = self.local_tracks.lock() {
            Ok(tracks.clone())
        } else {
            Err(anyhow::anyhow!("failed to read local tracks"))
        }
    }

    /// Snapshot of remote participants currently in the room.
    pub fn remote_participants(&self) -> Result<Vec<ParticipantInfo>> {
        if let Ok(remotes) = self.remote_participants.lock() {
            Ok(remotes.clone())
        } else {
            Err(anyhow::anyhow!("failed to read participants"))
        }
    }

    /// Wait until a remote participant is present, returning the first one.
    ///
    /// Checks the registry after subscribing, so a participant who joined
    /// before this call is returned immediately.
    pub async fn wait_for_participant(&mut self) -> Result<ParticipantInfo> {
        let mut events = self.events().await?;
        if let Some(participant) = self.first_remote()? {
            return Ok(participant);
        }
        loop {
            match events.recv().await {
                Ok(RoomEvent::ParticipantConnected { participant }) => {
                    if participant.identity != self.config.identity() {
                        return Ok(participant);
                    }
                }
                Ok(RoomEvent::Close { reason }) => {
                    return Err(anyhow::anyhow!(
                        "room closed while waiting for a participant: {:?}",
                        reason
                    ));
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("lagged {} room events while waiting", skipped);
                    if let Some(participant) = self.first_remote()? {
                        return Ok(participant);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return Err(anyhow::anyhow!("room connection closed"));
                }
            }
        }
    }

    fn first_remote(&self) -> Result<Option<ParticipantInfo>> {
        if let Ok(remotes) = self.remote_participants.lock() {
            Ok(remotes
                .iter()
                .find(|p| p.identity != self.config.identity())
                .cloned())
        } else {
            Err(anyhow::anyhow!("failed to read participants"))
        }
    }

    async fn send_room_event(&mut self, event: RoomClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not joined yet")),
        }
    }

    /// Send a `transcription.publish` event.
    pub async fn publish_transcription(&mut self, transcription: Transcription) -> Result<()> {
        self.send_room_event(RoomClientEvent::TranscriptionPublish(transcription))
            .await
    }
}

fn track_room_state(
    event: &RoomEvent,
    local_identity: &str,
    remote_participants: &Arc<Mutex<Vec<ParticipantInfo>>>,
    local_tracks: &Arc<Mutex<Vec<TrackInfo>>>,
) {
    match event {
        RoomEvent::RoomJoined {
            room,
            other_participants,
        } => {
            tracing::info!(
                "joined room {} with {} participants",
                room.name,
                other_participants.len()
            );
            if let Ok(mut remotes) = remote_participants.lock() {
                remotes.extend(other_participants.iter().cloned());
            }
        }
        RoomEvent::ParticipantConnected { participant } => {
            tracing::info!("participant connected: {}", participant.identity);
            if participant.identity != local_identity {
                if let Ok(mut remotes) = remote_participants.lock() {
                    remotes.push(participant.clone());
                }
            }
        }
        RoomEvent::ParticipantAttributesChanged {
            participant_identity,
            attributes,
            ..
        } => {
            if let Ok(mut remotes) = remote_participants.lock() {
                if let Some(participant) = remotes
                    .iter_mut()
                    .find(|p| p.identity == *participant_identity)
                {
                    participant.attributes = attributes.clone();
                }
            }
        }
        RoomEvent::ParticipantDisconnected {
            participant_identity,
        } => {
            tracing::info!("participant disconnected: {}", participant_identity);
            if let Ok(mut remotes) = remote_participants.lock() {
                remotes.retain(|p| p.identity != *participant_identity);
            }
        }
        RoomEvent::TrackPublished {
            participant_identity,
            track,
        } => {
            if participant_identity == local_identity {
                if let Ok(mut tracks) = local_tracks.lock() {
                    tracks.push(track.clone());
                }
            }
        }
        RoomEvent::Close { .. } => {}
    }
}

/// Join a room with an explicit configuration.
pub async fn connect(capacity: usize, config: RoomConfig) -> Result<Room> {
    let mut room = Room::new(capacity, config);
    room.connect().await?;
    Ok(room)
}
