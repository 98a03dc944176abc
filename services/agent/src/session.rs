//! Session control for one participant encounter.
//!
//! `AgentSession` owns the three behaviors that make up the encounter:
//! launching the model session from a participant's metadata, re-applying
//! configuration when their attributes change, and surfacing anomalous
//! response outcomes as caption notes on the agent's microphone track.

use crate::attributes::{self, SessionConfig};
use crate::config::{Config, CHANNEL_CAPACITY};
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use roomvoice::{
    ParticipantInfo, RoomEvent, TrackInfo, TrackSource, Transcription, TranscriptionSegment,
};
use roomvoice_types::events::server::{ResponseResource, ResponseStatus};
use roomvoice_types::session::Session;
use roomvoice_types::Item;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use tokio::sync::broadcast::error::RecvError;

/// Opening turn injected right after the session is configured.
const OPENING_TURN: &str =
    "Greet the user and begin the conversation as your instructions direct.";

/// Turn injected when the participant changes the `instructions` attribute.
const ACKNOWLEDGMENT_TURN: &str = "Your guidance has just changed. Let your next reply subtly \
     reflect the new way you should behave, without mentioning instructions or settings.";

const INCOMPLETE_RESPONSE_NOTE: &str = "🚫 Response incomplete";
const FAILED_RESPONSE_NOTE: &str = "⚠️ Response failed";

/// The slice of the model connection the session controller drives.
///
/// `#[cfg_attr(test, automock)]` generates `MockModelSession` so the
/// control flow can be tested without a live connection.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait ModelSession {
    async fn update_session(&mut self, session: Session) -> Result<()>;
    async fn create_conversation_item(&mut self, item: Item) -> Result<()>;
    async fn create_response(&mut self) -> Result<()>;
}

#[async_trait]
impl ModelSession for roomvoice::Client {
    async fn update_session(&mut self, session: Session) -> Result<()> {
        roomvoice::Client::update_session(self, session).await
    }

    async fn create_conversation_item(&mut self, item: Item) -> Result<()> {
        roomvoice::Client::create_conversation_item(self, item).await
    }

    async fn create_response(&mut self) -> Result<()> {
        roomvoice::Client::create_response(self).await
    }
}

/// The slice of the room connection the session controller needs: who the
/// agent is, what it has published, and the caption channel.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait LocalParticipant {
    fn identity(&self) -> String;
    fn tracks(&self) -> Result<Vec<TrackInfo>>;
    async fn publish_transcription(&mut self, transcription: Transcription) -> Result<()>;
}

#[async_trait]
impl LocalParticipant for roomvoice::Room {
    fn identity(&self) -> String {
        roomvoice::Room::identity(self).to_string()
    }

    fn tracks(&self) -> Result<Vec<TrackInfo>> {
        roomvoice::Room::local_tracks(self)
    }

    async fn publish_transcription(&mut self, transcription: Transcription) -> Result<()> {
        roomvoice::Room::publish_transcription(self, transcription).await
    }
}

/// Drives the model session for a single participant.
pub struct AgentSession {
    participant_identity: String,
}

impl AgentSession {
    pub fn new(participant_identity: &str) -> Self {
        Self {
            participant_identity: participant_identity.to_string(),
        }
    }

    /// Connects the model client for a participant and brings the session up.
    ///
    /// The participant's metadata must be a flat JSON string map; anything
    /// else fails the launch. A missing or wrong credential is not detected
    /// here, it surfaces as an error event from the endpoint.
    pub async fn launch(
        participant: &ParticipantInfo,
        config: &Config,
    ) -> Result<(Self, roomvoice::Client)> {
        let raw = attributes::parse_metadata(&participant.metadata)?;
        let session_config = attributes::resolve(&raw);

        let mut builder = roomvoice::Config::builder()
            .with_api_key(session_config.api_key.expose_secret());
        if let Some(base_url) = &config.realtime_base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(model) = &config.realtime_model {
            builder = builder.with_model(model);
        }

        let mut client = roomvoice::connect_with_config(CHANNEL_CAPACITY, builder.build()).await?;
        Self::configure_session(&mut client, &session_config).await?;

        Ok((Self::new(&participant.identity), client))
    }

    /// Applies the initial configuration and seeds the first turn.
    pub async fn configure_session(
        model: &mut impl ModelSession,
        config: &SessionConfig,
    ) -> Result<()> {
        model.update_session(config.to_initial_session()).await?;
        model
            .create_conversation_item(Item::user_text(OPENING_TURN))
            .await?;
        model.create_response().await?;
        Ok(())
    }

    /// Reacts to an attribute-change notification.
    ///
    /// Notifications for other participants are ignored. For the bound
    /// participant the changed subset is overlaid on the full current set,
    /// re-resolved, and applied in a single update. A response is always
    /// requested afterwards, whether or not anything recognized changed.
    pub async fn apply_reconfiguration(
        &self,
        model: &mut impl ModelSession,
        participant_identity: &str,
        full_attributes: &HashMap<String, String>,
        changed_attributes: &HashMap<String, String>,
    ) -> Result<()> {
        if participant_identity != self.participant_identity {
            return Ok(());
        }

        let merged = attributes::merge(full_attributes, changed_attributes);
        let session_config = attributes::resolve(&merged);
        tracing::info!(
            "reapplying session config for {} ({} changed keys)",
            participant_identity,
            changed_attributes.len()
        );
        model.update_session(session_config.to_session_update()).await?;

        if changed_attributes.contains_key(attributes::INSTRUCTIONS_ATTRIBUTE) {
            model
                .create_conversation_item(Item::user_text(ACKNOWLEDGMENT_TURN))
                .await?;
        }
        model.create_response().await?;
        Ok(())
    }

    /// Classifies a finished response and, for anomalous outcomes, posts a
    /// note on the agent's microphone track. Missing a microphone track is
    /// not an error; the note is simply dropped.
    pub async fn handle_response_done(
        &self,
        participant: &mut impl LocalParticipant,
        response: &ResponseResource,
    ) -> Result<()> {
        let text = match response.status() {
            ResponseStatus::Incomplete => INCOMPLETE_RESPONSE_NOTE,
            ResponseStatus::Failed => FAILED_RESPONSE_NOTE,
            _ => return Ok(()),
        };
        tracing::warn!(
            "response {} finished with status {:?}",
            response.id().unwrap_or("unknown"),
            response.status()
        );

        let tracks = participant.tracks()?;
        if let Some(microphone) = tracks
            .iter()
            .find(|track| track.source == TrackSource::Microphone)
        {
            let transcription = Transcription {
                participant_identity: participant.identity(),
                track_id: microphone.sid.clone(),
                segments: vec![TranscriptionSegment {
                    id: uuid::Uuid::new_v4().to_string(),
                    text: text.to_string(),
                    start_time: 0,
                    end_time: 0,
                    language: "".to_string(),
                    is_final: true,
                }],
            };
            participant.publish_transcription(transcription).await
        } else {
            tracing::debug!("no microphone track published, dropping response note");
            Ok(())
        }
    }

    /// Dispatches room and model events until the encounter ends.
    ///
    /// Each handler runs to completion before the next event is received,
    /// so configuration updates are applied strictly in arrival order.
    pub async fn run(
        &self,
        room: &mut roomvoice::Room,
        client: &mut roomvoice::Client,
    ) -> Result<()> {
        let mut room_events = room.events().await?;
        let mut server_events = client.server_events().await?;

        loop {
            tokio::select! {
                room_event = room_events.recv() => match room_event {
                    Ok(RoomEvent::ParticipantAttributesChanged {
                        participant_identity,
                        attributes,
                        changed_attributes,
                    }) => {
                        if let Err(e) = self
                            .apply_reconfiguration(
                                client,
                                &participant_identity,
                                &attributes,
                                &changed_attributes,
                            )
                            .await
                        {
                            tracing::error!("failed to apply reconfiguration: {:?}", e);
                        }
                    }
                    Ok(RoomEvent::ParticipantDisconnected { participant_identity }) => {
                        if participant_identity == self.participant_identity {
                            tracing::info!("participant {} left the room", participant_identity);
                            return Ok(());
                        }
                    }
                    Ok(RoomEvent::Close { reason }) => {
                        tracing::info!("room closed: {:?}", reason);
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("lagged {} room events", skipped);
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
                server_event = server_events.recv() => match server_event {
                    Ok(roomvoice::types::ServerEvent::ResponseDone(done)) => {
                        if let Err(e) = self.handle_response_done(room, done.response()).await {
                            tracing::error!("failed to publish response note: {:?}", e);
                        }
                    }
                    Ok(roomvoice::types::ServerEvent::SessionUpdated(updated)) => {
                        tracing::debug!("session updated: {}", updated.session().id());
                    }
                    Ok(roomvoice::types::ServerEvent::Error(error)) => {
                        tracing::error!("model error: {}", error.error().message());
                    }
                    Ok(roomvoice::types::ServerEvent::Close { reason }) => {
                        tracing::info!("model connection closed: {:?}", reason);
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("lagged {} server events", skipped);
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }
}
