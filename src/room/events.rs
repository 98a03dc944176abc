//! Wire protocol between the agent and the room bridge.

use std::collections::HashMap;

/// Messages sent from the room bridge to the agent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// Confirms the join and lists the participants already present.
    #[serde(rename = "room.joined")]
    RoomJoined {
        room: RoomInfo,
        #[serde(default)]
        other_participants: Vec<ParticipantInfo>,
    },
    /// A remote participant connected to the room.
    #[serde(rename = "participant.connected")]
    ParticipantConnected { participant: ParticipantInfo },
    /// A participant's attributes changed. Carries the full current set
    /// and the subset that changed in this notification.
    #[serde(rename = "participant.attributes_changed")]
    ParticipantAttributesChanged {
        participant_identity: String,
        #[serde(default)]
        attributes: HashMap<String, String>,
        #[serde(default)]
        changed_attributes: HashMap<String, String>,
    },
    /// A remote participant disconnected from the room.
    #[serde(rename = "participant.disconnected")]
    ParticipantDisconnected { participant_identity: String },
    /// A participant published a media track.
    #[serde(rename = "track.published")]
    TrackPublished {
        participant_identity: String,
        track: TrackInfo,
    },
    /// Synthetic event emitted when the underlying socket closes.
    #[serde(rename = "close")]
    Close { reason: Option<String> },
}

/// Messages sent from the agent to the room bridge.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum RoomClientEvent {
    /// Publish caption segments on a local track.
    #[serde(rename = "transcription.publish")]
    TranscriptionPublish(Transcription),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoomInfo {
    pub sid: String,
    #[serde(default)]
    pub name: String,
}

/// A room member as seen by the agent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParticipantInfo {
    pub identity: String,
    /// Opaque metadata string set when the participant joined.
    #[serde(default)]
    pub metadata: String,
    /// Key/value attributes, mutable during the encounter.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrackInfo {
    pub sid: String,
    pub source: TrackSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    Microphone,
    Camera,
    ScreenShare,
    #[serde(other)]
    Unknown,
}

/// A batch of caption segments attributed to a participant and track.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Transcription {
    pub participant_identity: String,
    pub track_id: String,
    pub segments: Vec<TranscriptionSegment>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TranscriptionSegment {
    pub id: String,
    pub text: String,
    pub start_time: u64,
    pub end_time: u64,
    pub language: String,
    #[serde(rename = "final")]
    pub is_final: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_joined_defaults_missing_participant_list() {
        let json = r#"{"type":"room.joined","room":{"sid":"RM_1","name":"demo"}}"#;
        let event: RoomEvent = serde_json::from_str(json).unwrap();
        match event {
            RoomEvent::RoomJoined {
                room,
                other_participants,
            } => {
                assert_eq!(room.sid, "RM_1");
                assert!(other_participants.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn attributes_changed_carries_both_maps() {
        let json = r#"{
            "type": "participant.attributes_changed",
            "participant_identity": "user-1",
            "attributes": {"voice": "alloy", "temperature": "0.9"},
            "changed_attributes": {"temperature": "0.9"}
        }"#;
        let event: RoomEvent = serde_json::from_str(json).unwrap();
        match event {
            RoomEvent::ParticipantAttributesChanged {
                participant_identity,
                attributes,
                changed_attributes,
            } => {
                assert_eq!(participant_identity, "user-1");
                assert_eq!(attributes.len(), 2);
                assert_eq!(changed_attributes.get("temperature").unwrap(), "0.9");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_track_source_parses() {
        let track: TrackInfo =
            serde_json::from_str(r#"{"sid":"TR_1","source":"sensor"}"#).unwrap();
        assert_eq!(track.source, TrackSource::Unknown);
        let mic: TrackInfo =
            serde_json::from_str(r#"{"sid":"TR_2","source":"microphone"}"#).unwrap();
        assert_eq!(mic.source, TrackSource::Microphone);
    }

    #[test]
    fn transcription_publish_wire_shape() {
        let event = RoomClientEvent::TranscriptionPublish(Transcription {
            participant_identity: "assistant".to_string(),
            track_id: "TR_9".to_string(),
            segments: vec![TranscriptionSegment {
                id: "seg_1".to_string(),
                text: "note".to_string(),
                start_time: 0,
                end_time: 0,
                language: "".to_string(),
                is_final: true,
            }],
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "transcription.publish");
        assert_eq!(value["track_id"], "TR_9");
        assert_eq!(value["segments"][0]["final"], true);
        assert_eq!(value["segments"][0]["start_time"], 0);
    }
}
