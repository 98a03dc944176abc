mod client;
mod room;

pub use roomvoice_types as types;

pub use client::{connect_with_config, Client, Config, ConfigBuilder, ServerRx, Stats};
pub use room::{
    connect as connect_room, ParticipantInfo, Room, RoomConfig, RoomConfigBuilder, RoomEvent,
    RoomInfo, RoomRx, TrackInfo, TrackSource, Transcription, TranscriptionSegment,
};
