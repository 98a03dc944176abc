//! Participant attribute resolution.
//!
//! Participants describe the session they want through string key/value
//! attributes. `resolve` turns any such map into a typed `SessionConfig`,
//! substituting defaults for missing or unrecognized values so a partial
//! map never aborts a session.

use anyhow::{Context, Result};
use roomvoice_types::audio::{
    AudioFormat, InputAudioTranscription, ServerVadOptions, TurnDetection, Voice,
};
use roomvoice_types::session::Session;
use secrecy::SecretString;
use std::collections::HashMap;

pub const API_KEY_ATTRIBUTE: &str = "openai_api_key";
pub const INSTRUCTIONS_ATTRIBUTE: &str = "instructions";
pub const VOICE_ATTRIBUTE: &str = "voice";
pub const TEMPERATURE_ATTRIBUTE: &str = "temperature";
pub const MAX_OUTPUT_TOKENS_ATTRIBUTE: &str = "max_output_tokens";
pub const MODALITIES_ATTRIBUTE: &str = "modalities";
pub const TURN_DETECTION_TYPE_ATTRIBUTE: &str = "turn_detection_type";
pub const VAD_THRESHOLD_ATTRIBUTE: &str = "vad_threshold";
pub const VAD_PREFIX_PADDING_MS_ATTRIBUTE: &str = "vad_prefix_padding_ms";
pub const VAD_SILENCE_DURATION_MS_ATTRIBUTE: &str = "vad_silence_duration_ms";

const DEFAULT_TEMPERATURE: &str = "0.8";

/// Output channels the model is allowed to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modalities {
    TextOnly,
    TextAndAudio,
}

impl Modalities {
    pub fn to_wire(self) -> Vec<String> {
        match self {
            Modalities::TextOnly => vec!["text".to_string()],
            Modalities::TextAndAudio => vec!["text".to_string(), "audio".to_string()],
        }
    }
}

/// The session shape a participant asked for, resolved from attributes.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: SecretString,
    pub instructions: String,
    pub voice: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub modalities: Modalities,
    pub turn_detection: TurnDetection,
}

impl SessionConfig {
    /// Session payload for the initial `session.update` after connecting.
    pub fn to_initial_session(&self) -> Session {
        let mut builder = Session::builder()
            .with_modalities(self.modalities.to_wire())
            .with_instructions(&self.instructions)
            .with_voice(Voice::from(self.voice.as_str()))
            .with_input_audio_format(AudioFormat::Pcm16)
            .with_output_audio_format(AudioFormat::Pcm16)
            .with_input_audio_transcription(InputAudioTranscription::default())
            .with_turn_detection(self.turn_detection.clone())
            .with_temperature(self.temperature);
        if let Some(max_output_tokens) = self.max_output_tokens {
            builder = builder.with_max_output_tokens(max_output_tokens);
        }
        builder.build()
    }

    /// Session payload for mid-session reconfiguration.
    ///
    /// Voice and the audio formats are pinned once the session is live and
    /// must not appear in the update.
    pub fn to_session_update(&self) -> Session {
        let mut builder = Session::builder()
            .with_modalities(self.modalities.to_wire())
            .with_instructions(&self.instructions)
            .with_turn_detection(self.turn_detection.clone())
            .with_temperature(self.temperature);
        if let Some(max_output_tokens) = self.max_output_tokens {
            builder = builder.with_max_output_tokens(max_output_tokens);
        }
        builder.build()
    }
}

/// Parses the opaque metadata string a participant joined with.
///
/// Unlike attribute resolution this is allowed to fail: metadata that is
/// not a flat JSON string map aborts the launch.
pub fn parse_metadata(metadata: &str) -> Result<HashMap<String, String>> {
    serde_json::from_str(metadata).context("participant metadata is not a flat string map")
}

/// Overlays the changed attribute subset onto the full current set.
/// Changed keys win on conflict.
pub fn merge(
    full: &HashMap<String, String>,
    changed: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = full.clone();
    merged.extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Resolves a raw attribute map into a `SessionConfig`. Total: every field
/// has a default, so this never fails. A non-numeric temperature resolves
/// to NaN rather than an error; callers that care must check for it.
pub fn resolve(raw: &HashMap<String, String>) -> SessionConfig {
    let api_key = raw.get(API_KEY_ATTRIBUTE).cloned().unwrap_or_default();
    let instructions = raw.get(INSTRUCTIONS_ATTRIBUTE).cloned().unwrap_or_default();
    let voice = raw.get(VOICE_ATTRIBUTE).cloned().unwrap_or_default();

    let temperature = raw
        .get(TEMPERATURE_ATTRIBUTE)
        .map(String::as_str)
        .unwrap_or(DEFAULT_TEMPERATURE)
        .parse::<f32>()
        .unwrap_or(f32::NAN);

    let max_output_tokens = raw
        .get(MAX_OUTPUT_TOKENS_ATTRIBUTE)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&tokens| tokens > 0);

    let modalities = match raw.get(MODALITIES_ATTRIBUTE).map(String::as_str) {
        Some("text_only") => Modalities::TextOnly,
        _ => Modalities::TextAndAudio,
    };

    SessionConfig {
        api_key: SecretString::from(api_key),
        instructions,
        voice,
        temperature,
        max_output_tokens,
        modalities,
        turn_detection: resolve_turn_detection(raw),
    }
}

fn resolve_turn_detection(raw: &HashMap<String, String>) -> TurnDetection {
    if raw.get(TURN_DETECTION_TYPE_ATTRIBUTE).map(String::as_str) == Some("none") {
        return TurnDetection::None;
    }
    let mut options = ServerVadOptions::default();
    if let Some(threshold) = raw
        .get(VAD_THRESHOLD_ATTRIBUTE)
        .and_then(|v| v.parse::<f32>().ok())
    {
        options = options.with_threshold(threshold);
    }
    if let Some(prefix_padding_ms) = raw
        .get(VAD_PREFIX_PADDING_MS_ATTRIBUTE)
        .and_then(|v| v.parse::<u32>().ok())
    {
        options = options.with_prefix_padding_ms(prefix_padding_ms);
    }
    if let Some(silence_duration_ms) = raw
        .get(VAD_SILENCE_DURATION_MS_ATTRIBUTE)
        .and_then(|v| v.parse::<u32>().ok())
    {
        options = options.with_silence_duration_ms(silence_duration_ms);
    }
    TurnDetection::ServerVad(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_resolves_to_documented_defaults() {
        let config = resolve(&HashMap::new());
        assert_eq!(config.api_key.expose_secret(), "");
        assert_eq!(config.instructions, "");
        assert_eq!(config.voice, "");
        assert_eq!(config.temperature, 0.8);
        assert_eq!(config.max_output_tokens, None);
        assert_eq!(config.modalities, Modalities::TextAndAudio);
        assert_eq!(
            config.turn_detection,
            TurnDetection::ServerVad(ServerVadOptions::default())
        );
    }

    #[test]
    fn text_only_is_the_single_narrow_modality() {
        let config = resolve(&raw(&[("modalities", "text_only")]));
        assert_eq!(config.modalities, Modalities::TextOnly);

        let config = resolve(&raw(&[("modalities", "text_and_audio")]));
        assert_eq!(config.modalities, Modalities::TextAndAudio);

        let config = resolve(&raw(&[("modalities", "garbage")]));
        assert_eq!(config.modalities, Modalities::TextAndAudio);
    }

    #[test]
    fn turn_detection_none_wins_over_vad_keys() {
        let config = resolve(&raw(&[
            ("turn_detection_type", "none"),
            ("vad_threshold", "0.5"),
            ("vad_silence_duration_ms", "700"),
        ]));
        assert_eq!(config.turn_detection, TurnDetection::None);
    }

    #[test]
    fn vad_fields_are_copied_only_when_present() {
        let config = resolve(&raw(&[
            ("vad_threshold", "0.6"),
            ("vad_silence_duration_ms", "700"),
        ]));
        match config.turn_detection {
            TurnDetection::ServerVad(options) => {
                assert_eq!(options.threshold(), Some(0.6));
                assert_eq!(options.prefix_padding_ms(), None);
                assert_eq!(options.silence_duration_ms(), Some(700));
            }
            other => panic!("unexpected turn detection: {:?}", other),
        }
    }

    #[test]
    fn unparsable_numbers_leave_optional_fields_unset() {
        let config = resolve(&raw(&[
            ("max_output_tokens", "many"),
            ("vad_threshold", "loud"),
        ]));
        assert_eq!(config.max_output_tokens, None);
        assert_eq!(
            config.turn_detection,
            TurnDetection::ServerVad(ServerVadOptions::default())
        );
    }

    #[test]
    fn zero_max_output_tokens_resolves_to_unset() {
        let config = resolve(&raw(&[("max_output_tokens", "0")]));
        assert_eq!(config.max_output_tokens, None);
    }

    #[test]
    fn non_numeric_temperature_resolves_to_nan() {
        let config = resolve(&raw(&[("temperature", "warm")]));
        assert!(config.temperature.is_nan());
    }

    #[test]
    fn scenario_temperature_and_text_only() {
        let config = resolve(&raw(&[
            ("temperature", "1.2"),
            ("modalities", "text_only"),
        ]));
        assert_eq!(config.temperature, 1.2);
        assert_eq!(config.modalities, Modalities::TextOnly);
        assert_eq!(
            config.turn_detection,
            TurnDetection::ServerVad(ServerVadOptions::default())
        );
    }

    #[test]
    fn merge_overlays_changed_keys_onto_full_set() {
        let full = raw(&[("a", "1"), ("b", "2")]);
        let changed = raw(&[("b", "3")]);
        let merged = merge(&full, &changed);
        assert_eq!(merged.get("a").unwrap(), "1");
        assert_eq!(merged.get("b").unwrap(), "3");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn initial_session_carries_voice_and_audio_setup() {
        let config = resolve(&raw(&[
            ("voice", "alloy"),
            ("instructions", "Be kind."),
            ("max_output_tokens", "250"),
        ]));
        let session = serde_json::to_value(config.to_initial_session()).unwrap();
        assert_eq!(session["voice"], "alloy");
        assert_eq!(session["input_audio_format"], "pcm16");
        assert_eq!(session["output_audio_format"], "pcm16");
        assert_eq!(session["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(session["instructions"], "Be kind.");
        assert_eq!(session["max_output_tokens"], 250);
        assert_eq!(session["modalities"][1], "audio");
    }

    #[test]
    fn session_update_omits_voice_and_audio_formats() {
        let config = resolve(&raw(&[("voice", "alloy"), ("instructions", "Be kind.")]));
        let session = serde_json::to_value(config.to_session_update()).unwrap();
        assert!(session.get("voice").is_none());
        assert!(session.get("input_audio_format").is_none());
        assert!(session.get("output_audio_format").is_none());
        assert!(session.get("input_audio_transcription").is_none());
        assert_eq!(session["instructions"], "Be kind.");
        assert_eq!(session["turn_detection"]["type"], "server_vad");
    }

    #[test]
    fn metadata_must_be_a_flat_string_map() {
        let parsed = parse_metadata(r#"{"voice":"alloy","temperature":"0.9"}"#).unwrap();
        assert_eq!(parsed.get("voice").unwrap(), "alloy");

        assert!(parse_metadata("not json").is_err());
        assert!(parse_metadata(r#"{"nested":{"x":1}}"#).is_err());
    }
}
