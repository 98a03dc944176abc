/// Turn detection policy for a session.
///
/// `None` switches server-side segmentation off entirely; `ServerVad` leaves
/// the end-of-turn decision to the server's voice-activity detector.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "server_vad")]
    ServerVad(ServerVadOptions),
}

/// Tuning knobs for server-side voice-activity detection.
///
/// Fields left unset are omitted from the payload entirely; the server
/// applies its own defaults for anything absent. Never fill these with
/// zeroes on behalf of the caller.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServerVadOptions {
    /// Activation threshold for the detector (0.0 to 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f32>,

    /// Audio included before detected speech, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix_padding_ms: Option<u32>,

    /// Duration of silence that ends a turn, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    silence_duration_ms: Option<u32>,
}

impl ServerVadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_prefix_padding_ms(mut self, prefix_padding_ms: u32) -> Self {
        self.prefix_padding_ms = Some(prefix_padding_ms);
        self
    }

    pub fn with_silence_duration_ms(mut self, silence_duration_ms: u32) -> Self {
        self.silence_duration_ms = Some(silence_duration_ms);
        self
    }

    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }

    pub fn prefix_padding_ms(&self) -> Option<u32> {
        self.prefix_padding_ms
    }

    pub fn silence_duration_ms(&self) -> Option<u32> {
        self.silence_duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_detection_serializes_as_bare_tag() {
        let td = TurnDetection::None;
        assert_eq!(serde_json::to_string(&td).unwrap(), r#"{"type":"none"}"#);
    }

    #[test]
    fn absent_vad_fields_are_omitted() {
        let td = TurnDetection::ServerVad(ServerVadOptions::new());
        assert_eq!(
            serde_json::to_string(&td).unwrap(),
            r#"{"type":"server_vad"}"#
        );
    }

    #[test]
    fn set_vad_fields_are_carried() {
        let td = TurnDetection::ServerVad(
            ServerVadOptions::new()
                .with_threshold(0.5)
                .with_silence_duration_ms(700),
        );
        assert_eq!(
            serde_json::to_string(&td).unwrap(),
            r#"{"type":"server_vad","threshold":0.5,"silence_duration_ms":700}"#
        );
    }

    #[test]
    fn deserializes_partial_options() {
        let td: TurnDetection =
            serde_json::from_str(r#"{"type":"server_vad","prefix_padding_ms":300}"#).unwrap();
        match td {
            TurnDetection::ServerVad(opts) => {
                assert_eq!(opts.prefix_padding_ms(), Some(300));
                assert_eq!(opts.threshold(), None);
                assert_eq!(opts.silence_duration_ms(), None);
            }
            other => panic!("expected server_vad, got {:?}", other),
        }
    }
}
