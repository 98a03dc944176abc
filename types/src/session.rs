use crate::audio::{AudioFormat, InputAudioTranscription, TurnDetection, Voice};

/// The session configuration object carried by `session.update`.
///
/// Every field is optional on the wire and omitted from the JSON payload when
/// unset, so the same object serves both the full configuration sent right
/// after connecting and partial mid-session updates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    /// The set of output channels the model may produce. `["text"]` disables
    /// audio output; `["text", "audio"]` enables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    modalities: Option<Vec<String>>,

    /// System instructions prepended to model calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,

    /// The voice the model responds with. Cannot be changed once the model
    /// has produced audio in the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<Voice>,

    /// Format of input audio: "pcm16", "g711_ulaw", "g711_alaw".
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_format: Option<AudioFormat>,

    /// Format of output audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_format: Option<AudioFormat>,

    /// Input audio transcription settings; absent leaves transcription off.
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_transcription: Option<InputAudioTranscription>,

    /// Turn detection policy. `TurnDetection::None` switches detection off.
    #[serde(skip_serializing_if = "Option::is_none")]
    turn_detection: Option<TurnDetection>,

    /// Sampling temperature for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Cap on output tokens per response; absent means no cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn modalities(&self) -> Option<&[String]> {
        self.modalities.as_deref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn input_audio_format(&self) -> Option<&AudioFormat> {
        self.input_audio_format.as_ref()
    }

    pub fn output_audio_format(&self) -> Option<&AudioFormat> {
        self.output_audio_format.as_ref()
    }

    pub fn input_audio_transcription(&self) -> Option<&InputAudioTranscription> {
        self.input_audio_transcription.as_ref()
    }

    pub fn turn_detection(&self) -> Option<&TurnDetection> {
        self.turn_detection.as_ref()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }
}

pub struct SessionBuilder {
    session: Session,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            session: Session {
                modalities: None,
                instructions: None,
                voice: None,
                input_audio_format: None,
                output_audio_format: None,
                input_audio_transcription: None,
                turn_detection: None,
                temperature: None,
                max_output_tokens: None,
            },
        }
    }

    pub fn with_modalities(mut self, modalities: Vec<String>) -> Self {
        self.session.modalities = Some(modalities);
        self
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.session.instructions = Some(instructions.to_string());
        self
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.session.voice = Some(voice);
        self
    }

    pub fn with_input_audio_format(mut self, format: AudioFormat) -> Self {
        self.session.input_audio_format = Some(format);
        self
    }

    pub fn with_output_audio_format(mut self, format: AudioFormat) -> Self {
        self.session.output_audio_format = Some(format);
        self
    }

    pub fn with_input_audio_transcription(mut self, transcription: InputAudioTranscription) -> Self {
        self.session.input_audio_transcription = Some(transcription);
        self
    }

    pub fn with_turn_detection(mut self, turn_detection: TurnDetection) -> Self {
        self.session.turn_detection = Some(turn_detection);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.session.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.session.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn build(self) -> Session {
        self.session
    }
}
