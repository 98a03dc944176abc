mod error;
mod resources;

pub use error::ErrorDetails;
pub use resources::{ItemResource, ResponseResource, ResponseStatus, SessionResource, Usage};

/// Events sent from the model endpoint to the client.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// `error` event
    #[serde(rename = "error")]
    Error(ErrorEvent),

    /// `session.created` event
    #[serde(rename = "session.created")]
    SessionCreated(SessionCreatedEvent),

    /// `session.updated` event
    #[serde(rename = "session.updated")]
    SessionUpdated(SessionUpdatedEvent),

    /// `conversation.item.created` event
    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated(ConversationItemCreatedEvent),

    /// `response.created` event
    #[serde(rename = "response.created")]
    ResponseCreated(ResponseCreatedEvent),

    /// `response.done` event
    #[serde(rename = "response.done")]
    ResponseDone(ResponseDoneEvent),

    /// Synthetic event emitted when the underlying socket closes.
    #[serde(rename = "close")]
    Close {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Returned when an error occurs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    /// The unique ID of the server event.
    event_id: String,

    /// Details of the error.
    error: ErrorDetails,
}

impl ErrorEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}

/// Returned when a session is created, directly after connecting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionCreatedEvent {
    /// The unique ID of the server event.
    event_id: String,

    /// The session resource.
    session: SessionResource,
}

impl SessionCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn session(&self) -> &SessionResource {
        &self.session
    }
}

/// Returned when a session is updated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionUpdatedEvent {
    /// The unique ID of the server event.
    event_id: String,

    /// The session resource with the applied configuration.
    session: SessionResource,
}

impl SessionUpdatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn session(&self) -> &SessionResource {
        &self.session
    }
}

/// Returned when a conversation item is created.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemCreatedEvent {
    /// The unique ID of the server event.
    event_id: String,

    /// The ID of the preceding item.
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_item_id: Option<String>,

    /// The item that was created.
    item: ItemResource,
}

impl ConversationItemCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn previous_item_id(&self) -> Option<&str> {
        self.previous_item_id.as_deref()
    }

    pub fn item(&self) -> &ItemResource {
        &self.item
    }
}

/// Returned when a new response is created.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCreatedEvent {
    /// The unique ID of the server event.
    event_id: String,

    /// The response resource, initially in progress.
    response: ResponseResource,
}

impl ResponseCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response(&self) -> &ResponseResource {
        &self.response
    }
}

/// Returned when a response is done streaming, in any final state.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseDoneEvent {
    /// The unique ID of the server event.
    event_id: String,

    /// The response resource in its terminal state.
    response: ResponseResource,
}

impl ResponseDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response(&self) -> &ResponseResource {
        &self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_session_created() {
        let json = r#"{
            "type": "session.created",
            "event_id": "event_1",
            "session": {
                "id": "sess_001",
                "model": "gpt-4o-realtime-preview-2024-10-01",
                "modalities": ["text", "audio"]
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::SessionCreated(created) => {
                assert_eq!(created.event_id(), "event_1");
                assert_eq!(created.session().id(), "sess_001");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn deserializes_response_done_with_usage() {
        let json = r#"{
            "type": "response.done",
            "event_id": "event_2",
            "response": {
                "id": "resp_001",
                "status": "completed",
                "usage": {
                    "total_tokens": 50,
                    "input_tokens": 20,
                    "output_tokens": 30
                }
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::ResponseDone(done) => {
                assert_eq!(done.response().status(), ResponseStatus::Completed);
                let usage = done.response().usage().unwrap();
                assert_eq!(usage.total_tokens(), 50);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn deserializes_error_event() {
        let json = r#"{
            "type": "error",
            "event_id": "event_3",
            "error": {
                "type": "invalid_request_error",
                "code": "invalid_value",
                "message": "Invalid value for temperature.",
                "param": "session.temperature"
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Error(error) => {
                assert_eq!(error.error().message(), "Invalid value for temperature.");
                assert_eq!(error.error().code(), Some("invalid_value"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
