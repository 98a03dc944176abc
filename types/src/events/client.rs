use crate::content::Item;
use crate::session::Session;

/// Events sent from the client to the model endpoint.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// `session.update` event
    #[serde(rename = "session.update")]
    SessionUpdate(SessionUpdateEvent),

    /// `conversation.item.create` event
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate(ConversationItemCreateEvent),

    /// `response.create` event
    #[serde(rename = "response.create")]
    ResponseCreate(ResponseCreateEvent),
}

/// Update the session's default configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionUpdateEvent {
    /// Optional client-generated ID used to identify this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// Session configuration to update. Only provided fields are changed.
    session: Session,
}

impl SessionUpdateEvent {
    pub fn new(session: Session) -> Self {
        Self {
            event_id: None,
            session,
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Add a new item to the conversation's context.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConversationItemCreateEvent {
    /// Optional client-generated ID used to identify this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,

    /// The ID of the preceding item after which the new item will be inserted.
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_item_id: Option<String>,

    /// The item to add to the conversation.
    item: Item,
}

impl ConversationItemCreateEvent {
    pub fn new(item: Item) -> Self {
        Self {
            event_id: None,
            previous_item_id: None,
            item,
        }
    }

    pub fn with_previous_item_id(mut self, previous_item_id: &str) -> Self {
        self.previous_item_id = Some(previous_item_id.to_string());
        self
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn previous_item_id(&self) -> Option<&str> {
        self.previous_item_id.as_deref()
    }

    pub fn item(&self) -> &Item {
        &self.item
    }
}

/// Ask the model to generate a response from the current conversation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCreateEvent {
    /// Optional client-generated ID used to identify this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
}

impl ResponseCreateEvent {
    pub fn new() -> Self {
        Self { event_id: None }
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}

impl Default for ResponseCreateEvent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_update_tags_the_event() {
        let session = Session::builder().with_instructions("Be brief.").build();
        let event = ClientEvent::SessionUpdate(SessionUpdateEvent::new(session));
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"session.update","session":{"instructions":"Be brief."}}"#
        );
    }

    #[test]
    fn item_create_carries_the_item() {
        let event = ClientEvent::ConversationItemCreate(ConversationItemCreateEvent::new(
            Item::user_text("hi"),
        ));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "conversation.item.create");
        assert_eq!(value["item"]["type"], "message");
        assert_eq!(value["item"]["content"][0]["text"], "hi");
    }

    #[test]
    fn response_create_is_bare_without_event_id() {
        let event = ClientEvent::ResponseCreate(ResponseCreateEvent::new());
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"response.create"}"#);
    }
}
