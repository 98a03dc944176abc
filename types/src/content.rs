/// A conversation item the client can add via `conversation.item.create`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    #[serde(rename = "message")]
    Message(MessageItem),
}

impl Item {
    /// A plain user text turn, the common case for injected messages.
    pub fn user_text(text: &str) -> Self {
        Item::Message(
            MessageItem::builder()
                .with_role(MessageRole::User)
                .with_input_text(text)
                .build(),
        )
    }
}

/// A message in the conversation, from the user, the assistant, or the system.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MessageItem {
    /// Unique item id; optional for items created by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// The role of the message sender.
    role: MessageRole,

    /// The content of the message.
    content: Vec<Content>,
}

impl MessageItem {
    pub fn builder() -> MessageItemBuilder {
        MessageItemBuilder::new()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn role(&self) -> &MessageRole {
        &self.role
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }
}

pub struct MessageItemBuilder {
    item: MessageItem,
}

impl Default for MessageItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageItemBuilder {
    pub fn new() -> Self {
        Self {
            item: MessageItem {
                id: None,
                role: MessageRole::User,
                content: Vec::new(),
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.item.id = Some(id.to_string());
        self
    }

    pub fn with_role(mut self, role: MessageRole) -> Self {
        self.item.role = role;
        self
    }

    pub fn with_input_text(mut self, text: &str) -> Self {
        self.item.content.push(Content::input_text(text));
        self
    }

    pub fn build(self) -> MessageItem {
        self.item
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

/// One content part of a message.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    /// Text supplied as input to the model.
    #[serde(rename = "input_text")]
    InputText(InputTextContent),
    /// Text produced by the model.
    #[serde(rename = "text")]
    Text(TextContent),
}

impl Content {
    pub fn input_text(text: &str) -> Self {
        Content::InputText(InputTextContent::new(text))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputTextContent {
    text: String,
}

impl InputTextContent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextContent {
    text: String,
}

impl TextContent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_item_wire_shape() {
        let item = Item::user_text("Say hello.");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r#"{"type":"message","role":"user","content":[{"type":"input_text","text":"Say hello."}]}"#
        );
    }

    #[test]
    fn builder_keeps_role_and_id() {
        let item = MessageItem::builder()
            .with_id("item_123")
            .with_role(MessageRole::System)
            .with_input_text("context")
            .build();
        assert_eq!(item.id(), Some("item_123"));
        assert_eq!(item.role(), &MessageRole::System);
        assert_eq!(item.content().len(), 1);
    }
}
