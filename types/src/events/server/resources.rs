/// The session object carried by `session.created` and `session.updated`.
///
/// Only the fields the client acts on are modeled; the rest of the payload
/// is ignored on deserialization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionResource {
    /// Server-assigned session id.
    id: String,

    /// The model backing this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

impl SessionResource {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

/// The item object carried by `conversation.item.created`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ItemResource {
    /// Server-assigned item id.
    id: String,

    /// The status of the item, e.g. "completed", "in_progress".
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

impl ItemResource {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

/// The response object carried by `response.created` and `response.done`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseResource {
    /// Server-assigned response id.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// The status of the response.
    status: ResponseStatus,

    /// Token usage, populated once the response is done.
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

impl ResponseResource {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }
}

/// Terminal and in-flight states a response can report.
///
/// Statuses introduced by newer endpoint revisions fall back to `Other`
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Cancelled,
    Incomplete,
    Failed,
    #[serde(other)]
    Other,
}

/// Token accounting for a finished response.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Usage {
    total_tokens: i32,
    input_tokens: i32,
    output_tokens: i32,
}

impl Usage {
    pub fn total_tokens(&self) -> i32 {
        self.total_tokens
    }

    pub fn input_tokens(&self) -> i32 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> i32 {
        self.output_tokens
    }
}
