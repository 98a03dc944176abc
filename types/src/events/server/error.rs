/// Details of an error returned by the model endpoint.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetails {
    /// The type of error, e.g. "invalid_request_error", "server_error".
    #[serde(rename = "type")]
    error_type: String,

    /// Error code, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,

    /// A human-readable error message.
    message: String,

    /// Parameter related to the error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    param: Option<String>,

    /// The event_id of the client event that caused the error, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
}

impl ErrorDetails {
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}
