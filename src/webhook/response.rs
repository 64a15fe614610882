//! Webhook response passthrough.

use serde_json::Value;

/// Body returned by a webhook on success, forwarded verbatim as parsed
/// JSON. The shape is owned by the remote workflow; the only field this
/// crate interprets is the optional `results` array of query responses.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    body: Value,
}

impl WebhookResponse {
    /// Lenient decode: a body that is not valid JSON is forwarded as a
    /// JSON string instead of failing the call.
    pub(crate) fn from_body(text: &str) -> Self {
        let body =
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        Self { body }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The `results` array, when the workflow returned one.
    pub fn results(&self) -> Option<&Vec<Value>> {
        self.body.get("results").and_then(Value::as_array)
    }
}
