//! Failure classification and message normalization for webhook calls.

use reqwest::StatusCode;

/// Hard ceiling for uploaded documents, checked before any network call.
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Which webhook operation a request belongs to. Drives the wire `action`
/// tag and the context prefix of normalized error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    DocumentUpload,
    QueryRequest,
}

impl WebhookAction {
    /// The `action` field value sent to the webhook.
    pub fn wire_name(&self) -> &'static str {
        match self {
            WebhookAction::DocumentUpload => "document_upload",
            WebhookAction::QueryRequest => "query_request",
        }
    }

    fn context(&self) -> &'static str {
        match self {
            WebhookAction::DocumentUpload => "Failed to upload document",
            WebhookAction::QueryRequest => "Failed to process query",
        }
    }
}

/// Failure taxonomy for a webhook call. Only `Transport` is retried.
#[derive(Debug)]
pub enum ErrorKind {
    /// Destination URL missing at call time.
    MissingUrl,
    /// File exceeds [`MAX_FILE_SIZE`]; carries the measured size in bytes.
    FileTooLarge(u64),
    /// No HTTP response was produced (timeout, aborted connection).
    Transport(String),
    /// The remote service answered with an error status.
    Rejected { status: StatusCode, body: String },
    /// The caller's cancellation token fired.
    Cancelled,
    /// Fallback bucket for everything else.
    Unknown(String),
}

/// A failed webhook call, carrying the operation it belongs to so the
/// displayed message includes the action context.
#[derive(Debug)]
pub struct WebhookError {
    action: WebhookAction,
    kind: ErrorKind,
}

impl WebhookError {
    pub(crate) fn new(action: WebhookAction, kind: ErrorKind) -> Self {
        Self { action, kind }
    }

    pub fn action(&self) -> WebhookAction {
        self.action
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.action.context(), describe(&self.kind))
    }
}

impl std::error::Error for WebhookError {}

/// Produces the classified reason for a failure, without the action prefix.
fn describe(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::MissingUrl => "webhook URL is not configured".to_string(),
        ErrorKind::FileTooLarge(size) => {
            format!("file is {} bytes, exceeding the 16 MiB limit", size)
        }
        ErrorKind::Transport(msg) => format!("network error ({})", msg),
        ErrorKind::Rejected { status, body } => classify_rejection(*status, body),
        ErrorKind::Cancelled => "operation was cancelled".to_string(),
        ErrorKind::Unknown(msg) => {
            if msg.is_empty() {
                "unknown error".to_string()
            } else {
                msg.clone()
            }
        }
    }
}

/// Maps a terminal HTTP rejection to a human-readable reason.
///
/// Statuses with a known meaning win; otherwise the body is inspected,
/// since misconfigured gateways tend to answer with HTML error pages.
pub(crate) fn classify_rejection(status: StatusCode, body: &str) -> String {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => {
            "file is too large, the server accepts at most 16 MiB".to_string()
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            "internal server error, please try again later".to_string()
        }
        StatusCode::BAD_REQUEST => "invalid request format".to_string(),
        _ => {
            if looks_like_html(body) {
                match extract_pre_text(body) {
                    Some(text) => format!("Server Error: {}", text),
                    None => "received an error page from the server, \
                             possibly a temporary connection issue"
                        .to_string(),
                }
            } else if let Some(message) = extract_message_field(body) {
                message
            } else {
                format!("unknown error (HTTP {})", status.as_u16())
            }
        }
    }
}

fn looks_like_html(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("<html") || lower.trim_start().starts_with("<!doctype html")
}

/// Extracts the text of the first `<pre>` element of an HTML error page.
/// Gateways like nginx put the upstream error message there.
pub(crate) fn extract_pre_text(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let tag_start = lower.find("<pre")?;
    let content_start = tag_start + lower[tag_start..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find("</pre>")?;
    let text = html[content_start..content_end].trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// The `message` field of a JSON error body, when the response has one.
fn extract_message_field(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_action_context() {
        let err = WebhookError::new(WebhookAction::DocumentUpload, ErrorKind::MissingUrl);
        assert_eq!(
            err.to_string(),
            "Failed to upload document: webhook URL is not configured"
        );

        let err = WebhookError::new(WebhookAction::QueryRequest, ErrorKind::MissingUrl);
        assert_eq!(
            err.to_string(),
            "Failed to process query: webhook URL is not configured"
        );
    }

    #[test]
    fn test_file_too_large_carries_measured_size() {
        let err = WebhookError::new(
            WebhookAction::DocumentUpload,
            ErrorKind::FileTooLarge(17_000_000),
        );
        assert!(err.to_string().contains("17000000 bytes"));
        assert!(err.to_string().contains("16 MiB"));
    }

    #[test]
    fn test_classify_413() {
        let msg = classify_rejection(StatusCode::PAYLOAD_TOO_LARGE, "");
        assert!(msg.contains("too large"));
        assert!(msg.contains("16 MiB"));
    }

    #[test]
    fn test_classify_500() {
        let msg = classify_rejection(StatusCode::INTERNAL_SERVER_ERROR, "ignored");
        assert!(msg.contains("internal server error"));
        assert!(msg.contains("try again later"));
    }

    #[test]
    fn test_classify_400() {
        let msg = classify_rejection(StatusCode::BAD_REQUEST, "");
        assert_eq!(msg, "invalid request format");
    }

    #[test]
    fn test_classify_html_with_pre() {
        let body = "<html><head></head><body><pre>Disk full</pre></body></html>";
        let msg = classify_rejection(StatusCode::BAD_GATEWAY, body);
        assert_eq!(msg, "Server Error: Disk full");
    }

    #[test]
    fn test_classify_html_without_pre() {
        let body = "<html><body><h1>502 Bad Gateway</h1></body></html>";
        let msg = classify_rejection(StatusCode::BAD_GATEWAY, body);
        assert!(msg.contains("error page"));
    }

    #[test]
    fn test_classify_json_message_field() {
        let msg = classify_rejection(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"quota exceeded"}"#);
        assert_eq!(msg, "quota exceeded");
    }

    #[test]
    fn test_classify_unrecognized_body_falls_back_to_status() {
        let msg = classify_rejection(StatusCode::IM_A_TEAPOT, "plain text");
        assert!(msg.contains("unknown error"));
        assert!(msg.contains("418"));
    }

    #[test]
    fn test_status_wins_over_body_heuristics() {
        // A 500 with an HTML body still maps to the 500 message.
        let body = "<html><pre>stack trace</pre></html>";
        let msg = classify_rejection(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(msg.contains("internal server error"));
    }

    #[test]
    fn test_extract_pre_text_basic() {
        assert_eq!(
            extract_pre_text("<pre>Disk full</pre>"),
            Some("Disk full".to_string())
        );
    }

    #[test]
    fn test_extract_pre_text_with_attributes_and_case() {
        assert_eq!(
            extract_pre_text(r#"<PRE class="err"> upstream timed out </PRE>"#),
            Some("upstream timed out".to_string())
        );
    }

    #[test]
    fn test_extract_pre_text_missing_or_empty() {
        assert_eq!(extract_pre_text("<html>no pre here</html>"), None);
        assert_eq!(extract_pre_text("<pre>   </pre>"), None);
        assert_eq!(extract_pre_text("<pre>unterminated"), None);
    }

    #[test]
    fn test_exact_normalized_html_message() {
        let err = WebhookError::new(
            WebhookAction::DocumentUpload,
            ErrorKind::Rejected {
                status: StatusCode::BAD_GATEWAY,
                body: "<html><body><pre>Disk full</pre></body></html>".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "Failed to upload document: Server Error: Disk full"
        );
    }
}
