//! Webhook client with bounded retry, upload progress and error
//! normalization.
//!
//! One logical call performs up to [`MAX_ATTEMPTS`] attempts. Only
//! transient network failures (no HTTP response was produced) are retried;
//! a received error status means the remote service processed and rejected
//! the request, so it is terminal. Every failure surfaces as a single
//! normalized [`WebhookError`] message.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, multipart};
use tokio_util::sync::CancellationToken;

use super::error::{ErrorKind, MAX_FILE_SIZE, WebhookAction, WebhookError};
use super::progress::{ProgressFn, RetryFn, progress_stream};
use super::response::WebhookResponse;

/// Maximum attempts for one logical webhook call.
pub const MAX_ATTEMPTS: usize = 3;

/// Base backoff delay; the wait before attempt n+1 is `BASE_DELAY_MS * n`.
pub const BASE_DELAY_MS: u64 = 2000;

/// Per-attempt request timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Wire payload types (internal).
mod wire {
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    pub struct UploadMeta<'a> {
        pub client_id: &'a str,
        pub action: &'a str,
        pub file_name: &'a str,
    }

    #[derive(Serialize, Debug)]
    pub struct QueryRequest<'a> {
        pub client_id: &'a str,
        pub action: &'a str,
        pub query: &'a str,
    }
}

/// A document to submit to the upload webhook.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub data: bytes::Bytes,
}

/// Observers and cancellation for one webhook call. All fields optional.
#[derive(Default, Clone)]
pub struct CallOptions {
    /// Receives upload progress percentages. Uploads only.
    pub progress: Option<ProgressFn>,
    /// Invoked before each retry, primarily so the caller can reset its
    /// progress indicator.
    pub on_retry: Option<RetryFn>,
    /// Honored at the top of each attempt and during backoff sleeps.
    pub cancel: Option<CancellationToken>,
}

/// Retry pacing. Injectable so tests do not sleep for seconds.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: 2s before attempt 2, 4s before attempt 3.
    fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay * attempt as u32
    }
}

/// Client-facing surface of the webhook client, mockable so the command
/// layer is testable without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookApi: Send + Sync {
    /// Submits a document to the upload webhook as a multipart request.
    async fn upload_document(
        &self,
        url: &str,
        client_id: &str,
        document: Document,
        options: CallOptions,
    ) -> Result<WebhookResponse, WebhookError>;

    /// Submits a free-text query to the query webhook as a JSON request.
    async fn submit_query(
        &self,
        url: &str,
        client_id: &str,
        query: &str,
        options: CallOptions,
    ) -> Result<WebhookResponse, WebhookError>;
}

/// Webhook client wrapping an injected reqwest [`Client`].
///
/// Each call owns its retry counter and progress state, so concurrent
/// calls are independent and need no locking.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    policy: RetryPolicy,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Overrides retry pacing. Tests use millisecond delays.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one attempt closure under the retry policy, classifying the
    /// outcome into success, terminal failure, or retryable failure.
    async fn execute<F, Fut>(
        &self,
        action: WebhookAction,
        options: &CallOptions,
        attempt_fn: F,
    ) -> Result<WebhookResponse, WebhookError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<WebhookResponse, ErrorKind>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            if let Some(cancel) = &options.cancel
                && cancel.is_cancelled()
            {
                return Err(WebhookError::new(action, ErrorKind::Cancelled));
            }

            debug!(
                "{}: attempt {}/{}",
                action.wire_name(),
                attempt,
                self.policy.max_attempts
            );

            match attempt_fn().await {
                Ok(response) => {
                    debug!("{}: succeeded on attempt {}", action.wire_name(), attempt);
                    return Ok(response);
                }
                Err(kind) => {
                    let transient = matches!(kind, ErrorKind::Transport(_));
                    let error = WebhookError::new(action, kind);

                    if !transient {
                        debug!("{}: terminal error: {}", action.wire_name(), error);
                        return Err(error);
                    }

                    if attempt < self.policy.max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            action.wire_name(),
                            attempt,
                            self.policy.max_attempts,
                            error,
                            delay.as_millis()
                        );
                        if let Some(on_retry) = &options.on_retry {
                            on_retry(attempt, &error);
                        }
                        last_error = Some(error);

                        if let Some(cancel) = &options.cancel {
                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    return Err(WebhookError::new(action, ErrorKind::Cancelled));
                                }
                                _ = tokio::time::sleep(delay) => {}
                            }
                        } else {
                            tokio::time::sleep(delay).await;
                        }
                    } else {
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            WebhookError::new(
                action,
                ErrorKind::Unknown("no attempts were made".to_string()),
            )
        }))
    }
}

#[async_trait]
impl WebhookApi for WebhookClient {
    #[tracing::instrument(skip(self, document, options))]
    async fn upload_document(
        &self,
        url: &str,
        client_id: &str,
        document: Document,
        options: CallOptions,
    ) -> Result<WebhookResponse, WebhookError> {
        let action = WebhookAction::DocumentUpload;

        if url.is_empty() {
            return Err(WebhookError::new(action, ErrorKind::MissingUrl));
        }

        let size = document.data.len() as u64;
        if size > MAX_FILE_SIZE {
            return Err(WebhookError::new(action, ErrorKind::FileTooLarge(size)));
        }

        let meta = serde_json::to_string(&wire::UploadMeta {
            client_id,
            action: action.wire_name(),
            file_name: &document.file_name,
        })
        .map_err(|e| WebhookError::new(action, ErrorKind::Unknown(e.to_string())))?;

        debug!(
            "Uploading {} ({} bytes) to {}",
            document.file_name, size, url
        );

        self.execute(action, &options, || async {
            // Fresh stream per attempt: progress restarts at 0 on retry.
            let stream = progress_stream(document.data.clone(), options.progress.clone());
            let part =
                multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), size)
                    .file_name(document.file_name.clone());
            let form = multipart::Form::new()
                .part("file", part)
                .text("data", meta.clone());

            let response = self
                .client
                .post(url)
                .multipart(form)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(classify_send_error)?;

            decode_response(response).await
        })
        .await
    }

    #[tracing::instrument(skip(self, query, options))]
    async fn submit_query(
        &self,
        url: &str,
        client_id: &str,
        query: &str,
        options: CallOptions,
    ) -> Result<WebhookResponse, WebhookError> {
        let action = WebhookAction::QueryRequest;

        if url.is_empty() {
            return Err(WebhookError::new(action, ErrorKind::MissingUrl));
        }

        debug!("Submitting query to {}", url);

        self.execute(action, &options, || async {
            let response = self
                .client
                .post(url)
                .json(&wire::QueryRequest {
                    client_id,
                    action: action.wire_name(),
                    query,
                })
                .timeout(self.timeout)
                .send()
                .await
                .map_err(classify_send_error)?;

            decode_response(response).await
        })
        .await
    }
}

/// Send-stage failures produced no HTTP response, so they are transient,
/// except for request construction errors which a retry cannot fix.
fn classify_send_error(error: reqwest::Error) -> ErrorKind {
    if error.is_builder() {
        ErrorKind::Unknown(error.to_string())
    } else {
        ErrorKind::Transport(error.to_string())
    }
}

/// Decodes a completed HTTP exchange into a response or a terminal
/// rejection carrying the body for classification.
async fn decode_response(response: reqwest::Response) -> Result<WebhookResponse, ErrorKind> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ErrorKind::Transport(e.to_string()))?;

    if status.is_success() {
        Ok(WebhookResponse::from_body(&body))
    } else {
        Err(ErrorKind::Rejected { status, body })
    }
}
