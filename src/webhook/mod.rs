//! Resilient webhook client: bounded retry with linear backoff, upload
//! progress observation, and normalization of failures into single
//! human-readable messages.

mod client;
mod error;
mod progress;
mod response;

pub use client::{
    BASE_DELAY_MS, CallOptions, Document, MAX_ATTEMPTS, REQUEST_TIMEOUT_SECS, RetryPolicy,
    WebhookApi, WebhookClient,
};
pub use error::{ErrorKind, MAX_FILE_SIZE, WebhookAction, WebhookError};
pub use progress::{ProgressFn, RetryFn};
pub use response::WebhookResponse;

#[cfg(test)]
pub use client::MockWebhookApi;
