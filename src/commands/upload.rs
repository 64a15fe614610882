//! Upload command: reads a document from disk and submits it to the
//! document-upload webhook, rendering progress in the terminal.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::webhook::{CallOptions, Document, WebhookApi, WebhookClient, WebhookError};

#[tracing::instrument(skip(config))]
pub async fn upload(config: &Config, path: &Path) -> Result<()> {
    let client = WebhookClient::new(config.client.clone());

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    let ctrl_c_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, aborting...");
            cancel_on_signal.cancel();
        }
    });

    let result = run(config, &client, path, cancel).await;
    ctrl_c_handler.abort();
    result
}

pub(crate) async fn run(
    config: &Config,
    api: &dyn WebhookApi,
    path: &Path,
    cancel: CancellationToken,
) -> Result<()> {
    let url = config.endpoints.upload_url.clone().unwrap_or_default();

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string();

    let document = Document {
        file_name: file_name.clone(),
        data: data.into(),
    };

    let options = CallOptions {
        progress: Some(Arc::new(render_progress)),
        on_retry: Some(Arc::new(|attempt: usize, error: &WebhookError| {
            println!();
            warn!("Attempt {} failed ({}), retrying...", attempt, error);
        })),
        cancel: Some(cancel),
    };

    match api
        .upload_document(&url, &config.client_id, document, options)
        .await
    {
        Ok(response) => {
            println!();
            println!("    uploaded {}", file_name);
            debug!("Upload response: {}", response.body());
            Ok(())
        }
        Err(error) => {
            println!();
            Err(error.into())
        }
    }
}

fn render_progress(percent: u8) {
    print!("\r   uploading {:>3}%", percent);
    let _ = std::io::stdout().flush();
}
