//! Query command: submits a free-text query to the query webhook and
//! renders the returned results.

use anyhow::Result;
use log::info;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::webhook::{CallOptions, WebhookApi, WebhookClient};

#[tracing::instrument(skip(config, text))]
pub async fn query(config: &Config, text: &str) -> Result<()> {
    let client = WebhookClient::new(config.client.clone());

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    let ctrl_c_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, aborting...");
            cancel_on_signal.cancel();
        }
    });

    let result = run(config, &client, text, cancel).await;
    ctrl_c_handler.abort();
    result
}

pub(crate) async fn run(
    config: &Config,
    api: &dyn WebhookApi,
    text: &str,
    cancel: CancellationToken,
) -> Result<()> {
    let url = config.endpoints.query_url.clone().unwrap_or_default();

    let options = CallOptions {
        cancel: Some(cancel),
        ..Default::default()
    };
    let response = api
        .submit_query(&url, &config.client_id, text, options)
        .await?;

    match response.results() {
        Some(results) if !results.is_empty() => {
            info!("Query returned {} result(s)", results.len());
            for item in results {
                println!("{}", serde_json::to_string_pretty(item)?);
            }
        }
        Some(_) => println!("No results."),
        // Workflows that answer with a bare object get printed verbatim.
        None => println!("{}", serde_json::to_string_pretty(response.body())?),
    }

    Ok(())
}
