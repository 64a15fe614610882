//! Startup configuration: webhook endpoints, tenant identity, and the
//! shared HTTP client.

use anyhow::Result;
use log::{debug, warn};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

/// Destination webhook URLs. Either may be absent at startup; the
/// affected operation then fails at call time.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    pub upload_url: Option<String>,
    pub query_url: Option<String>,
}

/// Resolved configuration for one invocation.
pub struct Config {
    pub endpoints: Endpoints,
    pub client_id: String,
    pub client: Client,
}

impl Config {
    /// Builds the configuration and the HTTP client. A bearer token, when
    /// supplied, is attached to every request as a sensitive default
    /// header. Missing webhook URLs only warn here; each command enforces
    /// its own URL when it runs.
    pub fn new(endpoints: Endpoints, client_id: String, token: Option<String>) -> Result<Self> {
        if endpoints.upload_url.is_none() {
            warn!("Document upload webhook URL is not configured");
        }
        if endpoints.query_url.is_none() {
            warn!("Query webhook URL is not configured");
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using bearer token for webhook authentication");
        }

        let client = Client::builder()
            .user_agent("hookpost-cli")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            endpoints,
            client_id,
            client,
        })
    }
}
