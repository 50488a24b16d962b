use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::{TlsPolicy, UpstreamConfig};
use crate::types::RawPayload;

#[derive(Debug, thiserror::Error)]
pub enum PollingError {
    #[error("Failed to fetch RG polling API: HTTP {0}")]
    Status(StatusCode),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid polling payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Where a refresh cycle gets its raw payload from.
#[async_trait]
pub trait PollingSource: Send + Sync {
    async fn fetch_payload(&self) -> Result<RawPayload, PollingError>;
}

pub struct PollingClient {
    client: reqwest::Client,
    url: String,
}

impl PollingClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, PollingError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());

        if config.tls == TlsPolicy::TrustAll {
            warn!(
                "TLS certificate verification is disabled for {}; responses can be spoofed",
                config.url
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PollingSource for PollingClient {
    async fn fetch_payload(&self) -> Result<RawPayload, PollingError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollingError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("Got polling response ({} bytes)", body.len());

        Ok(serde_json::from_slice(&body)?)
    }
}
