//! Shared HTTP plumbing for the catalog providers.

use anyhow::{Context, Result};
use reqwest::Response;
use std::time::Duration;
use tracing::{debug, warn};

use super::CatalogError;

/// Per-request transport policy.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    /// Retry a timed-out request exactly once before giving up.
    pub retry_on_timeout: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry_on_timeout: false,
        }
    }
}

pub(crate) struct ProviderHttp {
    provider: &'static str,
    client: reqwest::Client,
    base_url: String,
    retry_on_timeout: bool,
}

impl ProviderHttp {
    pub(crate) fn new(
        provider: &'static str,
        base_url: &str,
        settings: &TransportSettings,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .with_context(|| format!("Failed to create HTTP client for {}", provider))?;

        Ok(Self {
            provider,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_on_timeout: settings.retry_on_timeout,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues `GET {base_url}/{resource}` with the non-empty query parameters.
    ///
    /// Only transport failures are mapped here; status and envelope checks are
    /// provider specific.
    pub(crate) async fn get(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<Response, CatalogError> {
        let url = format!("{}/{}", self.base_url, resource);
        let query: Vec<(&str, &str)> = query
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        let max_attempts = if self.retry_on_timeout { 2 } else { 1 };

        let mut attempt = 1;
        loop {
            debug!(provider = self.provider, url = %url, attempt, "Querying catalog provider");
            match self.client.get(&url).query(&query).send().await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_timeout() && attempt < max_attempts => {
                    warn!(provider = self.provider, url = %url, "Catalog request timed out, retrying once");
                    attempt += 1;
                }
                Err(err) => return Err(CatalogError::from_transport(self.provider, err)),
            }
        }
    }
}
