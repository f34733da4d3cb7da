mod deezer;
mod error;
mod jamendo;
mod models;
mod provider;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use deezer::{DeezerClient, DEFAULT_DEEZER_BASE_URL};
pub use error::CatalogError;
pub use jamendo::{JamendoClient, DEFAULT_JAMENDO_BASE_URL};
pub use models::{Track, UNKNOWN_ARTIST, UNTITLED};
pub use provider::{
    sample_from_pool, sample_pool_size, CatalogProvider, MIN_SAMPLE_POOL, SAMPLE_OVERFETCH,
};
pub use transport::TransportSettings;

use crate::config::CatalogSettings;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Deezer,
    Jamendo,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Deezer => DEFAULT_DEEZER_BASE_URL,
            ProviderKind::Jamendo => DEFAULT_JAMENDO_BASE_URL,
        }
    }
}

/// Builds the configured provider, ready to be shared across tasks.
pub fn build_provider(settings: &CatalogSettings) -> Result<Arc<dyn CatalogProvider>> {
    let base_url = settings
        .base_url
        .as_deref()
        .unwrap_or_else(|| settings.provider.default_base_url());
    info!(provider = ?settings.provider, base_url, "Using catalog provider");

    let provider: Arc<dyn CatalogProvider> = match settings.provider {
        ProviderKind::Deezer => Arc::new(DeezerClient::new(base_url, &settings.transport)?),
        ProviderKind::Jamendo => {
            let client_id = settings
                .jamendo_client_id
                .as_deref()
                .context("Jamendo requires a client id")?;
            Arc::new(JamendoClient::new(base_url, client_id, &settings.transport)?)
        }
    };
    Ok(provider)
}
