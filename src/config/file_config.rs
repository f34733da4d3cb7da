use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_dir: Option<String>,

    pub catalog: Option<CatalogConfig>,
    pub recommendations: Option<RecommendationsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// "deezer" or "jamendo"
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub jamendo_client_id: Option<String>,
    pub request_timeout_sec: Option<u64>,
    pub retry_on_timeout: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationsConfig {
    pub liked_window: Option<usize>,
    pub max_artists: Option<usize>,
    pub tracks_per_artist: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
