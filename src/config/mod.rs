mod file_config;

pub use file_config::{CatalogConfig, FileConfig, RecommendationsConfig};

use crate::catalog::{ProviderKind, TransportSettings};
use crate::recommendation::RecommendationSettings;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub jamendo_client_id: Option<String>,
    pub request_timeout_sec: u64,
    pub retry_on_timeout: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            provider: ProviderKind::default(),
            base_url: None,
            jamendo_client_id: None,
            request_timeout_sec: 10,
            retry_on_timeout: false,
        }
    }
}

/// Everything needed to build a catalog provider.
#[derive(Debug, Clone, Default)]
pub struct CatalogSettings {
    pub provider: ProviderKind,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    pub jamendo_client_id: Option<String>,
    pub transport: TransportSettings,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub catalog: CatalogSettings,
    pub recommendations: RecommendationSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let catalog_file = file.catalog.unwrap_or_default();
        let provider = match catalog_file.provider {
            Some(name) => parse_provider(&name)?,
            None => cli.provider,
        };
        let jamendo_client_id = catalog_file
            .jamendo_client_id
            .or_else(|| cli.jamendo_client_id.clone())
            .filter(|id| !id.trim().is_empty());
        if provider == ProviderKind::Jamendo && jamendo_client_id.is_none() {
            bail!("The jamendo provider requires a client id (--jamendo-client-id or jamendo_client_id in [catalog])");
        }

        let request_timeout_sec = catalog_file
            .request_timeout_sec
            .unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be greater than zero");
        }

        let catalog = CatalogSettings {
            provider,
            base_url: catalog_file.base_url.or_else(|| cli.base_url.clone()),
            jamendo_client_id,
            transport: TransportSettings {
                timeout: Duration::from_secs(request_timeout_sec),
                retry_on_timeout: catalog_file
                    .retry_on_timeout
                    .unwrap_or(cli.retry_on_timeout),
            },
        };

        // Recommendation settings - merge file config with defaults
        let defaults = RecommendationSettings::default();
        let rec_file = file.recommendations.unwrap_or_default();
        let recommendations = RecommendationSettings {
            liked_window: rec_file.liked_window.unwrap_or(defaults.liked_window),
            max_artists: rec_file.max_artists.unwrap_or(defaults.max_artists),
            tracks_per_artist: rec_file
                .tracks_per_artist
                .unwrap_or(defaults.tracks_per_artist),
        };
        if recommendations.liked_window == 0
            || recommendations.max_artists == 0
            || recommendations.tracks_per_artist == 0
        {
            bail!("[recommendations] values must be greater than zero");
        }

        Ok(Self {
            db_dir,
            catalog,
            recommendations,
        })
    }

    pub fn discovery_db_path(&self) -> PathBuf {
        self.db_dir.join("discovery.db")
    }

    pub fn playlist_db_path(&self) -> PathBuf {
        self.db_dir.join("playlist.db")
    }
}

/// Uses clap's ValueEnum trait for parsing.
fn parse_provider(s: &str) -> Result<ProviderKind> {
    ProviderKind::from_str(s, true)
        .map_err(|_| anyhow::anyhow!("Unknown catalog provider '{}', expected deezer or jamendo", s))
}
