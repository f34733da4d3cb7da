//! Deezer public API client.
//!
//! Deezer signals success with a top-level `data` array. Failures come back as
//! an `error` object, frequently with HTTP 200, so the envelope is inspected
//! even on success statuses.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Response;
use serde::Deserialize;
use tracing::debug;

use super::models::{first_present, ProviderId, UNKNOWN_ARTIST, UNTITLED};
use super::transport::{ProviderHttp, TransportSettings};
use super::{CatalogError, CatalogProvider, Track};

pub const DEFAULT_DEEZER_BASE_URL: &str = "https://api.deezer.com";

const PROVIDER: &str = "deezer";

/// Topics the random pool is drawn from.
const RANDOM_SEEDS: &[&str] = &[
    "rock",
    "pop",
    "hip hop",
    "jazz",
    "indie",
    "electronic",
    "brasil",
    "soul",
];
const MAX_RANDOM_INDEX: u32 = 120;

#[derive(Deserialize)]
struct DeezerEnvelope {
    data: Option<Vec<DeezerTrack>>,
    error: Option<DeezerErrorBody>,
}

#[derive(Deserialize)]
struct DeezerErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct DeezerTrack {
    id: Option<ProviderId>,
    title: Option<String>,
    preview: Option<String>,
    artist: Option<DeezerArtist>,
    album: Option<DeezerAlbum>,
}

#[derive(Deserialize)]
struct DeezerArtist {
    id: Option<ProviderId>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct DeezerAlbum {
    cover_xl: Option<String>,
    cover_big: Option<String>,
    cover_medium: Option<String>,
}

impl DeezerTrack {
    /// Tracks without an id cannot be liked or deduplicated and are dropped.
    fn into_track(self) -> Option<Track> {
        let provider_track_id = self.id?.into_string();
        let (artist, artist_id) = match self.artist {
            Some(artist) => (artist.name, artist.id.map(ProviderId::into_string)),
            None => (None, None),
        };
        let image_url = self
            .album
            .and_then(|album| first_present([album.cover_xl, album.cover_big, album.cover_medium]));

        Some(Track {
            provider_track_id,
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            artist: artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            artist_id,
            audio_url: self.preview,
            image_url,
        })
    }
}

pub struct DeezerClient {
    http: ProviderHttp,
}

impl DeezerClient {
    pub fn new(base_url: &str, transport: &TransportSettings) -> Result<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, base_url, transport)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn fetch_tracks(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Track>, CatalogError> {
        let response = self.http.get(resource, query).await?;
        let tracks = parse_response(response).await?;
        debug!(provider = PROVIDER, resource, count = tracks.len(), "Fetched tracks");
        Ok(tracks)
    }
}

async fn parse_response(response: Response) -> Result<Vec<Track>, CatalogError> {
    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Status {
            provider: PROVIDER,
            status: status.as_u16(),
            message: "Deezer request failed".to_string(),
        });
    }

    let envelope: DeezerEnvelope = response
        .json()
        .await
        .map_err(|e| CatalogError::from_transport(PROVIDER, e))?;
    envelope_tracks(envelope)
}

fn envelope_tracks(envelope: DeezerEnvelope) -> Result<Vec<Track>, CatalogError> {
    if let Some(error) = envelope.error {
        return Err(CatalogError::Provider {
            provider: PROVIDER,
            message: error
                .message
                .unwrap_or_else(|| "Deezer returned an error".to_string()),
        });
    }

    Ok(envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(DeezerTrack::into_track)
        .collect())
}

#[async_trait]
impl CatalogProvider for DeezerClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        self.fetch_tracks(
            "search",
            &[("q", query.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn top_tracks_for_artist(
        &self,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>, CatalogError> {
        let resource = format!("artist/{}/top", urlencoding::encode(artist_id));
        self.fetch_tracks(&resource, &[("limit", limit.to_string())])
            .await
    }

    async fn random_pool(&self, pool_size: usize) -> Result<Vec<Track>, CatalogError> {
        let (seed, index) = {
            let mut rng = rand::rng();
            (
                RANDOM_SEEDS[rng.random_range(0..RANDOM_SEEDS.len())],
                rng.random_range(0..MAX_RANDOM_INDEX),
            )
        };
        debug!(provider = PROVIDER, seed, index, pool_size, "Drawing random pool");

        self.fetch_tracks(
            "search",
            &[
                ("q", seed.to_string()),
                ("index", index.to_string()),
                ("limit", pool_size.to_string()),
            ],
        )
        .await
    }
}
