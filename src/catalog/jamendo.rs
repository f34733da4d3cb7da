//! Jamendo v3 API client.
//!
//! Every response carries a `headers` block whose `status` is `"success"` when
//! the call worked; anything else comes with an `error_message`.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Response;
use serde::Deserialize;
use tracing::debug;

use super::models::{first_present, ProviderId, UNKNOWN_ARTIST, UNTITLED};
use super::transport::{ProviderHttp, TransportSettings};
use super::{CatalogError, CatalogProvider, Track};

pub const DEFAULT_JAMENDO_BASE_URL: &str = "https://api.jamendo.com/v3.0";

const PROVIDER: &str = "jamendo";
const MAX_RANDOM_OFFSET: u32 = 1200;

#[derive(Deserialize, Default)]
struct JamendoEnvelope {
    headers: Option<JamendoHeaders>,
    results: Option<Vec<JamendoTrack>>,
}

#[derive(Deserialize, Default)]
struct JamendoHeaders {
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct JamendoTrack {
    id: Option<ProviderId>,
    name: Option<String>,
    artist_name: Option<String>,
    artist_id: Option<ProviderId>,
    audio: Option<String>,
    audiodownload: Option<String>,
    image: Option<String>,
    album_image: Option<String>,
    artist_image: Option<String>,
}

impl JamendoTrack {
    fn into_track(self) -> Option<Track> {
        Some(Track {
            provider_track_id: self.id?.into_string(),
            title: self.name.unwrap_or_else(|| UNTITLED.to_string()),
            artist: self.artist_name.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            artist_id: self.artist_id.map(ProviderId::into_string),
            audio_url: first_present([self.audio, self.audiodownload]),
            image_url: first_present([self.image, self.album_image, self.artist_image]),
        })
    }
}

pub struct JamendoClient {
    http: ProviderHttp,
    client_id: String,
}

impl JamendoClient {
    pub fn new(base_url: &str, client_id: &str, transport: &TransportSettings) -> Result<Self> {
        Ok(Self {
            http: ProviderHttp::new(PROVIDER, base_url, transport)?,
            client_id: client_id.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn fetch_tracks(&self, params: &[(&str, String)]) -> Result<Vec<Track>, CatalogError> {
        let mut query = vec![
            ("client_id", self.client_id.clone()),
            ("format", "json".to_string()),
            ("include", "musicinfo".to_string()),
        ];
        query.extend(params.iter().cloned());

        let response = self.http.get("tracks", &query).await?;
        let tracks = parse_response(response).await?;
        debug!(provider = PROVIDER, count = tracks.len(), "Fetched tracks");
        Ok(tracks)
    }
}

async fn parse_response(response: Response) -> Result<Vec<Track>, CatalogError> {
    let status = response.status();
    if !status.is_success() {
        // Jamendo usually still sends its envelope on errors; surface its message.
        let message = response
            .json::<JamendoEnvelope>()
            .await
            .ok()
            .and_then(|envelope| envelope.headers)
            .and_then(|headers| headers.error_message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Jamendo request failed".to_string());
        return Err(CatalogError::Status {
            provider: PROVIDER,
            status: status.as_u16(),
            message,
        });
    }

    let envelope: JamendoEnvelope = response
        .json()
        .await
        .map_err(|e| CatalogError::from_transport(PROVIDER, e))?;
    envelope_tracks(envelope)
}

fn envelope_tracks(envelope: JamendoEnvelope) -> Result<Vec<Track>, CatalogError> {
    let headers = envelope.headers.unwrap_or_default();
    if let Some(status) = headers.status {
        if status != "success" {
            return Err(CatalogError::Provider {
                provider: PROVIDER,
                message: headers
                    .error_message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| format!("Jamendo responded with status '{}'", status)),
            });
        }
    }

    Ok(envelope
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(JamendoTrack::into_track)
        .collect())
}

#[async_trait]
impl CatalogProvider for JamendoClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        self.fetch_tracks(&[
            ("namesearch", query.to_string()),
            ("order", "popularity_total".to_string()),
            ("type", "single albumtrack".to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn top_tracks_for_artist(
        &self,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>, CatalogError> {
        self.fetch_tracks(&[
            ("artist_id", artist_id.to_string()),
            ("order", "popularity_total".to_string()),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn random_pool(&self, pool_size: usize) -> Result<Vec<Track>, CatalogError> {
        let offset = rand::rng().random_range(0..MAX_RANDOM_OFFSET);
        debug!(provider = PROVIDER, offset, pool_size, "Drawing random pool");

        self.fetch_tracks(&[
            ("order", "releasedate".to_string()),
            ("offset", offset.to_string()),
            ("limit", pool_size.to_string()),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Vec<Track>, CatalogError> {
        envelope_tracks(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn maps_track_payload() {
        let tracks = parse(json!({
            "headers": {"status": "success", "code": 0, "error_message": "", "results_count": 1},
            "results": [{
                "id": "1204669",
                "name": "Wish You Were Here",
                "artist_id": "7872",
                "artist_name": "Wobbly",
                "audio": "https://prod.example/stream.mp3",
                "audiodownload": "https://prod.example/download.mp3",
                "image": "",
                "album_image": "https://img.example/album.jpg"
            }]
        }))
        .unwrap();

        assert_eq!(
            tracks,
            vec![Track {
                provider_track_id: "1204669".to_string(),
                title: "Wish You Were Here".to_string(),
                artist: "Wobbly".to_string(),
                artist_id: Some("7872".to_string()),
                audio_url: Some("https://prod.example/stream.mp3".to_string()),
                image_url: Some("https://img.example/album.jpg".to_string()),
            }]
        );
    }

    #[test]
    fn audio_falls_back_to_download_url() {
        let tracks = parse(json!({
            "headers": {"status": "success"},
            "results": [{"id": 5, "name": "N", "artist_name": "A", "audiodownload": "d.mp3"}]
        }))
        .unwrap();
        assert_eq!(tracks[0].audio_url, Some("d.mp3".to_string()));
        assert_eq!(tracks[0].image_url, None);
        assert_eq!(tracks[0].artist_id, None);
    }

    #[test]
    fn non_success_status_is_an_upstream_failure() {
        let err = parse(json!({
            "headers": {"status": "failed", "code": 5, "error_message": "Your credential is not authorized."},
            "results": []
        }))
        .unwrap_err();

        match err {
            CatalogError::Provider { provider, message } => {
                assert_eq!(provider, "jamendo");
                assert_eq!(message, "Your credential is not authorized.");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn non_success_status_without_message_has_a_default() {
        let err = parse(json!({"headers": {"status": "failed"}})).unwrap_err();
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    fn missing_results_is_an_empty_result() {
        assert!(parse(json!({"headers": {"status": "success"}}))
            .unwrap()
            .is_empty());
    }
}
