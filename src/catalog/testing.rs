//! In-memory catalog used by unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{CatalogError, CatalogProvider, Track};

pub fn track(id: &str, artist_id: &str) -> Track {
    Track {
        provider_track_id: id.to_string(),
        title: format!("Track {}", id),
        artist: format!("Artist {}", artist_id),
        artist_id: Some(artist_id.to_string()),
        audio_url: None,
        image_url: None,
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    top_tracks: Mutex<HashMap<String, Vec<Track>>>,
    failing_artists: Mutex<HashSet<String>>,
    random_pool: Mutex<Vec<Track>>,
    random_pool_fails: Mutex<bool>,
    call_counts: Mutex<HashMap<String, usize>>,
    requested_pool_sizes: Mutex<Vec<usize>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_top_tracks(&self, artist_id: &str, tracks: Vec<Track>) {
        self.top_tracks
            .lock()
            .unwrap()
            .insert(artist_id.to_string(), tracks);
    }

    pub fn fail_artist(&self, artist_id: &str) {
        self.failing_artists
            .lock()
            .unwrap()
            .insert(artist_id.to_string());
    }

    pub fn set_random_pool(&self, tracks: Vec<Track>) {
        *self.random_pool.lock().unwrap() = tracks;
    }

    pub fn fail_random_pool(&self) {
        *self.random_pool_fails.lock().unwrap() = true;
    }

    pub fn call_count(&self, method: &str) -> usize {
        *self.call_counts.lock().unwrap().get(method).unwrap_or(&0)
    }

    pub fn total_calls(&self) -> usize {
        self.call_counts.lock().unwrap().values().sum()
    }

    pub fn requested_pool_sizes(&self) -> Vec<usize> {
        self.requested_pool_sizes.lock().unwrap().clone()
    }

    fn increment_call(&self, method: &str) {
        *self
            .call_counts
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_insert(0) += 1;
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        self.increment_call("search");
        let pool = self.random_pool.lock().unwrap();
        Ok(pool
            .iter()
            .filter(|t| t.title.contains(query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn top_tracks_for_artist(
        &self,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>, CatalogError> {
        self.increment_call("top_tracks_for_artist");
        if self.failing_artists.lock().unwrap().contains(artist_id) {
            return Err(CatalogError::Status {
                provider: "fake",
                status: 500,
                message: format!("artist {} unavailable", artist_id),
            });
        }
        Ok(self
            .top_tracks
            .lock()
            .unwrap()
            .get(artist_id)
            .map(|tracks| tracks.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn random_pool(&self, pool_size: usize) -> Result<Vec<Track>, CatalogError> {
        self.increment_call("random_pool");
        self.requested_pool_sizes.lock().unwrap().push(pool_size);
        if *self.random_pool_fails.lock().unwrap() {
            return Err(CatalogError::Timeout { provider: "fake" });
        }
        Ok(self
            .random_pool
            .lock()
            .unwrap()
            .iter()
            .take(pool_size)
            .cloned()
            .collect())
    }
}
