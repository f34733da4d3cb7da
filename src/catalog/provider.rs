use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use super::{CatalogError, Track};

/// Smallest pool requested when sampling, however few tracks are wanted.
pub const MIN_SAMPLE_POOL: usize = 30;

/// Over-fetch factor applied to the requested sample size.
pub const SAMPLE_OVERFETCH: usize = 3;

/// The capability set every catalog provider offers.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Free-text search, ordered by provider relevance.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError>;

    /// An artist's tracks, ordered by provider popularity.
    async fn top_tracks_for_artist(
        &self,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>, CatalogError>;

    /// A single request against a randomized region of the catalog.
    ///
    /// The order of the returned tracks is whatever the provider uses, which is
    /// usually far from random; `sample_random` takes care of that.
    async fn random_pool(&self, pool_size: usize) -> Result<Vec<Track>, CatalogError>;

    /// Up to `count` distinct tracks in uniformly shuffled order.
    async fn sample_random(&self, count: usize) -> Result<Vec<Track>, CatalogError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let pool = self.random_pool(sample_pool_size(count)).await?;
        Ok(sample_from_pool(pool, count))
    }
}

pub fn sample_pool_size(count: usize) -> usize {
    count.saturating_mul(SAMPLE_OVERFETCH).max(MIN_SAMPLE_POOL)
}

/// Drops duplicate ids, shuffles (Fisher-Yates) and keeps the first `count`.
pub fn sample_from_pool(pool: Vec<Track>, count: usize) -> Vec<Track> {
    let mut seen = HashSet::with_capacity(pool.len());
    let mut unique: Vec<Track> = pool
        .into_iter()
        .filter(|track| seen.insert(track.provider_track_id.clone()))
        .collect();
    unique.shuffle(&mut rand::rng());
    unique.truncate(count);
    unique
}
