//! Artist-affinity recommendations.
//!
//! Candidates come from the top tracks of the artists a user liked most
//! recently, in that order, topped up with a random sample when the artists
//! cannot fill the request. The result is never re-sorted.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{CatalogProvider, Track};
use crate::error::DiscoveryError;
use crate::preferences::{PreferenceSignal, PreferenceStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationSettings {
    /// How many of the most recent likes are considered.
    pub liked_window: usize,
    pub max_artists: usize,
    pub tracks_per_artist: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            liked_window: 30,
            max_artists: 3,
            tracks_per_artist: 10,
        }
    }
}

pub struct RecommendationGenerator {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn PreferenceStore>,
    settings: RecommendationSettings,
}

/// Up to `max` distinct artist ids, most recent like first.
fn candidate_artists(liked: &[PreferenceSignal], max: usize) -> Vec<&str> {
    let mut artists: Vec<&str> = Vec::with_capacity(max);
    for artist_id in liked.iter().filter_map(|s| s.artist_id.as_deref()) {
        if artists.len() == max {
            break;
        }
        if !artists.contains(&artist_id) {
            artists.push(artist_id);
        }
    }
    artists
}

/// Accumulates tracks in arrival order, skipping liked and repeated ids.
struct Selection {
    liked_ids: HashSet<String>,
    seen_ids: HashSet<String>,
    tracks: Vec<Track>,
    limit: usize,
}

impl Selection {
    fn new(liked_ids: HashSet<String>, limit: usize) -> Self {
        Self {
            liked_ids,
            seen_ids: HashSet::with_capacity(limit),
            tracks: Vec::with_capacity(limit),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.tracks.len() >= self.limit
    }

    /// Appends what fits; returns true once the selection is full.
    fn extend(&mut self, candidates: Vec<Track>) -> bool {
        for track in candidates {
            if self.is_full() {
                break;
            }
            if self.liked_ids.contains(track.provider_track_id.as_str())
                || !self.seen_ids.insert(track.provider_track_id.clone())
            {
                continue;
            }
            self.tracks.push(track);
        }
        self.is_full()
    }
}

impl RecommendationGenerator {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<dyn PreferenceStore>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            catalog,
            store,
            settings,
        }
    }

    /// At most `limit` tracks, none of them liked by the user and no id twice.
    ///
    /// Issues at most one provider call per candidate artist plus one fallback
    /// call. A failing artist only loses its own tracks; a failing fallback fails
    /// the whole request.
    pub async fn generate(&self, user_id: usize, limit: usize) -> Result<Vec<Track>, DiscoveryError> {
        if self.store.is_onboarding_completed(user_id)?.is_none() {
            return Err(DiscoveryError::UserNotFound(user_id));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let liked = self
            .store
            .list_liked(user_id, Some(self.settings.liked_window))?;
        if liked.is_empty() {
            debug!(user_id, limit, "No liked tracks, recommending a random sample");
            return Ok(self.catalog.sample_random(limit).await?);
        }

        // The window only picks artists; exclusion covers every like.
        let artists = candidate_artists(&liked, self.settings.max_artists);
        let mut selection = Selection::new(self.store.liked_track_ids(user_id)?, limit);

        for artist_id in &artists {
            match self
                .catalog
                .top_tracks_for_artist(artist_id, self.settings.tracks_per_artist)
                .await
            {
                Ok(tracks) => {
                    if selection.extend(tracks) {
                        debug!(user_id, limit, "Recommendations filled from liked artists");
                        return Ok(selection.tracks);
                    }
                }
                Err(err) => {
                    warn!(user_id, artist_id, provider = err.provider(), "Skipping artist: {}", err);
                }
            }
        }

        let from_artists = selection.tracks.len();
        let fallback = self.catalog.sample_random(limit.saturating_mul(2)).await?;
        selection.extend(fallback);
        debug!(
            user_id,
            limit,
            artists = artists.len(),
            from_artists,
            total = selection.tracks.len(),
            "Recommendations topped up from random sample"
        );

        let mut tracks = selection.tracks;
        tracks.truncate(limit);
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{track, FakeCatalog};
    use crate::preferences::{PreferenceSource, PreferenceStatus, SqliteDiscoveryStore, UserStore};
    use tempfile::TempDir;

    struct Fixture {
        catalog: Arc<FakeCatalog>,
        store: Arc<SqliteDiscoveryStore>,
        generator: RecommendationGenerator,
        user_id: usize,
        _temp_dir: TempDir,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteDiscoveryStore::new(temp_dir.path().join("discovery.db")).unwrap());
        let user_id = store.create_user("listener").unwrap();
        let catalog = Arc::new(FakeCatalog::new());
        let generator = RecommendationGenerator::new(
            catalog.clone(),
            store.clone(),
            RecommendationSettings::default(),
        );
        Fixture {
            catalog,
            store,
            generator,
            user_id,
            _temp_dir: temp_dir,
        }
    }

    impl Fixture {
        fn like(&self, liked: Track) {
            self.store
                .upsert_signal(self.user_id, &liked, PreferenceStatus::Like, PreferenceSource::Home)
                .unwrap()
                .unwrap();
        }

        fn artist_top(&self, artist_id: &str, ids: &[&str]) {
            self.catalog
                .set_top_tracks(artist_id, ids.iter().map(|id| track(id, artist_id)).collect());
        }

        fn random_pool(&self, ids: &[&str]) {
            self.catalog
                .set_random_pool(ids.iter().map(|id| track(id, "random")).collect());
        }
    }

    fn ids(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.provider_track_id.as_str()).collect()
    }

    fn assert_no_duplicates(tracks: &[Track]) {
        let unique: HashSet<_> = tracks.iter().map(|t| &t.provider_track_id).collect();
        assert_eq!(unique.len(), tracks.len());
    }

    #[tokio::test]
    async fn cold_start_returns_random_distinct_tracks() {
        let f = fixture();
        f.random_pool(&["r1", "r2", "r3", "r4", "r5", "r6"]);

        let tracks = f.generator.generate(f.user_id, 3).await.unwrap();

        assert_eq!(tracks.len(), 3);
        assert_no_duplicates(&tracks);
        assert_eq!(f.catalog.call_count("random_pool"), 1);
        assert_eq!(f.catalog.call_count("top_tracks_for_artist"), 0);
    }

    #[tokio::test]
    async fn most_recent_artist_comes_first() {
        let f = fixture();
        f.like(track("liked_b", "B"));
        f.like(track("liked_a", "A"));
        f.artist_top("A", &["a1", "a2", "a3"]);
        f.artist_top("B", &["b1", "b2", "b3", "b4"]);

        let tracks = f.generator.generate(f.user_id, 5).await.unwrap();

        assert_eq!(ids(&tracks), vec!["a1", "a2", "a3", "b1", "b2"]);
        assert_eq!(f.catalog.call_count("random_pool"), 0);
    }

    #[tokio::test]
    async fn stops_mid_artist_when_full() {
        let f = fixture();
        f.like(track("liked_b", "B"));
        f.like(track("liked_a", "A"));
        f.artist_top("A", &["a1", "a2", "a3", "a4"]);
        f.artist_top("B", &["b1"]);

        let tracks = f.generator.generate(f.user_id, 2).await.unwrap();

        assert_eq!(ids(&tracks), vec!["a1", "a2"]);
        assert_eq!(f.catalog.call_count("top_tracks_for_artist"), 1);
        assert_eq!(f.catalog.total_calls(), 1);
    }

    #[tokio::test]
    async fn skips_liked_and_repeated_tracks() {
        let f = fixture();
        f.like(track("shared", "B"));
        f.like(track("a1", "A"));
        f.artist_top("A", &["a1", "shared", "a2", "x"]);
        f.artist_top("B", &["x", "shared", "b1"]);
        f.random_pool(&["a2", "r1", "a1", "r2"]);

        let tracks = f.generator.generate(f.user_id, 5).await.unwrap();

        assert_eq!(&ids(&tracks)[..3], &["a2", "x", "b1"]);
        assert_eq!(tracks.len(), 5);
        assert_no_duplicates(&tracks);
        assert!(tracks
            .iter()
            .all(|t| t.provider_track_id != "a1" && t.provider_track_id != "shared"));
    }

    #[tokio::test]
    async fn tops_up_from_random_sample() {
        let f = fixture();
        f.like(track("liked", "A"));
        f.artist_top("A", &["a1"]);
        f.random_pool(&["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8"]);

        let tracks = f.generator.generate(f.user_id, 4).await.unwrap();

        assert_eq!(tracks.len(), 4);
        assert_eq!(tracks[0].provider_track_id, "a1");
        assert!(tracks[1..].iter().all(|t| t.provider_track_id.starts_with('r')));
        // 2 * limit requested, with the pool floor applied.
        assert_eq!(f.catalog.requested_pool_sizes(), vec![30]);
    }

    #[tokio::test]
    async fn returns_fewer_when_provider_runs_dry() {
        let f = fixture();
        f.like(track("liked", "A"));
        f.artist_top("A", &["a1", "liked"]);
        f.random_pool(&["liked", "r1"]);

        let tracks = f.generator.generate(f.user_id, 10).await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_no_duplicates(&tracks);
    }

    #[tokio::test]
    async fn likes_outside_the_window_are_still_excluded() {
        let f = fixture();
        f.like(track("old_liked", "A"));
        for i in 0..30 {
            f.like(track(&format!("recent{}", i), "A"));
        }
        f.artist_top("A", &["old_liked", "recent3", "a1", "a2"]);

        let tracks = f.generator.generate(f.user_id, 2).await.unwrap();

        assert_eq!(ids(&tracks), vec!["a1", "a2"]);
        assert_eq!(f.store.list_liked(f.user_id, Some(30)).unwrap().len(), 30);
    }

    #[tokio::test]
    async fn failing_artist_is_skipped() {
        let f = fixture();
        f.like(track("liked_b", "B"));
        f.like(track("liked_a", "A"));
        f.catalog.fail_artist("A");
        f.artist_top("B", &["b1", "b2"]);

        let tracks = f.generator.generate(f.user_id, 2).await.unwrap();

        assert_eq!(ids(&tracks), vec!["b1", "b2"]);
        assert_eq!(f.catalog.call_count("top_tracks_for_artist"), 2);
    }

    #[tokio::test]
    async fn failing_fallback_propagates() {
        let f = fixture();
        f.like(track("liked", "A"));
        f.artist_top("A", &["a1"]);
        f.catalog.fail_random_pool();

        let err = f.generator.generate(f.user_id, 5).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn calls_are_bounded_by_artists_plus_one() {
        let f = fixture();
        for artist in ["D", "C", "B", "A"] {
            f.like(track(&format!("liked_{}", artist), artist));
        }
        for artist in ["A", "B", "C", "D"] {
            let top_id = format!("{}1", artist.to_lowercase());
            f.artist_top(artist, &[top_id.as_str()]);
        }
        f.random_pool(&["r1", "r2"]);

        let tracks = f.generator.generate(f.user_id, 10).await.unwrap();

        assert_eq!(ids(&tracks)[..3], ["a1", "b1", "c1"]);
        assert_eq!(f.catalog.call_count("top_tracks_for_artist"), 3);
        assert_eq!(f.catalog.call_count("random_pool"), 1);
        assert!(f.catalog.total_calls() <= 4);
    }

    #[tokio::test]
    async fn signals_without_artist_are_ignored() {
        let f = fixture();
        f.like(track("liked_a", "A"));
        f.like(Track {
            artist_id: None,
            ..track("anonymous", "?")
        });
        f.artist_top("A", &["a1"]);
        f.random_pool(&["r1"]);

        let tracks = f.generator.generate(f.user_id, 2).await.unwrap();
        assert_eq!(ids(&tracks), vec!["a1", "r1"]);
        assert_eq!(f.catalog.call_count("top_tracks_for_artist"), 1);
    }

    #[tokio::test]
    async fn zero_limit_makes_no_calls() {
        let f = fixture();
        f.like(track("liked", "A"));
        assert!(f.generator.generate(f.user_id, 0).await.unwrap().is_empty());
        assert_eq!(f.catalog.total_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture();
        let err = f.generator.generate(999, 5).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::UserNotFound(999)));
        assert_eq!(f.catalog.total_calls(), 0);
    }

    #[test]
    fn candidate_artists_are_distinct_and_capped() {
        let signal = |id: &str, artist: Option<&str>| PreferenceSignal {
            id: 0,
            user_id: 1,
            provider_track_id: id.to_string(),
            title: String::new(),
            artist: String::new(),
            artist_id: artist.map(str::to_string),
            audio_url: None,
            image_url: None,
            status: PreferenceStatus::Like,
            source: PreferenceSource::Home,
            updated: 0,
        };
        let liked = vec![
            signal("1", Some("x")),
            signal("2", None),
            signal("3", Some("x")),
            signal("4", Some("y")),
            signal("5", Some("z")),
            signal("6", Some("w")),
        ];
        assert_eq!(candidate_artists(&liked, 3), vec!["x", "y", "z"]);
        assert_eq!(candidate_artists(&liked, 1), vec!["x"]);
    }
}
