use super::models::{DiscoveryUser, PreferenceSignal, PreferenceSource, PreferenceStatus, UpsertOutcome};
use crate::catalog::Track;
use anyhow::Result;
use std::collections::HashSet;

pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: usize) -> Result<Option<DiscoveryUser>>;

    /// Returns a user's id given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;
}

pub trait PreferenceStore: Send + Sync {
    /// Inserts or replaces the signal for (user, track), then flips the user's
    /// onboarding flag if this was an onboarding signal that reached the threshold.
    /// Returns Ok(None) if the user does not exist.
    fn upsert_signal(
        &self,
        user_id: usize,
        track: &Track,
        status: PreferenceStatus,
        source: PreferenceSource,
    ) -> Result<Option<UpsertOutcome>>;

    /// LIKE signals, most recently updated first.
    fn list_liked(&self, user_id: usize, limit: Option<usize>) -> Result<Vec<PreferenceSignal>>;

    /// Ids of every track the user currently likes, however old the like.
    fn liked_track_ids(&self, user_id: usize) -> Result<HashSet<String>>;

    fn count_onboarding_signals(&self, user_id: usize) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn is_onboarding_completed(&self, user_id: usize) -> Result<Option<bool>>;
}

pub trait FullDiscoveryStore: UserStore + PreferenceStore {}

impl<T: UserStore + PreferenceStore> FullDiscoveryStore for T {}
