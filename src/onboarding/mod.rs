//! First-run onboarding: a batch of random tracks to vote on until the user has
//! cast enough onboarding signals.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CatalogProvider, Track};
use crate::error::DiscoveryError;
use crate::preferences::{PreferenceStore, ONBOARDING_THRESHOLD};

pub const MIN_BATCH_SIZE: usize = 10;
pub const MAX_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingBatch {
    pub completed: bool,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub completed: bool,
    pub onboarding_signals: usize,
    pub threshold: usize,
}

pub struct OnboardingOrchestrator {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn PreferenceStore>,
}

impl OnboardingOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogProvider>, store: Arc<dyn PreferenceStore>) -> Self {
        Self { catalog, store }
    }

    /// Random tracks to vote on, or an empty completed batch once onboarded.
    pub async fn get_batch(&self, user_id: usize, count: usize) -> Result<OnboardingBatch, DiscoveryError> {
        let completed = self
            .store
            .is_onboarding_completed(user_id)?
            .ok_or(DiscoveryError::UserNotFound(user_id))?;
        if completed {
            return Ok(OnboardingBatch {
                completed: true,
                tracks: Vec::new(),
            });
        }

        let count = count.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        let tracks = self.catalog.sample_random(count).await?;
        debug!(user_id, count, returned = tracks.len(), "Prepared onboarding batch");
        Ok(OnboardingBatch {
            completed: false,
            tracks,
        })
    }

    pub fn status(&self, user_id: usize) -> Result<OnboardingStatus, DiscoveryError> {
        let completed = self
            .store
            .is_onboarding_completed(user_id)?
            .ok_or(DiscoveryError::UserNotFound(user_id))?;
        Ok(OnboardingStatus {
            completed,
            onboarding_signals: self.store.count_onboarding_signals(user_id)?,
            threshold: ONBOARDING_THRESHOLD,
        })
    }
}
