//! Preference signal models

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::catalog::Track;

/// Number of onboarding-sourced signals after which a user is onboarded.
pub const ONBOARDING_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceStatus {
    Like,
    Dislike,
}

impl PreferenceStatus {
    pub fn to_int(&self) -> i32 {
        match self {
            PreferenceStatus::Like => 1,
            PreferenceStatus::Dislike => 2,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(PreferenceStatus::Like),
            2 => Some(PreferenceStatus::Dislike),
            _ => None,
        }
    }
}

/// Where in the product a signal was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceSource {
    Onboarding,
    Home,
    Search,
}

impl PreferenceSource {
    pub fn to_int(&self) -> i32 {
        match self {
            PreferenceSource::Onboarding => 1,
            PreferenceSource::Home => 2,
            PreferenceSource::Search => 3,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(PreferenceSource::Onboarding),
            2 => Some(PreferenceSource::Home),
            3 => Some(PreferenceSource::Search),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSignal {
    pub id: usize,
    pub user_id: usize,
    pub provider_track_id: String,
    pub title: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub status: PreferenceStatus,
    pub source: PreferenceSource,
    /// Unix seconds of the last upsert.
    pub updated: i64,
}

impl PreferenceSignal {
    pub fn track(&self) -> Track {
        Track {
            provider_track_id: self.provider_track_id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            artist_id: self.artist_id.clone(),
            audio_url: self.audio_url.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Result of an upsert: the stored signal and the user's onboarding flag after it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub signal: PreferenceSignal,
    pub onboarding_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryUser {
    pub id: usize,
    pub handle: String,
    pub onboarding_completed: bool,
}
