//! Canonical track shape shared by every catalog provider.

use serde::{Deserialize, Serialize};

/// Artist name used when a provider payload carries no artist at all.
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Title used when a provider payload carries no title at all.
pub const UNTITLED: &str = "Untitled";

/// A catalog item as returned by a provider, normalized.
///
/// Optional fields serialize as explicit `null` so consumers can tell a field the
/// provider never sent apart from one it sent as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub provider_track_id: String,
    pub title: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
}

/// Providers are inconsistent about numeric vs string identifiers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProviderId {
    Number(i64),
    Text(String),
}

impl ProviderId {
    pub(crate) fn into_string(self) -> String {
        match self {
            ProviderId::Number(n) => n.to_string(),
            ProviderId::Text(s) => s,
        }
    }
}

/// Resolves a provider fallback chain such as `cover_xl -> cover_big -> cover_medium`.
///
/// The first non-empty candidate wins. If every candidate that was sent is empty
/// the result is `Some("")`, and only when nothing was sent is it `None`.
pub(crate) fn first_present<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut saw_empty = false;
    for candidate in candidates.into_iter().flatten() {
        if candidate.is_empty() {
            saw_empty = true;
        } else {
            return Some(candidate);
        }
    }
    saw_empty.then(String::new)
}
