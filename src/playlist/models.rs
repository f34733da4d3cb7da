use serde::{Deserialize, Serialize};

/// A track a user added to their own playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedTrack {
    pub id: usize,
    pub title: String,
    pub artist: String,
    pub url: Option<String>,
    pub owner_id: usize,
    /// Unix seconds.
    pub created: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOwnedTrack {
    pub title: String,
    pub artist: String,
    pub url: Option<String>,
    pub owner_id: usize,
    /// Explicit creation time for imports; the store's clock is used when absent.
    #[serde(default)]
    pub created: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    /// `page` and `limit` are expected to be already normalized (both ≥ 1).
    pub fn compute(total: usize, page: usize, limit: usize) -> Self {
        let total_pages = total.div_ceil(limit.max(1)).max(1);
        PageMeta {
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
