//! Normalization of owned-track listing parameters.
//!
//! Anything that reaches this layer has been validated by the caller, so the
//! rules here never fail: bad values fall back to their defaults instead.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    Artist,
}

impl SortField {
    /// Unknown fields fall back to `createdAt`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("title") => SortField::Title,
            Some("artist") => SortField::Artist,
            _ => SortField::CreatedAt,
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created",
            SortField::Title => "title COLLATE NOCASE",
            SortField::Artist => "artist COLLATE NOCASE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackFilters {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub owner_id: Option<usize>,
    /// Inclusive lower bound, unix seconds.
    pub created_from: Option<i64>,
    /// Inclusive upper bound, unix seconds.
    pub created_to: Option<i64>,
}

/// Listing parameters exactly as a boundary layer received them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub owner_id: Option<usize>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: TrackFilters,
    pub sort: SortSpec,
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            filters: TrackFilters::default(),
            sort: SortSpec::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Rows skipped before the requested page; saturates for absurdly large pages.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl From<RawListParams> for ListQuery {
    fn from(raw: RawListParams) -> Self {
        ListQuery {
            filters: TrackFilters {
                title: normalize_text(raw.title),
                artist: normalize_text(raw.artist),
                owner_id: raw.owner_id,
                created_from: raw.created_from.as_deref().and_then(parse_date),
                created_to: raw.created_to.as_deref().and_then(parse_date),
            },
            sort: SortSpec {
                field: SortField::parse(raw.sort_by.as_deref()),
                direction: SortDirection::parse(raw.sort_order.as_deref()),
            },
            page: normalize_page(raw.page.as_deref()),
            limit: normalize_limit(raw.limit.as_deref()),
        }
    }
}

/// Missing, non-numeric or non-positive pages become the first page.
pub fn normalize_page(value: Option<&str>) -> usize {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(page) if page >= 1 => page as usize,
        _ => DEFAULT_PAGE,
    }
}

/// Missing or non-numeric limits become the default; numbers are clamped to [1, 100].
pub fn normalize_limit(value: Option<&str>) -> usize {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(limit) => limit.clamp(1, MAX_LIMIT as i64) as usize,
        None => DEFAULT_LIMIT,
    }
}

/// Whitespace-only filters are absent.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.timestamp());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc().timestamp())
}
