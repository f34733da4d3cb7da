mod models;
pub mod query;
mod sqlite_track_store;

pub use models::{NewOwnedTrack, OwnedTrack, Page, PageMeta};
pub use query::{ListQuery, RawListParams, SortDirection, SortField, SortSpec, TrackFilters};
pub use sqlite_track_store::{OwnedTrackStore, SqliteTrackStore};
