use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::models::{NewOwnedTrack, OwnedTrack, Page, PageMeta};
use super::query::{ListQuery, TrackFilters};

pub trait OwnedTrackStore: Send + Sync {
    /// Inserts a track and returns it as stored.
    fn create_track(&self, track: NewOwnedTrack) -> Result<OwnedTrack>;

    /// One page of tracks matching the query, with pagination metadata.
    fn list_tracks(&self, query: &ListQuery) -> Result<Page<OwnedTrack>>;
}

/// V 0
const OWNED_TRACK_TABLE_V_0: Table = Table {
    name: "owned_track",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("artist", SqlType::Text, non_null = true),
        sqlite_column!("url", SqlType::Text),
        sqlite_column!("owner_id", SqlType::Integer, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[
        ("idx_owned_track_created", "created"),
        ("idx_owned_track_owner", "owner_id"),
    ],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[OWNED_TRACK_TABLE_V_0],
    migration: None,
}];

fn track_from_row(row: &Row) -> rusqlite::Result<OwnedTrack> {
    Ok(OwnedTrack {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        url: row.get(3)?,
        owner_id: row.get(4)?,
        created: row.get(5)?,
    })
}

/// Escapes LIKE wildcards so filter text matches literally.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Builds the WHERE clause and its parameters for the given filters.
fn where_clause(filters: &TrackFilters) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(title) = &filters.title {
        conditions.push("title LIKE ? ESCAPE '\\'");
        params.push(Box::new(like_pattern(title)));
    }
    if let Some(artist) = &filters.artist {
        conditions.push("artist LIKE ? ESCAPE '\\'");
        params.push(Box::new(like_pattern(artist)));
    }
    if let Some(owner_id) = filters.owner_id {
        conditions.push("owner_id = ?");
        params.push(Box::new(owner_id as i64));
    }
    if let Some(from) = filters.created_from {
        conditions.push("created >= ?");
        params.push(Box::new(from));
    }
    if let Some(to) = filters.created_to {
        conditions.push("created <= ?");
        params.push(Box::new(to));
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

/// SQLite-backed owned tracks.
#[derive(Clone)]
pub struct SqliteTrackStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTrackStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        info!("Opening playlist database at {:?}", db_path.as_ref());
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteTrackStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl OwnedTrackStore for SqliteTrackStore {
    fn create_track(&self, track: NewOwnedTrack) -> Result<OwnedTrack> {
        let conn = self.conn.lock().unwrap();
        let created = track
            .created
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        conn.execute(
            &format!(
                "INSERT INTO {} (title, artist, url, owner_id, created) VALUES (?1, ?2, ?3, ?4, ?5)",
                OWNED_TRACK_TABLE_V_0.name
            ),
            params![track.title, track.artist, track.url, track.owner_id, created],
        )
        .with_context(|| format!("Failed to create track {}", track.title))?;

        Ok(OwnedTrack {
            id: conn.last_insert_rowid() as usize,
            title: track.title,
            artist: track.artist,
            url: track.url,
            owner_id: track.owner_id,
            created,
        })
    }

    fn list_tracks(&self, query: &ListQuery) -> Result<Page<OwnedTrack>> {
        let (where_sql, mut params) = where_clause(&query.filters);
        let conn = self.conn.lock().unwrap();

        let total: usize = {
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {}{}",
                    OWNED_TRACK_TABLE_V_0.name, where_sql
                ),
                params_refs.as_slice(),
                |row| row.get(0),
            )
            .context("Failed to count owned tracks")?
        };

        let direction = query.sort.direction.as_sql();
        let sql = format!(
            "SELECT id, title, artist, url, owner_id, created FROM {}{} \
             ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
            OWNED_TRACK_TABLE_V_0.name,
            where_sql,
            query.sort.field.column(),
            direction,
            direction
        );
        params.push(Box::new(query.limit as i64));
        params.push(Box::new(i64::try_from(query.offset()).unwrap_or(i64::MAX)));
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let data = stmt
            .query_map(params_refs.as_slice(), track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(total, returned = data.len(), page = query.page, "Listed owned tracks");

        Ok(Page {
            data,
            meta: PageMeta::compute(total, query.page, query.limit),
        })
    }
}
