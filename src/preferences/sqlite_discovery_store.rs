use crate::catalog::Track;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::models::{
    DiscoveryUser, PreferenceSignal, PreferenceSource, PreferenceStatus, UpsertOutcome,
    ONBOARDING_THRESHOLD,
};
use super::preference_store::{PreferenceStore, UserStore};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("handle", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

const PREFERENCE_SIGNAL_TABLE_V_0: Table = Table {
    name: "preference_signal",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("provider_track_id", SqlType::Text, non_null = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("artist", SqlType::Text, non_null = true),
        sqlite_column!("artist_id", SqlType::Text),
        sqlite_column!("audio_url", SqlType::Text),
        sqlite_column!("image_url", SqlType::Text),
        sqlite_column!("status", SqlType::Integer, non_null = true),
        sqlite_column!("source", SqlType::Integer, non_null = true),
        // Store-wide upsert counter, orders signals by recency without timestamp ties.
        sqlite_column!("seq", SqlType::Integer, non_null = true),
        sqlite_column!(
            "updated",
            SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "provider_track_id"]],
    indices: &[("idx_preference_signal_user", "user_id")],
};

/// V 1
const USER_TABLE_V_1: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("handle", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "onboarding_completed",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[USER_TABLE_V_0, PREFERENCE_SIGNAL_TABLE_V_0],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[USER_TABLE_V_1, PREFERENCE_SIGNAL_TABLE_V_0],
        migration: Some(|conn: &Connection| {
            conn.execute(
                "ALTER TABLE user ADD COLUMN onboarding_completed INTEGER NOT NULL DEFAULT 0",
                [],
            )?;
            Ok(())
        }),
    },
];

const SIGNAL_COLUMNS: &str = "id, user_id, provider_track_id, title, artist, artist_id, \
     audio_url, image_url, status, source, updated";

fn signal_from_row(row: &Row) -> rusqlite::Result<PreferenceSignal> {
    let status: i32 = row.get(8)?;
    let source: i32 = row.get(9)?;
    Ok(PreferenceSignal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider_track_id: row.get(2)?,
        title: row.get(3)?,
        artist: row.get(4)?,
        artist_id: row.get(5)?,
        audio_url: row.get(6)?,
        image_url: row.get(7)?,
        status: PreferenceStatus::from_int(status)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(8, status as i64))?,
        source: PreferenceSource::from_int(source)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(9, source as i64))?,
        updated: row.get(10)?,
    })
}

/// SQLite-backed users and preference signals.
#[derive(Clone)]
pub struct SqliteDiscoveryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDiscoveryStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        info!("Opening discovery database at {:?}", db_path.as_ref());
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteDiscoveryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteDiscoveryStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("INSERT INTO {} (handle) VALUES (?1)", USER_TABLE_V_1.name),
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user(&self, user_id: usize) -> Result<Option<DiscoveryUser>> {
        let conn = self.conn.lock().unwrap();
        let user = conn
            .query_row(
                &format!(
                    "SELECT id, handle, onboarding_completed FROM {} WHERE id = ?1",
                    USER_TABLE_V_1.name
                ),
                params![user_id],
                |row| {
                    Ok(DiscoveryUser {
                        id: row.get(0)?,
                        handle: row.get(1)?,
                        onboarding_completed: row.get::<_, i32>(2)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE handle = ?1", USER_TABLE_V_1.name),
                params![user_handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl PreferenceStore for SqliteDiscoveryStore {
    fn upsert_signal(
        &self,
        user_id: usize,
        track: &Track,
        status: PreferenceStatus,
        source: PreferenceSource,
    ) -> Result<Option<UpsertOutcome>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let user_exists = tx
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", USER_TABLE_V_1.name),
                params![user_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !user_exists {
            return Ok(None);
        }

        let seq: i64 = tx.query_row(
            &format!(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM {}",
                PREFERENCE_SIGNAL_TABLE_V_0.name
            ),
            [],
            |row| row.get(0),
        )?;
        let now = chrono::Utc::now().timestamp();

        tx.execute(
            &format!(
                "INSERT INTO {} (user_id, provider_track_id, title, artist, artist_id, audio_url, \
                 image_url, status, source, seq, updated) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
                 ON CONFLICT(user_id, provider_track_id) DO UPDATE SET \
                 title = excluded.title, artist = excluded.artist, artist_id = excluded.artist_id, \
                 audio_url = excluded.audio_url, image_url = excluded.image_url, \
                 status = excluded.status, source = excluded.source, seq = excluded.seq, \
                 updated = excluded.updated",
                PREFERENCE_SIGNAL_TABLE_V_0.name
            ),
            params![
                user_id,
                track.provider_track_id,
                track.title,
                track.artist,
                track.artist_id,
                track.audio_url,
                track.image_url,
                status.to_int(),
                source.to_int(),
                seq,
                now
            ],
        )
        .with_context(|| {
            format!(
                "Failed to upsert signal for user {} and track {}",
                user_id, track.provider_track_id
            )
        })?;

        if source == PreferenceSource::Onboarding {
            let onboarding_signals: usize = tx.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND source = ?2",
                    PREFERENCE_SIGNAL_TABLE_V_0.name
                ),
                params![user_id, PreferenceSource::Onboarding.to_int()],
                |row| row.get(0),
            )?;
            if onboarding_signals >= ONBOARDING_THRESHOLD {
                let flipped = tx.execute(
                    &format!(
                        "UPDATE {} SET onboarding_completed = 1 \
                         WHERE id = ?1 AND onboarding_completed = 0",
                        USER_TABLE_V_1.name
                    ),
                    params![user_id],
                )?;
                if flipped > 0 {
                    info!(user_id, onboarding_signals, "User completed onboarding");
                }
            }
        }

        let signal = tx.query_row(
            &format!(
                "SELECT {} FROM {} WHERE user_id = ?1 AND provider_track_id = ?2",
                SIGNAL_COLUMNS, PREFERENCE_SIGNAL_TABLE_V_0.name
            ),
            params![user_id, track.provider_track_id],
            signal_from_row,
        )?;
        let onboarding_completed = tx.query_row(
            &format!(
                "SELECT onboarding_completed FROM {} WHERE id = ?1",
                USER_TABLE_V_1.name
            ),
            params![user_id],
            |row| row.get::<_, i32>(0),
        )? != 0;

        tx.commit()?;
        debug!(user_id, provider_track_id = %signal.provider_track_id, ?status, ?source, "Stored preference signal");

        Ok(Some(UpsertOutcome {
            signal,
            onboarding_completed,
        }))
    }

    fn list_liked(&self, user_id: usize, limit: Option<usize>) -> Result<Vec<PreferenceSignal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE user_id = ?1 AND status = ?2 ORDER BY seq DESC LIMIT ?3",
            SIGNAL_COLUMNS, PREFERENCE_SIGNAL_TABLE_V_0.name
        ))?;
        // A negative LIMIT means no limit in SQLite.
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let signals = stmt
            .query_map(
                params![user_id, PreferenceStatus::Like.to_int(), limit],
                signal_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(signals)
    }

    fn liked_track_ids(&self, user_id: usize) -> Result<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT provider_track_id FROM {} WHERE user_id = ?1 AND status = ?2",
            PREFERENCE_SIGNAL_TABLE_V_0.name
        ))?;
        let ids = stmt
            .query_map(params![user_id, PreferenceStatus::Like.to_int()], |row| {
                row.get(0)
            })?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(ids)
    }

    fn count_onboarding_signals(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND source = ?2",
                PREFERENCE_SIGNAL_TABLE_V_0.name
            ),
            params![user_id, PreferenceSource::Onboarding.to_int()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn is_onboarding_completed(&self, user_id: usize) -> Result<Option<bool>> {
        let conn = self.conn.lock().unwrap();
        let completed = conn
            .query_row(
                &format!(
                    "SELECT onboarding_completed FROM {} WHERE id = ?1",
                    USER_TABLE_V_1.name
                ),
                params![user_id],
                |row| row.get::<_, i32>(0),
            )
            .optional()?;
        Ok(completed.map(|flag| flag != 0))
    }
}
