//! Durable play history.
//!
//! Every normalized music track observed on the feeds is appended to the
//! history store, which the reconciler reads back to backfill the recent
//! list. We use SQLite for persistent storage with an abstract trait for
//! testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use super::config::HistoryConfig;
use crate::error::Result;
use crate::models::{PersistedTrackRecord, Track};

/// Abstract persistence interface.
///
/// Implementations hold at most one record per `id`; re-saving an existing
/// id is a no-op. Presenter segments are rejected before they reach the
/// store (see [`Track::is_presenter_segment`]).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist one record. Saving an id that already exists is a no-op.
    async fn save(&self, record: PersistedTrackRecord) -> Result<()>;

    /// Most recent records, newest first, up to `limit`.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<PersistedTrackRecord>>;

    /// Delete records played before `cutoff`. Returns the number removed.
    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Creates a history store from configuration.
///
/// Always a SQLite-backed store at the configured database path.
pub fn history_store_from_config(config: &HistoryConfig) -> Result<Arc<dyn HistoryStore>> {
    let store = SqliteHistoryStore::new(&config.database_path)?;
    Ok(Arc::new(store))
}

/// Persist a track unless it is a presenter segment. Convenience used by
/// the feed handlers.
pub async fn save_track(
    store: &dyn HistoryStore,
    track: &Track,
    played_at: DateTime<Utc>,
) -> Result<()> {
    if track.is_presenter_segment {
        return Ok(());
    }
    store
        .save(PersistedTrackRecord::from_track(track, played_at))
        .await
}

// ============================================================================
// SQLite store
// ============================================================================

pub struct SqliteHistoryStore {
    conn: Arc<StdMutex<rusqlite::Connection>>,
}

impl SqliteHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = rusqlite::Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS played_tracks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                album TEXT NOT NULL,
                artwork TEXT NOT NULL,
                played_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_played_tracks_played_at ON played_tracks(played_at_ms);",
        )?;

        Ok(Self {
            conn: Arc::new(StdMutex::new(conn)),
        })
    }

    fn conn(&self) -> Arc<StdMutex<rusqlite::Connection>> {
        self.conn.clone()
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn save(&self, record: PersistedTrackRecord) -> Result<()> {
        let conn = self.conn();
        spawn_blocking(move || -> Result<()> {
            let conn = conn.lock().unwrap();
            conn.execute(
                "INSERT OR IGNORE INTO played_tracks (id, title, artist, album, artwork, played_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    record.id,
                    record.title,
                    record.artist,
                    record.album,
                    record.artwork,
                    record.played_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| crate::error::Error::store_error(e.to_string()))??;
        Ok(())
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<PersistedTrackRecord>> {
        let conn = self.conn();
        let limit = limit as i64;
        spawn_blocking(move || -> Result<Vec<PersistedTrackRecord>> {
            let conn = conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT id, title, artist, album, artwork, played_at_ms
                 FROM played_tracks
                 ORDER BY played_at_ms DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query([limit])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let played_at_ms: i64 = row.get(5)?;
                let played_at = DateTime::<Utc>::from_timestamp_millis(played_at_ms)
                    .ok_or_else(|| crate::error::Error::store_error("invalid timestamp"))?;
                records.push(PersistedTrackRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    artist: row.get(2)?,
                    album: row.get(3)?,
                    artwork: row.get(4)?,
                    played_at,
                });
            }
            Ok(records)
        })
        .await
        .map_err(|e| crate::error::Error::store_error(e.to_string()))?
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn();
        let cutoff_ms = cutoff.timestamp_millis();
        let removed = spawn_blocking(move || -> Result<usize> {
            let conn = conn.lock().unwrap();
            let removed = conn.execute(
                "DELETE FROM played_tracks WHERE played_at_ms < ?1",
                rusqlite::params![cutoff_ms],
            )?;
            Ok(removed)
        })
        .await
        .map_err(|e| crate::error::Error::store_error(e.to_string()))??;
        Ok(removed)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile store for tests and environments without a writable disk.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<PersistedTrackRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, record: PersistedTrackRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        if records.iter().any(|existing| existing.id == record.id) {
            return Ok(());
        }
        records.push(record);
        Ok(())
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<PersistedTrackRecord>> {
        let records = self.records.lock().await;
        let mut recent: Vec<PersistedTrackRecord> = records.clone();
        recent.sort_by_key(|record| std::cmp::Reverse(record.played_at));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.played_at >= cutoff);
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, title: &str, minutes_ago: i64) -> PersistedTrackRecord {
        PersistedTrackRecord {
            id: id.to_string(),
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: String::new(),
            artwork: String::new(),
            played_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_sqlite_save_and_fetch_newest_first() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(record("a", "Old", 30)).await.unwrap();
        store.save(record("b", "New", 5)).await.unwrap();

        let recent = store.fetch_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "New");
        assert_eq!(recent[1].title, "Old");
    }

    #[tokio::test]
    async fn test_sqlite_resave_same_id_is_noop() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(record("a", "First", 10)).await.unwrap();
        store.save(record("a", "Second", 1)).await.unwrap();

        let recent = store.fetch_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "First");
    }

    #[tokio::test]
    async fn test_sqlite_fetch_respects_limit() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        for i in 0..8 {
            store
                .save(record(&format!("id-{i}"), &format!("T{i}"), i))
                .await
                .unwrap();
        }
        let recent = store.fetch_recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].title, "T0");
    }

    #[tokio::test]
    async fn test_sqlite_prune() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(record("a", "Ancient", 60 * 24 * 10)).await.unwrap();
        store.save(record("b", "Fresh", 5)).await.unwrap();

        let cutoff = Utc::now() - Duration::days(7);
        let removed = store.prune_older_than(cutoff).await.unwrap();
        assert_eq!(removed, 1);

        let recent = store.fetch_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Fresh");
    }

    #[tokio::test]
    async fn test_memory_store_matches_sqlite_semantics() {
        let store = MemoryHistoryStore::new();
        store.save(record("a", "First", 10)).await.unwrap();
        store.save(record("a", "Second", 1)).await.unwrap();
        store.save(record("b", "New", 2)).await.unwrap();

        let recent = store.fetch_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "New");
        assert_eq!(recent[1].title, "First");

        let removed = store
            .prune_older_than(Utc::now() - Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_save_track_skips_presenter_segments() {
        let store = MemoryHistoryStore::new();
        save_track(&store, &Track::presenter_segment(), Utc::now())
            .await
            .unwrap();
        assert!(store.fetch_recent(10).await.unwrap().is_empty());
    }
}
