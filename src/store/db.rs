//! Local store trait and its SQLite implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::error::StoreError;
use super::schema;
use super::types::{LastRun, MediaRow, StoreSummary, SyncRunStats};
use crate::catalog::{MediaKind, MediaSummary, Readiness};
use crate::sync::SyncMode;

/// Local side of a sync run, and the read path used when serving the mirror.
///
/// Object-safe so the engine can hold an `Arc<dyn LocalStore>`. The store is
/// the only authority on which identifiers are already synchronized.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Every identifier currently stored.
    async fn load_seen_ids(&self) -> Result<HashSet<String>, StoreError>;

    /// Persist a batch as a single unit: either every row lands or none do.
    async fn write_batch(&self, rows: &[MediaRow]) -> Result<(), StoreError>;

    /// All stored summaries, newest capture first.
    async fn load_all_media(&self) -> Result<Vec<MediaSummary>, StoreError>;

    /// Thumbnail payload for `id`, or `None` if it is not stored.
    async fn load_thumbnail(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Record the start of a sync run and return its ID.
    async fn start_sync_run(&self, mode: SyncMode) -> Result<i64, StoreError>;

    async fn complete_sync_run(&self, run_id: i64, stats: &SyncRunStats)
        -> Result<(), StoreError>;

    async fn get_summary(&self) -> Result<StoreSummary, StoreError>;
}

/// SQLite-backed [`LocalStore`].
pub struct SqliteStore {
    /// `rusqlite::Connection` is not `Sync`; every call locks it briefly and
    /// never holds the guard across an await.
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create the store at `path` and run migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        let open_path = path.clone();

        let conn = tokio::task::spawn_blocking(move || {
            let open_err = |source: rusqlite::Error| StoreError::Open {
                path: open_path.clone(),
                source,
            };
            let conn = Connection::open(&open_path).map_err(open_err)?;
            conn.pragma_update(None, "journal_mode", "WAL").map_err(open_err)?;
            conn.pragma_update(None, "synchronous", "NORMAL").map_err(open_err)?;
            schema::migrate(&conn)?;
            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn load_seen_ids(&self) -> Result<HashSet<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT id FROM media")
            .map_err(StoreError::query)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StoreError::query)?
            .collect::<Result<HashSet<_>, _>>()
            .map_err(StoreError::query)?;
        Ok(ids)
    }

    async fn write_batch(&self, rows: &[MediaRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let synced_at = Utc::now().timestamp();
        let mut conn = self.lock()?;
        // Dropping the transaction without commit rolls the whole batch back.
        let tx = conn.transaction().map_err(StoreError::query)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    r#"
                    INSERT INTO media (id, captured_at, camera_model, size_bytes, status, resolution,
                                       duration_secs, kind, width, height, thumbnail, synced_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ON CONFLICT(id) DO UPDATE SET
                        captured_at = excluded.captured_at,
                        camera_model = excluded.camera_model,
                        size_bytes = excluded.size_bytes,
                        status = excluded.status,
                        resolution = excluded.resolution,
                        duration_secs = excluded.duration_secs,
                        kind = excluded.kind,
                        width = excluded.width,
                        height = excluded.height,
                        thumbnail = excluded.thumbnail,
                        synced_at = excluded.synced_at
                    "#,
                )
                .map_err(StoreError::query)?;

            for row in rows {
                let m = row.summary();
                stmt.execute(rusqlite::params![
                    row.id(),
                    m.captured_at.timestamp_millis(),
                    m.camera_model,
                    m.size_bytes as i64,
                    m.status.as_str(),
                    m.resolution,
                    m.duration_secs,
                    m.kind.as_str(),
                    m.width,
                    m.height,
                    row.thumbnail(),
                    synced_at,
                ])
                .map_err(StoreError::query)?;
            }
        }
        tx.commit().map_err(StoreError::query)?;
        Ok(())
    }

    async fn load_all_media(&self) -> Result<Vec<MediaSummary>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, captured_at, camera_model, size_bytes, status, resolution, duration_secs, kind, width, height \
                 FROM media ORDER BY captured_at DESC, id",
            )
            .map_err(StoreError::query)?;
        let media = stmt
            .query_map([], row_to_summary)
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;
        Ok(media)
    }

    async fn load_thumbnail(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT thumbnail FROM media WHERE id = ?1",
            [id],
            |row| row.get::<_, Vec<u8>>(0),
        )
        .optional()
        .map_err(StoreError::query)
    }

    async fn start_sync_run(&self, mode: SyncMode) -> Result<i64, StoreError> {
        let started_at = Utc::now().timestamp();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sync_runs (mode, started_at) VALUES (?1, ?2)",
            rusqlite::params![mode.as_str(), started_at],
        )
        .map_err(StoreError::query)?;
        Ok(conn.last_insert_rowid())
    }

    async fn complete_sync_run(
        &self,
        run_id: i64,
        stats: &SyncRunStats,
    ) -> Result<(), StoreError> {
        let completed_at = Utc::now().timestamp();
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sync_runs SET completed_at = ?1, pages_fetched = ?2, items_listed = ?3, items_added = ?4, interrupted = ?5, error = ?6 WHERE id = ?7",
            rusqlite::params![
                completed_at,
                stats.pages_fetched as i64,
                stats.items_listed as i64,
                stats.items_added as i64,
                stats.interrupted,
                stats.error,
                run_id,
            ],
        )
        .map_err(StoreError::query)?;
        Ok(())
    }

    async fn get_summary(&self) -> Result<StoreSummary, StoreError> {
        let conn = self.lock()?;
        let mut summary = StoreSummary::default();

        {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT kind, COUNT(*), COALESCE(SUM(LENGTH(thumbnail)), 0) FROM media GROUP BY kind",
                )
                .map_err(StoreError::query)?;
            let counts = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(StoreError::query)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::query)?;

            for (kind, count, bytes) in counts {
                let kind = MediaKind::from_str(&kind).unwrap_or(MediaKind::Other);
                summary.add_kind(kind, count as u64);
                summary.thumbnail_bytes += bytes as u64;
            }
        }

        summary.last_run = conn
            .query_row(
                "SELECT mode, started_at, completed_at, items_added, interrupted, error FROM sync_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, bool>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(StoreError::query)?
            .map(
                |(mode, started, completed, added, interrupted, error)| LastRun {
                    mode: SyncMode::from_str(&mode).unwrap_or(SyncMode::Incremental),
                    started_at: from_secs(started),
                    completed_at: completed.map(from_secs),
                    items_added: added as u64,
                    interrupted,
                    error,
                },
            );

        Ok(summary)
    }
}

fn from_secs(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaSummary> {
    let captured_ms: i64 = row.get(1)?;
    let status: String = row.get(4)?;
    let kind: String = row.get(7)?;
    Ok(MediaSummary {
        id: row.get(0)?,
        captured_at: Utc
            .timestamp_millis_opt(captured_ms)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH),
        camera_model: row.get(2)?,
        size_bytes: row.get::<_, i64>(3)? as u64,
        status: Readiness::from_str(&status).unwrap_or(Readiness::Unknown),
        resolution: row.get(5)?,
        duration_secs: row.get(6)?,
        kind: MediaKind::from_str(&kind).unwrap_or(MediaKind::Other),
        width: row.get(8)?,
        height: row.get(9)?,
    })
}
