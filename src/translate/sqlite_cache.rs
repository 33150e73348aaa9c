//! Durable translation cache backed by SQLite.
//! Same blake3 key as the in-memory tier. Entries survive across the
//! independent per-keystroke processes the launcher spawns; retention is
//! enforced per entry at read time (no background sweep).

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::cache::{CacheKey, RETENTION_HORIZON};

/// SQLite-backed translation cache.
/// Storage failures never surface to the query path: reads degrade to
/// misses and writes are dropped, with a warning.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    ttl_secs: u64,
}

impl SqliteCache {
    /// Open (or create) the cache database at the given path with the
    /// default 24-hour retention horizon.
    pub fn open(db_path: &Path) -> Result<Self, String> {
        Self::open_with_retention(db_path, RETENTION_HORIZON)
    }

    /// Open with an explicit retention horizon.
    pub fn open_with_retention(db_path: &Path, retention: Duration) -> Result<Self, String> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create cache directory: {e}"))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| format!("failed to open SQLite cache: {e}"))?;

        // WAL mode so overlapping queries from concurrent invocations
        // don't block each other on reads
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| format!("PRAGMA failed: {e}"))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translation_cache (
                cache_key BLOB PRIMARY KEY,
                translated_text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_cache_created
                ON translation_cache(created_at);",
        )
        .map_err(|e| format!("create table failed: {e}"))?;

        info!(path = %db_path.display(), "SQLite translation cache opened");

        Ok(Self {
            conn: Mutex::new(conn),
            ttl_secs: retention.as_secs(),
        })
    }

    /// Look up a cached translation. Returns None if absent or older than
    /// the retention horizon; a stale row is deleted as a side effect of
    /// the read.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let conn = self.conn.lock();
        let cutoff = now_unix() - self.ttl_secs as i64;

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT translated_text, created_at FROM translation_cache
                 WHERE cache_key = ?1",
                params![key.as_slice()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .unwrap_or_else(|e| {
                warn!(error = %e, "cache read failed, treating as miss");
                None
            });

        match row {
            Some((text, created_at)) if created_at > cutoff => {
                debug!("durable cache hit");
                Some(text)
            }
            Some(_) => {
                if let Err(e) = conn.execute(
                    "DELETE FROM translation_cache
                     WHERE cache_key = ?1 AND created_at <= ?2",
                    params![key.as_slice(), cutoff],
                ) {
                    warn!(error = %e, "stale entry eviction failed");
                }
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite the entry for `key` with `created_at = now`.
    /// Last writer wins; failures drop the write.
    pub fn insert(&self, key: &CacheKey, translated_text: &str) {
        let conn = self.conn.lock();
        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO translation_cache
             (cache_key, translated_text, created_at)
             VALUES (?1, ?2, ?3)",
            params![key.as_slice(), translated_text, now_unix()],
        ) {
            warn!(error = %e, "cache insert failed");
        }
    }

    #[cfg(test)]
    fn entry_count(&self) -> i64 {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM translation_cache", [], |row| {
            row.get(0)
        })
        .unwrap_or(0)
    }
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::cache::compute_key;
    use tempfile::TempDir;

    fn open_cache(dir: &TempDir) -> SqliteCache {
        SqliteCache::open(&dir.path().join("cache.db")).unwrap()
    }

    #[test]
    fn round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        let key = compute_key("你好世界", "m", "p");

        cache.insert(&key, "hello");
        assert_eq!(cache.get(&key).as_deref(), Some("hello"));
    }

    #[test]
    fn missing_key_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        assert_eq!(cache.get(&compute_key("没有", "m", "p")), None);
    }

    #[test]
    fn stale_entry_is_dropped_on_read() {
        let dir = TempDir::new().unwrap();
        let cache =
            SqliteCache::open_with_retention(&dir.path().join("cache.db"), Duration::ZERO)
                .unwrap();
        let key = compute_key("你好世界", "m", "p");

        cache.insert(&key, "hello");
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn insert_overwrites_with_fresh_timestamp() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir);
        let key = compute_key("你好世界", "m", "p");

        cache.insert(&key, "first");
        cache.insert(&key, "second");
        assert_eq!(cache.get(&key).as_deref(), Some("second"));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("cache.db");
        let key = compute_key("你好世界", "m", "p");

        {
            let cache = SqliteCache::open(&db_path).unwrap();
            cache.insert(&key, "hello");
        }

        let reopened = SqliteCache::open(&db_path).unwrap();
        assert_eq!(reopened.get(&key).as_deref(), Some("hello"));
    }
}
