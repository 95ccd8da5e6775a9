//! SQLite-backed file and hash store.
//!
//! Two tables with the same shape:
//!
//! - `lookup`: every file seen by the most recent scans, with its hash once
//!   computed. Duplicate queries run against this table.
//! - `permanent`: hashes of files hashed in earlier runs. A rescan copies a
//!   hash back into `lookup` when the file's stat data is unchanged.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use thiserror::Error;

use super::record::{FileRecord, StoredFile};
use crate::index::{ContentHash, HashIndex};

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS lookup (
        filename TEXT PRIMARY KEY,
        hash TEXT,
        size INTEGER,
        inode INTEGER,
        mtime INTEGER,
        ctime INTEGER
    );

    CREATE TABLE IF NOT EXISTS permanent (
        filename TEXT PRIMARY KEY,
        hash TEXT,
        size INTEGER,
        inode INTEGER,
        mtime INTEGER,
        ctime INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_lookup_hash ON lookup(hash);
    CREATE INDEX IF NOT EXISTS idx_lookup_size ON lookup(size);
";

/// Rows matching a directory: the directory itself or anything below it.
const IN_DIR: &str = "(filename = ?1 OR substr(filename, 1, ?3) = ?2)";

/// Errors from the hash store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or initialised.
    #[error("cannot open hash database {path}: {source}")]
    Open {
        /// Database location
        path: PathBuf,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// The parent directory of the database could not be created.
    #[error("cannot create directory for hash database {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A query failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Counts reported by [`HashStore::purge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Rows removed from `lookup`
    pub lookup_cleared: usize,
    /// Cached hashes whose file no longer exists
    pub stale_removed: usize,
    /// Cached hashes that are not valid digests
    pub invalid_removed: usize,
}

/// Persistent store of file stat data and content hashes.
pub struct HashStore {
    conn: Connection,
}

impl std::fmt::Debug for HashStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl HashStore {
    /// Open (or create) the store at `path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// `CreateDir` or `Open` if the database cannot be set up.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch(SCHEMA)
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!("Opened hash database at {}", path.display());
        Ok(Self { conn })
    }

    /// Open a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// `Open` if SQLite fails to initialise.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert scanned files into `lookup`, replacing existing rows.
    ///
    /// Replaced rows lose their hash. Runs in a single transaction.
    ///
    /// # Errors
    ///
    /// Any SQLite error; the transaction is rolled back.
    pub fn insert_records(&mut self, records: &[FileRecord]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO lookup (filename, hash, size, inode, mtime, ctime)
                 VALUES (?1, NULL, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                stmt.execute(params![
                    path_text(&record.path),
                    to_sql_int(record.size),
                    to_sql_int(record.inode),
                    record.mtime_ns,
                    record.ctime_ns,
                ])?;
            }
        }
        tx.commit()?;
        log::trace!("Inserted {} record(s)", records.len());
        Ok(records.len())
    }

    /// Store computed hashes for files already in `lookup`.
    ///
    /// Runs in a single transaction; unknown paths are ignored.
    ///
    /// # Errors
    ///
    /// Any SQLite error; the transaction is rolled back.
    pub fn update_hashes(&mut self, hashes: &[(PathBuf, ContentHash)]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE lookup SET hash = ?1 WHERE filename = ?2")?;
            for (path, hash) in hashes {
                updated += stmt.execute(params![hash.as_str(), path_text(path)])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Unhashed files whose size is shared with at least one other file.
    ///
    /// Only these can possibly have a duplicate, so only these get hashed.
    /// Sorted by path.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn unhashed_size_collisions(&self) -> StoreResult<Vec<PathBuf>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.filename FROM lookup l
             JOIN (SELECT size FROM lookup GROUP BY size HAVING count(*) > 1) s
               ON l.size = s.size
             WHERE l.hash IS NULL
             ORDER BY l.filename",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(|r| r.map(PathBuf::from).map_err(StoreError::from))
            .collect()
    }

    /// Every `(hash, path)` whose hash is shared by more than one file.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn dupes(&self) -> StoreResult<HashIndex> {
        let mut stmt = self.conn.prepare(
            "SELECT l.hash, l.filename FROM lookup l
             JOIN (SELECT hash FROM lookup WHERE hash IS NOT NULL
                   GROUP BY hash HAVING count(*) > 1) h
               ON l.hash = h.hash",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut index = HashIndex::new();
        for row in rows {
            let (hash, path) = row?;
            index.add(ContentHash::from(hash), PathBuf::from(path));
        }
        log::debug!(
            "Loaded {} duplicate file(s) in {} group(s)",
            index.len(),
            index.group_count()
        );
        Ok(index)
    }

    /// Remove `dir` and everything below it from `lookup`.
    ///
    /// Matching is by path component: removing `/a/b` leaves `/a/bc` alone.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn delete_dir(&mut self, dir: &Path) -> StoreResult<usize> {
        let (exact, prefix, len) = dir_pattern(dir);
        let removed = self.conn.execute(
            &format!("DELETE FROM lookup WHERE {IN_DIR}"),
            params![exact, prefix, len],
        )?;
        log::debug!("Removed {} row(s) under {}", removed, dir.display());
        Ok(removed)
    }

    /// Remove a single file from `lookup`.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn delete_file(&mut self, path: &Path) -> StoreResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM lookup WHERE filename = ?1",
            params![path_text(path)],
        )?;
        Ok(removed > 0)
    }

    /// Files stored under `dir` (component-wise), sorted.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn files_in_dir(&self, dir: &Path) -> StoreResult<Vec<PathBuf>> {
        let (exact, prefix, len) = dir_pattern(dir);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT filename FROM lookup WHERE {IN_DIR} ORDER BY filename"
        ))?;
        let rows = stmt.query_map(params![exact, prefix, len], |row| row.get::<_, String>(0))?;
        rows.map(|r| r.map(PathBuf::from).map_err(StoreError::from))
            .collect()
    }

    /// Number of `lookup` rows under `dir` (component-wise).
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn count_in_dir(&self, dir: &Path) -> StoreResult<usize> {
        let (exact, prefix, len) = dir_pattern(dir);
        let n: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM lookup WHERE {IN_DIR}"),
            params![exact, prefix, len],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Look up the stored row of `path`.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn get(&self, path: &Path) -> StoreResult<Option<StoredFile>> {
        let row = self
            .conn
            .query_row(
                "SELECT filename, hash, size, inode, mtime, ctime FROM lookup WHERE filename = ?1",
                params![path_text(path)],
                |row| {
                    Ok(StoredFile {
                        record: FileRecord {
                            path: PathBuf::from(row.get::<_, String>(0)?),
                            size: from_sql_int(row.get(2)?),
                            inode: from_sql_int(row.get(3)?),
                            mtime_ns: row.get(4)?,
                            ctime_ns: row.get(5)?,
                        },
                        hash: row.get::<_, Option<String>>(1)?.map(ContentHash::from),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Copy cached hashes from `permanent` into `lookup`.
    ///
    /// Only rows whose path, size, inode, mtime and ctime all match are
    /// restored. Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn restore_cached_hashes(&mut self) -> StoreResult<usize> {
        let restored = self.conn.execute(
            "UPDATE lookup SET hash = permanent.hash
             FROM permanent
             WHERE permanent.filename = lookup.filename
               AND permanent.size = lookup.size
               AND permanent.inode = lookup.inode
               AND permanent.mtime = lookup.mtime
               AND permanent.ctime = lookup.ctime
               AND permanent.hash IS NOT NULL
               AND lookup.hash IS NULL",
            [],
        )?;
        log::debug!("Restored {} cached hash(es)", restored);
        Ok(restored)
    }

    /// Cache the hashed `lookup` rows under `dir` in `permanent`.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn cache_dir(&mut self, dir: &Path) -> StoreResult<usize> {
        let (exact, prefix, len) = dir_pattern(dir);
        let cached = self.conn.execute(
            &format!(
                "REPLACE INTO permanent (filename, hash, size, inode, mtime, ctime)
                 SELECT filename, hash, size, inode, mtime, ctime FROM lookup
                 WHERE {IN_DIR} AND hash IS NOT NULL"
            ),
            params![exact, prefix, len],
        )?;
        log::debug!("Cached {} hash(es) under {}", cached, dir.display());
        Ok(cached)
    }

    /// Drop unhashed `lookup` rows whose file is gone.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn remove_missing_unhashed(&mut self) -> StoreResult<usize> {
        let candidates = self.filenames("SELECT filename FROM lookup WHERE hash IS NULL")?;
        let tx = self.conn.transaction()?;
        let removed = delete_missing(&tx, "lookup", &candidates)?;
        tx.commit()?;
        if removed > 0 {
            log::debug!("Removed {} vanished unhashed file(s)", removed);
        }
        Ok(removed)
    }

    /// Clear `lookup` and prune `permanent` of stale or malformed rows.
    ///
    /// # Errors
    ///
    /// Any SQLite error; nothing is changed in that case.
    pub fn purge(&mut self) -> StoreResult<PurgeSummary> {
        let cached = self.filenames("SELECT filename FROM permanent")?;

        let mut invalid = Vec::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT filename, hash FROM permanent")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            for row in rows {
                let (filename, hash) = row?;
                let valid = hash.is_some_and(|h| ContentHash::from(h).is_valid_digest());
                if !valid {
                    invalid.push(filename);
                }
            }
        }

        let tx = self.conn.transaction()?;
        let lookup_cleared = tx.execute("DELETE FROM lookup", [])?;
        let invalid_removed = {
            let mut stmt = tx.prepare_cached("DELETE FROM permanent WHERE filename = ?1")?;
            let mut n = 0;
            for filename in &invalid {
                n += stmt.execute(params![filename])?;
            }
            n
        };
        let stale_removed = delete_missing(&tx, "permanent", &cached)?;
        tx.commit()?;

        let summary = PurgeSummary {
            lookup_cleared,
            stale_removed,
            invalid_removed,
        };
        log::info!(
            "Purged hash database: {} scan row(s) cleared, {} stale and {} invalid cache row(s) removed",
            summary.lookup_cleared,
            summary.stale_removed,
            summary.invalid_removed
        );
        Ok(summary)
    }

    /// Empty both tables.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn clear_cache(&mut self) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM lookup", [])?;
        tx.execute("DELETE FROM permanent", [])?;
        tx.commit()?;
        log::info!("Cleared hash database");
        Ok(())
    }

    /// Number of rows in `lookup`.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn lookup_count(&self) -> StoreResult<usize> {
        self.count("SELECT count(*) FROM lookup")
    }

    /// Number of rows in `permanent`.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn cached_count(&self) -> StoreResult<usize> {
        self.count("SELECT count(*) FROM permanent")
    }

    /// Toggle SQLite's `query_only` mode; writes fail while it is on.
    ///
    /// # Errors
    ///
    /// Any SQLite error.
    pub fn set_query_only(&self, on: bool) -> StoreResult<()> {
        self.conn.pragma_update(None, "query_only", on)?;
        Ok(())
    }

    fn count(&self, sql: &str) -> StoreResult<usize> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    fn filenames(&self, sql: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.map(|r| r.map_err(StoreError::from)).collect()
    }
}

/// Delete rows of `table` whose filename no longer exists on disk.
fn delete_missing(tx: &Transaction<'_>, table: &str, filenames: &[String]) -> StoreResult<usize> {
    let mut stmt = tx.prepare(&format!("DELETE FROM {table} WHERE filename = ?1"))?;
    let mut removed = 0;
    for filename in filenames {
        if std::fs::symlink_metadata(filename).is_err() {
            removed += stmt.execute(params![filename])?;
        }
    }
    Ok(removed)
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Bind values for [`IN_DIR`]: the directory, its `dir/` prefix and the
/// prefix length in characters.
fn dir_pattern(dir: &Path) -> (String, String, i64) {
    let exact = path_text(dir);
    let prefix = if exact.ends_with('/') {
        exact.clone()
    } else {
        format!("{exact}/")
    };
    let len = i64::try_from(prefix.chars().count()).unwrap_or(i64::MAX);
    (exact, prefix, len)
}

// SQLite integers are signed; the bit pattern round-trips.
#[allow(clippy::cast_possible_wrap)]
fn to_sql_int(value: u64) -> i64 {
    value as i64
}

#[allow(clippy::cast_sign_loss)]
fn from_sql_int(value: i64) -> u64 {
    value as u64
}
