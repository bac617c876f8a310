//! Relational storage for the inverted index.
//!
//! ## Schema
//!
//! - `doc(id, kind, create_time, update_time)` - every searchable document
//! - `path(id, name, parent)` - interned path segments, rooted at id 1
//! - `doc_path(id, path)` / `doc_file(id, path)` - the two document kinds,
//!   each bound to exactly one path node
//! - `word(id, text)` - every word ever indexed
//! - `matches(word_id, doc_id, count, avg_position)` - one row per word and
//!   document
//!
//! Path nodes, words and documents are created on demand. Match rows are only
//! written by [`Store::flush`], inside a single transaction.

pub mod documents;
pub mod matches;
pub mod paths;
pub mod rows;

pub use paths::path_segments;
pub use rows::{DocumentRow, FromRow, MatchRow, PathNode};

use crate::error::{Error, Result, StorageContext};
use crate::index::types::PathId;
use lru::LruCache;
use rusqlite::Connection;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bumped whenever the schema changes incompatibly.
pub const SCHEMA_VERSION: i32 = 1;

/// Reserved id of the path tree root.
pub const ROOT_PATH_ID: PathId = 1;

/// Path segments remembered between lookups.
const SEGMENT_CACHE_SIZE: usize = 4096;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS doc (
        id          INTEGER PRIMARY KEY,
        kind        INTEGER NOT NULL,
        create_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        update_time INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );

    CREATE TABLE IF NOT EXISTS path (
        id     INTEGER PRIMARY KEY,
        name   TEXT NOT NULL,
        parent INTEGER REFERENCES path(id),
        UNIQUE(name, parent)
    );

    CREATE TABLE IF NOT EXISTS doc_path (
        id   INTEGER PRIMARY KEY REFERENCES doc(id),
        path INTEGER NOT NULL UNIQUE REFERENCES path(id)
    );

    CREATE TABLE IF NOT EXISTS doc_file (
        id   INTEGER PRIMARY KEY REFERENCES doc(id),
        path INTEGER NOT NULL UNIQUE REFERENCES path(id)
    );

    CREATE TABLE IF NOT EXISTS word (
        id   INTEGER PRIMARY KEY,
        text TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS matches (
        word_id      INTEGER NOT NULL REFERENCES word(id),
        doc_id       INTEGER NOT NULL REFERENCES doc(id),
        count        INTEGER NOT NULL,
        avg_position INTEGER NOT NULL,
        PRIMARY KEY (word_id, doc_id)
    ) WITHOUT ROWID;

    CREATE INDEX IF NOT EXISTS idx_matches_doc ON matches(doc_id);

    INSERT OR IGNORE INTO path(id, name, parent) VALUES (1, 'root', NULL);

    PRAGMA user_version = 1;
";

/// Handle on the index database.
pub struct Store {
    conn: Connection,
    location: Option<PathBuf>,
    /// (parent, name) -> child node id
    segments: LruCache<(PathId, String), PathId>,
}

impl Store {
    /// Open or create the index database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let conn = Connection::open(path).during("opening database")?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .during("configuring database")?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Throwaway database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().during("opening database")?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, location: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .during("configuring database")?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .during("reading schema version")?;
        if version != 0 && version != SCHEMA_VERSION {
            return Err(Error::InvalidArgument(format!(
                "database schema version {version} is not supported (expected {SCHEMA_VERSION})"
            )));
        }
        conn.execute_batch(SCHEMA).during("creating schema")?;
        debug!(location = ?location, "index database ready");

        let cache_size = NonZeroUsize::new(SEGMENT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            conn,
            location,
            segments: LruCache::new(cache_size),
        })
    }

    /// Database file, or `None` for an in-memory store.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Row count of one of the index tables.
    pub fn count_rows(&self, table: Table) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .during("counting rows")?;
        Ok(count as u64)
    }
}

/// Tables whose sizes are reported by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Doc,
    Path,
    DocPath,
    DocFile,
    Word,
    Matches,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Doc => "doc",
            Table::Path => "path",
            Table::DocPath => "doc_path",
            Table::DocFile => "doc_file",
            Table::Word => "word",
            Table::Matches => "matches",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_store_has_root_only() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.count_rows(Table::Path).unwrap(), 1);
        assert_eq!(store.count_rows(Table::Doc).unwrap(), 0);
        assert_eq!(store.count_rows(Table::Matches).unwrap(), 0);
        assert!(store.location().is_none());
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("index.db");

        {
            let mut store = Store::open(&db).unwrap();
            store.get_or_create_path_id(&["tmp", "a.txt"]).unwrap();
        }
        let store = Store::open(&db).unwrap();
        assert_eq!(store.location(), Some(db.as_path()));
        assert_eq!(store.count_rows(Table::Path).unwrap(), 3);
    }

    #[test]
    fn test_rejects_unknown_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("index.db");
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        }
        let err = Store::open(&db).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }
}
