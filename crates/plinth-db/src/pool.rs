//! Connection factory for the file-backed SQLite store.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Pooling parameters for the SQLite store.
///
/// Fixed at startup; nothing mutates them once the pool exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// How long pool construction and checkouts wait for a connection, in
    /// milliseconds. A local file either opens immediately or never, so
    /// this mostly bounds how fast a bad path fails at startup.
    pub connection_timeout_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            max_connections: 8,
            connection_timeout_ms: 5_000,
        }
    }
}

/// The process-wide SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur while building the connection pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool could not establish its initial connections.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Builds the connection pool for the database file at `path`.
///
/// The file is created if it does not exist. Every pooled connection comes
/// up in WAL journal mode (verified) with foreign keys enforced and the
/// configured busy timeout. Connections are established eagerly, so an
/// unreachable or unwritable path fails here, before any traffic is served.
///
/// `:memory:` also works, but each pooled connection then holds its own
/// private database; size the pool to 1 when a test needs a shared view.
///
/// # Errors
///
/// Returns [`PoolError::PoolInit`] when the initial connections cannot be
/// established within the connection timeout (bad path, missing parent
/// directory, insufficient permissions, or a corrupt database file).
pub fn create_pool(path: &Path, settings: PoolSettings) -> Result<DbPool, PoolError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(path)
        .with_flags(flags)
        .with_init(move |conn| {
            // WAL must be confirmed. In-memory databases answer "memory",
            // which is expected and acceptable.
            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            if journal_mode != "wal" && journal_mode != "memory" {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!("WAL journal mode rejected, got: {journal_mode}")),
                ));
            }
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {};",
                settings.busy_timeout_ms
            ))
        });

    let pool = Pool::builder()
        .max_size(settings.max_connections)
        .connection_timeout(Duration::from_millis(settings.connection_timeout_ms))
        .build(manager)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_applies_configured_pragmas() {
        let settings = PoolSettings {
            busy_timeout_ms: 1_250,
            max_connections: 2,
            connection_timeout_ms: 5_000,
        };

        let pool =
            create_pool(Path::new(":memory:"), settings).expect("pool creation should succeed");
        let conn = pool.get().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("should query journal_mode");
        // In-memory databases report "memory" instead of "wal"
        assert!(
            mode == "wal" || mode == "memory",
            "unexpected journal_mode: {mode}"
        );

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1, "foreign keys should be enabled");

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 1_250, "busy timeout should match settings");

        assert_eq!(pool.max_size(), 2, "pool max size should match settings");
    }

    #[test]
    fn pool_creates_the_database_file() {
        let dir = tempfile::tempdir().expect("should create tempdir");
        let db_path = dir.path().join("store.db");

        let _pool = create_pool(&db_path, PoolSettings::default())
            .expect("pool creation should succeed");

        assert!(db_path.exists(), "database file should exist after pool creation");
    }

    #[test]
    fn unwritable_path_fails_pool_construction() {
        let dir = tempfile::tempdir().expect("should create tempdir");
        let settings = PoolSettings {
            connection_timeout_ms: 250,
            ..Default::default()
        };

        // A directory cannot be opened as a database file.
        let result = create_pool(dir.path(), settings);

        assert!(
            result.is_err(),
            "opening a directory as a database should fail"
        );
    }
}
