//! Scoped database sessions.
//!
//! A [`Session`] is a pooled connection checked out for one unit of work,
//! typically a single HTTP request. Dropping it returns the connection to
//! the pool, so release happens on every exit path without explicit
//! bookkeeping, including early returns and cancellation.

use crate::pool::DbPool;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

/// A scoped handle to one pooled SQLite connection.
///
/// Derefs to [`rusqlite::Connection`]. Owned exclusively by the scope that
/// opened it; the underlying connection goes back to the pool on drop.
pub type Session = PooledConnection<SqliteConnectionManager>;

/// Errors that can occur when opening a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No connection became available within the pool's timeout.
    #[error("failed to acquire database session: {0}")]
    Acquire(#[from] r2d2::Error),
}

/// Checks a session out of the pool.
///
/// Blocks the calling thread until a connection is available or the pool's
/// timeout elapses, so call it from a blocking context (`spawn_blocking`),
/// never directly on an async executor thread.
///
/// # Errors
///
/// Returns [`SessionError::Acquire`] when the pool stays exhausted past its
/// timeout or the underlying connection cannot be reopened.
pub fn open_session(pool: &DbPool) -> Result<Session, SessionError> {
    Ok(pool.get()?)
}
