//! Database layer for the plinth scaffold.
//!
//! Owns the process-wide SQLite connection factory (`r2d2` pooling over
//! `rusqlite`, WAL mode), idempotent schema initialization, and the scoped
//! sessions request handlers hold for their lifetime.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a single local file, no external database
//!   process. WAL allows concurrent readers with one writer, which covers a
//!   request-per-call web backend.
//! - **`r2d2` connection pool**: bounded connection reuse; a checked-out
//!   connection returns on drop, so a session cannot outlive the request
//!   that opened it.
//! - **Declared schema**: tables are declared as data and created only when
//!   missing, so initialization is idempotent and a fresh database carries
//!   exactly the declared set, which is empty today.

mod pool;
mod schema;
mod session;

pub use pool::{create_pool, DbPool, PoolError, PoolSettings};
pub use schema::{initialize_schema, SchemaError, TableSchema};
pub use session::{open_session, Session, SessionError};
