//! Idempotent schema initialization.
//!
//! Entity tables are declared as data: a name plus the DDL batch that
//! creates it. [`initialize_schema`] inspects `sqlite_master` and creates
//! whatever is missing, so running it against an already-initialized
//! database is a no-op. Every table the server relies on is declared here;
//! nothing else writes schema state.

use crate::pool::DbPool;
use rusqlite::Connection;
use thiserror::Error;

/// A declared entity table: its name and the DDL batch that creates it.
///
/// The batch may hold several statements (the table plus its indexes) and
/// runs inside one transaction.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Table name, as it appears in `sqlite_master`.
    pub name: &'static str,
    /// SQL executed when the table is missing.
    pub ddl: &'static str,
}

/// All declared tables, in creation order. New tables are appended here.
///
/// Empty for now; the scaffold defines no entities yet.
const TABLES: &[TableSchema] = &[];

/// Errors that can occur during schema initialization.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No connection could be acquired from the pool.
    #[error("failed to acquire connection for schema initialization: {0}")]
    Connection(#[from] r2d2::Error),

    /// Failed to query existing schema state.
    #[error("failed to check schema state: {0}")]
    StateQuery(rusqlite::Error),

    /// The DDL batch for a table failed.
    #[error("creating table '{name}' failed: {source}")]
    ExecutionFailed {
        /// The declared table whose DDL failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },
}

/// Ensures every declared table exists, creating the missing ones.
///
/// Idempotent: existing tables are skipped, so calling this any number of
/// times yields the same schema and no error. Returns how many tables this
/// run created (always 0 while the declared set is empty).
///
/// # Errors
///
/// Returns [`SchemaError`] if no connection is available, the schema state
/// cannot be read, or a DDL batch fails. A failing batch is rolled back
/// whole; it never leaves a half-created table behind.
pub fn initialize_schema(pool: &DbPool) -> Result<usize, SchemaError> {
    let conn = pool.get()?;
    ensure_tables(&conn, TABLES)
}

fn ensure_tables(conn: &Connection, tables: &[TableSchema]) -> Result<usize, SchemaError> {
    let mut created = 0;

    for table in tables {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [table.name],
                |row| row.get(0),
            )
            .map_err(SchemaError::StateQuery)?;

        if exists {
            tracing::debug!(table = table.name, "table already exists, skipping");
            continue;
        }

        tracing::info!(table = table.name, "creating missing table");

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| SchemaError::ExecutionFailed {
                name: table.name.to_string(),
                source: e,
            })?;

        tx.execute_batch(table.ddl)
            .map_err(|e| SchemaError::ExecutionFailed {
                name: table.name.to_string(),
                source: e,
            })?;

        tx.commit().map_err(|e| SchemaError::ExecutionFailed {
            name: table.name.to_string(),
            source: e,
        })?;

        created += 1;
    }

    Ok(created)
}
