//! SQLite storage bootstrap, schema migration and session handles.
//!
//! # Responsibility
//! - Open and configure SQLite connections for repositories.
//! - Apply schema migrations in deterministic order.
//! - Own the connection for one unit of work and release it exactly once.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write application data before migrations succeed.

pub mod migrations;
mod open;
mod session;

pub use open::{open_connection, open_db, open_db_in_memory, ConnectionTarget};
pub use session::Session;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("invalid connection string `{0}`")]
    InvalidConnectionString(String),
    #[error("session lock poisoned by a panicking holder")]
    SessionPoisoned,
    #[error("session is still shared by another handle")]
    SessionInUse,
}
