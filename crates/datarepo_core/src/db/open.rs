//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Resolve connection strings into file or in-memory targets.
//! - Configure connection pragmas required by repository behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const SQLITE_SCHEME: &str = "sqlite://";

/// Where a connection string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Memory,
    File(PathBuf),
}

impl ConnectionTarget {
    /// Parses `:memory:`, `sqlite::memory:`, `sqlite://<path>` or a bare path.
    pub fn parse(connection_string: &str) -> DbResult<Self> {
        let trimmed = connection_string.trim();
        match trimmed {
            "" => Err(DbError::InvalidConnectionString(connection_string.to_string())),
            ":memory:" | "sqlite::memory:" => Ok(Self::Memory),
            _ => {
                let path = trimmed.strip_prefix(SQLITE_SCHEME).unwrap_or(trimmed);
                if path.is_empty() {
                    return Err(DbError::InvalidConnectionString(
                        connection_string.to_string(),
                    ));
                }
                Ok(Self::File(PathBuf::from(path)))
            }
        }
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

/// Opens whatever `connection_string` names and applies all pending migrations.
pub fn open_connection(connection_string: &str) -> DbResult<Connection> {
    match ConnectionTarget::parse(connection_string)? {
        ConnectionTarget::Memory => open_db_in_memory(),
        ConnectionTarget::File(path) => open_db(path),
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let target = ConnectionTarget::File(path.as_ref().to_path_buf());
    open_target(&target, || Connection::open(path.as_ref()))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(&ConnectionTarget::Memory, Connection::open_in_memory)
}

fn open_target(
    target: &ConnectionTarget,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = opener().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        DbError::from(err)
    })?;

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ConnectionTarget;
    use crate::db::DbError;
    use std::path::PathBuf;

    #[test]
    fn parse_recognizes_memory_aliases() {
        assert_eq!(ConnectionTarget::parse(":memory:").unwrap(), ConnectionTarget::Memory);
        assert_eq!(
            ConnectionTarget::parse(" sqlite::memory: ").unwrap(),
            ConnectionTarget::Memory
        );
    }

    #[test]
    fn parse_strips_sqlite_scheme() {
        assert_eq!(
            ConnectionTarget::parse("sqlite://data/app.db").unwrap(),
            ConnectionTarget::File(PathBuf::from("data/app.db"))
        );
        assert_eq!(
            ConnectionTarget::parse("app.db").unwrap(),
            ConnectionTarget::File(PathBuf::from("app.db"))
        );
    }

    #[test]
    fn parse_rejects_empty_targets() {
        assert!(matches!(
            ConnectionTarget::parse("  "),
            Err(DbError::InvalidConnectionString(_))
        ));
        assert!(matches!(
            ConnectionTarget::parse("sqlite://"),
            Err(DbError::InvalidConnectionString(_))
        ));
    }
}
