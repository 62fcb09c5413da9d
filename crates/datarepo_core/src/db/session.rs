//! Shared connection handle for one unit of work.
//!
//! # Responsibility
//! - Serialize access to a single SQLite connection.
//! - Release the connection exactly once, on explicit close or on last drop.
//!
//! # Invariants
//! - A session never hands out the connection outside `with_connection`.
//! - `close` only succeeds for the last live handle.

use super::{open_connection, open_db_in_memory, DbError, DbResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable, thread-safe owner of one SQLite connection.
///
/// Clones share the same connection. Dropping the last clone closes it.
#[derive(Clone)]
pub struct Session {
    conn: Arc<Mutex<Connection>>,
}

impl Session {
    /// Wraps an already bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens and migrates the store named by `connection_string`.
    pub fn open(connection_string: &str) -> DbResult<Self> {
        open_connection(connection_string).map(Self::new)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// # Errors
    /// - `DbError::SessionPoisoned` when a previous holder panicked.
    pub fn with_connection<R, E>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<DbError>,
    {
        let mut guard = self.conn.lock().map_err(|_| {
            error!("event=session_lock module=db status=error error_code=session_poisoned");
            E::from(DbError::SessionPoisoned)
        })?;
        f(&mut guard)
    }

    /// Number of live handles sharing this connection.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.conn)
    }

    /// Closes the connection now and reports any close failure.
    ///
    /// # Errors
    /// - `DbError::SessionInUse` when other clones are alive; the connection
    ///   stays open for them and closes when the last one drops.
    /// - `DbError::Sqlite` when SQLite refuses to close.
    pub fn close(self) -> DbResult<()> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|shared| {
            debug!(
                "event=session_close module=db status=skipped handles={}",
                Arc::strong_count(&shared) - 1
            );
            DbError::SessionInUse
        })?;
        let conn = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);

        conn.close().map_err(|(_, err)| {
            error!("event=session_close module=db status=error error={err}");
            DbError::from(err)
        })?;
        info!("event=session_close module=db status=ok");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("handles", &self.handle_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::db::DbError;

    #[test]
    fn close_rejects_shared_session() {
        let session = Session::open_in_memory().unwrap();
        let other = session.clone();

        let err = session.close().unwrap_err();
        assert!(matches!(err, DbError::SessionInUse));

        assert_eq!(other.handle_count(), 1);
        other.close().unwrap();
    }

    #[test]
    fn with_connection_runs_against_migrated_schema() {
        let session = Session::open(":memory:").unwrap();
        let tables: i64 = session
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE name = 'sample_entity';",
                    [],
                    |row| row.get(0),
                )
                .map_err(DbError::from)
            })
            .unwrap();
        assert_eq!(tables, 1);
    }
}
