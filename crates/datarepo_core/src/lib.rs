//! Generic CRUD repository and service layer over SQLite.
//! One facade serves any mapped `Entity`, in blocking and async forms.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ConnectionConfig, DEFAULT_CONNECTION_NAME};
pub use db::{DbError, DbResult, Session};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{Entity, EntityValidationError};
pub use model::sample::{SampleEntity, SAMPLE_NAME_MAX_CHARS};
pub use repo::base_repo::{AsyncRepository, Repository, SqliteRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::query::{CompareOp, Filter, OrderBy, PageRequest, SortDirection};
pub use service::base_service::BaseService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
