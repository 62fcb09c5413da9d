//! Repository error type.

use crate::config::ConfigError;
use crate::db::DbError;
use crate::model::entity::EntityValidationError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for generic repository persistence and query operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] EntityValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("more than one `{table}` record matched a single-result query")]
    NonUnique { table: &'static str },
    #[error("`{column}` is not a column of `{table}`")]
    UnknownColumn { table: &'static str, column: String },
    #[error("page number and page size must be positive, got page {page_number} of size {page_size}")]
    InvalidPage { page_number: u32, page_size: u32 },
    #[error("background repository task failed: {0}")]
    Join(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<tokio::task::JoinError> for RepoError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(value.to_string())
    }
}
