//! Entity capability contract.
//!
//! # Responsibility
//! - Describe how one record type maps onto one table.
//! - Carry per-entity validation used before every write.
//!
//! # Invariants
//! - `KEY_COLUMN` is the table's primary key and is not listed in `COLUMNS`.
//! - `values()` yields exactly one value per `COLUMNS` entry, in order.
//! - `key()` is `None` only for records the store has not keyed yet.

use rusqlite::types::{FromSql, ToSql, Value};
use rusqlite::Row;
use std::fmt::Debug;

/// Field-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}`: {reason}")]
pub struct EntityValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl EntityValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// A record type with one designated primary key, storable in one table.
pub trait Entity: Clone + Send + 'static {
    /// Primary key type, as stored in `KEY_COLUMN`.
    type Key: ToSql + FromSql + Clone + Debug + Send + Sync + 'static;

    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    /// Non-key columns in bind order.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> Option<Self::Key>;

    fn set_key(&mut self, key: Self::Key);

    /// Non-key column values, aligned with `COLUMNS`.
    fn values(&self) -> Vec<Value>;

    /// Builds a record from a row selected as `KEY_COLUMN, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn validate(&self) -> Result<(), EntityValidationError> {
        Ok(())
    }

    /// Whether `column` names a mapped column of this entity.
    fn has_column(column: &str) -> bool {
        column == Self::KEY_COLUMN || Self::COLUMNS.iter().any(|known| *known == column)
    }
}
