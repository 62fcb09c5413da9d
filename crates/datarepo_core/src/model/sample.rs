//! Sample entity used by the console harness and tests.

use super::entity::{Entity, EntityValidationError};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Upper bound on `SampleEntity::name`, in characters.
pub const SAMPLE_NAME_MAX_CHARS: usize = 100;

/// Minimal record: store-generated integer id plus a bounded name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEntity {
    /// `None` until the store assigns a key on insert.
    pub id: Option<i64>,
    pub name: String,
}

impl SampleEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Entity for SampleEntity {
    type Key = i64;

    const TABLE: &'static str = "sample_entity";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
        })
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        let length = self.name.chars().count();
        if length > SAMPLE_NAME_MAX_CHARS {
            return Err(EntityValidationError::new(
                "name",
                format!("length {length} exceeds {SAMPLE_NAME_MAX_CHARS} characters"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SampleEntity, SAMPLE_NAME_MAX_CHARS};
    use crate::model::entity::Entity;

    #[test]
    fn new_sample_has_no_key() {
        let sample = SampleEntity::new("Turtle");
        assert_eq!(sample.key(), None);
        assert_eq!(sample.name, "Turtle");
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        let at_limit = SampleEntity::new("é".repeat(SAMPLE_NAME_MAX_CHARS));
        assert!(at_limit.validate().is_ok());

        let over = SampleEntity::new("x".repeat(SAMPLE_NAME_MAX_CHARS + 1));
        let err = over.validate().unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn has_column_covers_key_and_fields() {
        assert!(SampleEntity::has_column("id"));
        assert!(SampleEntity::has_column("name"));
        assert!(!SampleEntity::has_column("name; DROP TABLE sample_entity"));
    }
}
