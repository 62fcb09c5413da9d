//! Named connection strings.
//!
//! # Responsibility
//! - Resolve a connection name (default `DefaultConnection`) to a store target.
//! - Load names from the environment or from a JSON document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Name repositories resolve when the caller does not pick one.
pub const DEFAULT_CONNECTION_NAME: &str = "DefaultConnection";
/// Environment variable holding the default connection string.
pub const DEFAULT_CONNECTION_ENV: &str = "DATAREPO_DEFAULT_CONNECTION";
/// Used when `DATAREPO_DEFAULT_CONNECTION` is unset.
pub const FALLBACK_CONNECTION_STRING: &str = "datarepo.sqlite3";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no connection string named `{0}`")]
    MissingConnection(String),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Connection strings keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub connection_strings: BTreeMap<String, String>,
}

impl ConnectionConfig {
    /// Builds a config with a single `DefaultConnection` entry.
    pub fn with_default(connection_string: impl Into<String>) -> Self {
        let mut connection_strings = BTreeMap::new();
        connection_strings.insert(DEFAULT_CONNECTION_NAME.to_string(), connection_string.into());
        Self { connection_strings }
    }

    /// Loads `DefaultConnection` from `DATAREPO_DEFAULT_CONNECTION`.
    pub fn from_env() -> Self {
        Self::with_default(
            env::var(DEFAULT_CONNECTION_ENV)
                .unwrap_or_else(|_| FALLBACK_CONNECTION_STRING.to_string()),
        )
    }

    /// Parses `{ "connection_strings": { "<name>": "<conn>" } }`.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json_str(&document)
    }

    /// Looks up a connection string by name.
    pub fn connection_string(&self, name: &str) -> Result<&str, ConfigError> {
        self.connection_strings
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingConnection(name.to_string()))
    }

    pub fn default_connection_string(&self) -> Result<&str, ConfigError> {
        self.connection_string(DEFAULT_CONNECTION_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConnectionConfig, DEFAULT_CONNECTION_NAME};

    #[test]
    fn json_document_resolves_named_connections() {
        let config = ConnectionConfig::from_json_str(
            r#"{ "connection_strings": { "DefaultConnection": ":memory:", "Reporting": "sqlite://reports.db" } }"#,
        )
        .unwrap();

        assert_eq!(config.default_connection_string().unwrap(), ":memory:");
        assert_eq!(
            config.connection_string("Reporting").unwrap(),
            "sqlite://reports.db"
        );
    }

    #[test]
    fn missing_name_is_reported() {
        let config = ConnectionConfig::default();
        let err = config.connection_string(DEFAULT_CONNECTION_NAME).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConnection(name) if name == "DefaultConnection"));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            ConnectionConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datarepo.json");
        std::fs::write(&path, r#"{ "connection_strings": { "DefaultConnection": "app.db" } }"#)
            .unwrap();

        let config = ConnectionConfig::from_file(&path).unwrap();
        assert_eq!(config, ConnectionConfig::with_default("app.db"));
    }
}
