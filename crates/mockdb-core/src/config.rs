//! Runtime configuration for a mock database.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use crate::value::RecordId;
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// MockConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MockConfig {
    /// Identity handed to the first record a store persists.
    pub first_id: RecordId,

    /// Restart identities at `first_id` when a store is emptied by
    /// `delete_all`/`destroy_all`. Off by default: identities stay monotonic
    /// for the life of the store.
    pub reset_ids_on_clear: bool,

    /// Reject calls to declared methods whose argument count does not fit
    /// the declared parameter list.
    pub check_arity: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            first_id: 1,
            reset_ids_on_clear: false,
            check_arity: true,
        }
    }
}

impl MockConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_id < 1 {
            return Err(ConfigError::Invalid(format!(
                "first_id must be positive, got {}",
                self.first_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = MockConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, MockConfig::default());
        assert_eq!(config.first_id, 1);
        assert!(!config.reset_ids_on_clear);
        assert!(config.check_arity);
    }

    #[test]
    fn fields_override_defaults() {
        let config = MockConfig::from_toml_str("first_id = 100\nreset_ids_on_clear = true\n")
            .expect("config should parse");

        assert_eq!(config.first_id, 100);
        assert!(config.reset_ids_on_clear);
        assert!(config.check_arity);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = MockConfig::from_toml_str("first_idd = 3").expect_err("typo should fail");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn non_positive_first_id_is_invalid() {
        let err = MockConfig::from_toml_str("first_id = 0").expect_err("zero should fail");

        assert_eq!(err.to_string(), "invalid config: first_id must be positive, got 0");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MockConfig::load("/nonexistent/mockdb.toml").expect_err("load should fail");

        assert!(
            err.to_string()
                .starts_with("failed to read config '/nonexistent/mockdb.toml'"),
            "unexpected message: {err}"
        );
    }
}
