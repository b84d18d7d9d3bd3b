//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! history_limit = 200
//! strict_handler_kinds = true
//! log_profile = "production"
//! inbound_capacity = 128
//! ```

use notagraph_core::errors::{ExError, ExErrorKind};
use notagraph_core::logging_facility::Profile;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dispatch::DispatcherConfig;
use crate::errors::{config_error, Result};

pub const DEFAULT_INBOUND_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of commands kept for undo; unbounded when absent
    pub history_limit: Option<usize>,
    /// Reject handlers whose declared action kinds overlap
    pub strict_handler_kinds: bool,
    pub log_profile: Profile,
    /// Bound of the inbound action channel
    pub inbound_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            strict_handler_kinds: false,
            log_profile: Profile::Development,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed TOML, unknown keys or a zero
    /// channel capacity.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| config_error(e.to_string()))?;
        if config.inbound_capacity == 0 {
            return Err(config_error("inbound_capacity must be at least 1"));
        }
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read, otherwise see
    /// [`EngineConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            strict_handler_kinds: self.strict_handler_kinds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.inbound_capacity, 64);
    }

    #[test]
    fn test_parses_all_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            history_limit = 10
            strict_handler_kinds = true
            log_profile = "production"
            inbound_capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.history_limit, Some(10));
        assert!(config.dispatcher_config().strict_handler_kinds);
        assert_eq!(config.log_profile, Profile::Production);
        assert_eq!(config.inbound_capacity, 8);
    }

    #[test]
    fn test_rejects_zero_capacity_and_unknown_keys() {
        let err = EngineConfig::from_toml_str("inbound_capacity = 0").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);

        let err = EngineConfig::from_toml_str("history = 3").unwrap_err();
        assert_eq!(err.op(), Some("load_config"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/notagraph.toml")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Io);
    }
}
