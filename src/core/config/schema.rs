//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$LABELTREE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/labeltree/config.toml`
//! 3. `~/.labeltree/config.toml`
//!
//! # Project Config
//!
//! Located at `<project>/.labeltree/config.toml` (canonical).
//!
//! Both scopes share one schema; project values override global ones
//! field by field.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., the catalog extension
//! must be a bare extension without a leading dot).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One configuration file (global or project scope).
///
/// # Example
///
/// ```toml
/// [catalog]
/// sources = ["tags/", "extra/combat.tags"]
/// extension = "tags"
/// strict = true
///
/// [output]
/// json = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Tag catalog settings
    pub catalog: Option<CatalogConfig>,

    /// Output defaults
    pub output: Option<OutputConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(catalog) = &self.catalog {
            catalog.validate()?;
        }
        Ok(())
    }
}

/// Where known tags come from and how strictly they are enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog files or directories, relative to the config file
    pub sources: Option<Vec<PathBuf>>,

    /// File extension searched for in source directories (default: "tags")
    pub extension: Option<String>,

    /// Reject tags missing from the catalog (default: true)
    pub strict: Option<bool>,
}

impl CatalogConfig {
    /// Validate catalog settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ext) = &self.extension {
            if ext.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "catalog.extension cannot be empty".into(),
                ));
            }
            if ext.starts_with('.') {
                return Err(ConfigError::InvalidValue(format!(
                    "catalog.extension '{ext}' must not start with '.'"
                )));
            }
        }

        if let Some(sources) = &self.sources {
            if sources.iter().any(|s| s.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "catalog.sources cannot contain empty paths".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Output defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Emit machine-readable JSON (default: false)
    pub json: Option<bool>,
}
