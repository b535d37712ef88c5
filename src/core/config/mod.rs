//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! labeltree has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Directory-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. An explicit path (the CLI's `--config`)
//! 2. `$LABELTREE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/labeltree/config.toml`
//! 4. `~/.labeltree/config.toml`
//!
//! # Project Config Locations
//!
//! Searched in order:
//! 1. `<dir>/.labeltree/config.toml` (canonical)
//! 2. `<dir>/labeltree.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use labeltree::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project")), None).unwrap();
//! let config = result.config;
//!
//! for source in config.catalog_sources() {
//!     println!("catalog: {}", source.display());
//! }
//! println!("strict: {}", config.strict());
//! ```

pub mod schema;

pub use schema::{CatalogConfig, FileConfig, OutputConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::DEFAULT_EXTENSION;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules automatically: project config
/// overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Project configuration (if found)
    pub project: Option<FileConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// `explicit` replaces the global search when given and must exist.
    /// If `project_dir` is provided, project config is loaded from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(
        project_dir: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = match explicit {
            Some(path) => (Self::read_config(path)?, Some(path.to_path_buf())),
            None => Self::load_global()?,
        };

        let (project, project_path) = match project_dir {
            Some(dir) => Self::load_project(dir, &mut warnings)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        for warning in &warnings {
            tracing::warn!(path = %warning.path.display(), "{}", warning.message);
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("LABELTREE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("labeltree/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".labeltree/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Load project configuration from standard locations.
    fn load_project(
        dir: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigError> {
        let canonical = Self::project_config_path(dir);
        if canonical.exists() {
            let config = Self::read_config(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        let compat = dir.join("labeltree.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = Self::read_config(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for project config.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(".labeltree/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn catalog_setting<T>(&self, pick: impl Fn(&CatalogConfig) -> Option<T>) -> Option<T> {
        self.project
            .as_ref()
            .and_then(|p| p.catalog.as_ref())
            .and_then(&pick)
            .or_else(|| self.global.catalog.as_ref().and_then(&pick))
    }

    /// Catalog sources with relative paths resolved against the config
    /// file that declared them.
    ///
    /// Project sources replace global sources entirely.
    pub fn catalog_sources(&self) -> Vec<PathBuf> {
        let project = self
            .project
            .as_ref()
            .and_then(|p| p.catalog.as_ref())
            .and_then(|c| c.sources.as_ref())
            .map(|s| (s, self.project_path.as_deref()));
        let global = self
            .global
            .catalog
            .as_ref()
            .and_then(|c| c.sources.as_ref())
            .map(|s| (s, self.global_path.as_deref()));

        let Some((sources, declared_in)) = project.or(global) else {
            return Vec::new();
        };

        let base = declared_in.and_then(config_base_dir);
        sources
            .iter()
            .map(|source| match &base {
                Some(base) if source.is_relative() => base.join(source),
                _ => source.clone(),
            })
            .collect()
    }

    /// Extension searched for in catalog directories.
    ///
    /// Defaults to "tags" if not configured.
    pub fn catalog_extension(&self) -> String {
        self.catalog_setting(|c| c.extension.clone())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Check if unknown tags are rejected.
    ///
    /// Defaults to `true` if not configured.
    pub fn strict(&self) -> bool {
        self.catalog_setting(|c| c.strict).unwrap_or(true)
    }

    /// Check if output defaults to JSON.
    ///
    /// Defaults to `false` if not configured.
    pub fn json(&self) -> bool {
        self.project
            .as_ref()
            .and_then(|p| p.output.as_ref())
            .and_then(|o| o.json)
            .or_else(|| self.global.output.as_ref().and_then(|o| o.json))
            .unwrap_or(false)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

/// Directory relative catalog paths are resolved against.
///
/// `<dir>/.labeltree/config.toml` resolves against `<dir>`; any other
/// file resolves against its own directory.
fn config_base_dir(config_file: &Path) -> Option<PathBuf> {
    let parent = config_file.parent()?;
    if parent.file_name().is_some_and(|name| name == ".labeltree") {
        parent.parent().map(Path::to_path_buf)
    } else {
        Some(parent.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_global(temp: &TempDir, contents: &str) -> PathBuf {
        let path = temp.path().join("global.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_files() {
        let config = Config::default();
        assert!(config.catalog_sources().is_empty());
        assert_eq!(config.catalog_extension(), "tags");
        assert!(config.strict());
        assert!(!config.json());
    }

    #[test]
    fn explicit_global_file() {
        let temp = TempDir::new().unwrap();
        let path = write_global(
            &temp,
            r#"
            [catalog]
            strict = false

            [output]
            json = true
            "#,
        );

        let result = Config::load(None, Some(&path)).unwrap();
        let config = result.config;

        assert!(!config.strict());
        assert!(config.json());
        assert_eq!(config.global_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(None, Some(&temp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".labeltree");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.toml"),
            r#"
            [catalog]
            sources = ["tags"]
            extension = "taglist"
            "#,
        )
        .unwrap();

        let global = write_global(&temp, "");
        let result = Config::load(Some(temp.path()), Some(&global)).unwrap();
        let config = result.config;

        assert_eq!(config.catalog_sources(), vec![temp.path().join("tags")]);
        assert_eq!(config.catalog_extension(), "taglist");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn load_project_compat_warns() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("labeltree.toml"), "[catalog]\nstrict = false").unwrap();

        let global = write_global(&temp, "");
        let result = Config::load(Some(temp.path()), Some(&global)).unwrap();

        assert!(!result.config.strict());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("deprecated"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_global(&temp, "unknown_field = true");
        assert!(matches!(
            Config::load(None, Some(&path)),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_extension_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_global(&temp, "[catalog]\nextension = \".tags\"");
        assert!(matches!(
            Config::load(None, Some(&path)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn precedence_project_overrides_global() {
        let config = Config {
            global: FileConfig {
                catalog: Some(CatalogConfig {
                    strict: Some(true),
                    extension: Some("global".into()),
                    ..Default::default()
                }),
                output: None,
            },
            project: Some(FileConfig {
                catalog: Some(CatalogConfig {
                    strict: Some(false),
                    ..Default::default()
                }),
                output: None,
            }),
            global_path: None,
            project_path: None,
        };

        assert!(!config.strict());
        // Fields the project leaves unset fall back to global.
        assert_eq!(config.catalog_extension(), "global");
    }

    #[test]
    fn global_sources_resolve_against_their_file() {
        let temp = TempDir::new().unwrap();
        let path = write_global(&temp, "[catalog]\nsources = [\"shared\", \"/abs/tags\"]");

        let config = Config::load(None, Some(&path)).unwrap().config;
        assert_eq!(
            config.catalog_sources(),
            vec![temp.path().join("shared"), PathBuf::from("/abs/tags")]
        );
    }
}
