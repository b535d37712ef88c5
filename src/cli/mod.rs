//! cli
//!
//! Command-line interface layer for labeltree.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and the tag catalog
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. State lives in snapshot files; every command loads
//! the file into a [`crate::core::tree::TagTree`], works on the tree, and
//! writes it back atomically when something changed.
//!
//! # Exit Codes
//!
//! - `0`: success, or a query answered yes
//! - `1`: a query answered no (`has`, `catalog check`, `verify`)
//! - `2`: an error

pub mod args;
pub mod commands;
pub mod state;

pub use args::{CatalogAction, Cli, Command};

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::catalog::{AcceptAll, TagCatalog, TagValidator};
use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_logging(verbosity, cli.debug);

    let ctx = Context::from_cli(&cli)?;
    commands::dispatch(cli.command, &ctx)
}

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` wins unless `--debug` was given.
fn init_logging(verbosity: Verbosity, debug: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if !debug => filter,
        _ => EnvFilter::new(verbosity.log_directive()),
    };

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execution context for commands.
///
/// Global settings derived from CLI flags and configuration.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory relative paths resolve against.
    pub cwd: PathBuf,
    pub verbosity: Verbosity,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Merged configuration.
    pub config: Config,
    /// `--catalog` paths; replace configured sources when non-empty.
    pub catalog_override: Vec<PathBuf>,
}

impl Context {
    /// Build the context for one invocation.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = match &cli.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        if !cwd.is_dir() {
            bail!("'{}' is not a directory", cwd.display());
        }

        let config = Config::load(Some(&cwd), cli.config.as_deref())
            .context("Failed to load config")?
            .config;

        Ok(Self {
            json: cli.json || config.json(),
            verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
            catalog_override: cli.catalogs.clone(),
            config,
            cwd,
        })
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Catalog sources in effect.
    pub fn catalog_sources(&self) -> Vec<PathBuf> {
        if self.catalog_override.is_empty() {
            self.config
                .catalog_sources()
                .into_iter()
                .map(|p| self.resolve(&p))
                .collect()
        } else {
            self.catalog_override.iter().map(|p| self.resolve(p)).collect()
        }
    }

    /// Load the catalog, or `None` if no sources are configured.
    pub fn load_catalog(&self) -> Result<Option<TagCatalog>> {
        let sources = self.catalog_sources();
        if sources.is_empty() {
            return Ok(None);
        }

        let extension = self.config.catalog_extension();
        let catalog = TagCatalog::load_sources(&sources, &extension)
            .context("Failed to load tag catalog")?;
        tracing::debug!(
            sources = catalog.sources().len(),
            tags = catalog.tags().len(),
            "loaded catalog"
        );
        Ok(Some(catalog))
    }

    /// Validator for mutating commands.
    ///
    /// Accepts everything when strict mode is off or no catalog exists.
    pub fn validator(&self) -> Result<Arc<dyn TagValidator>> {
        if !self.config.strict() {
            return Ok(Arc::new(AcceptAll));
        }
        Ok(match self.load_catalog()? {
            Some(catalog) => catalog.into_validator(),
            None => Arc::new(AcceptAll),
        })
    }
}
