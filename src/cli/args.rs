//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--config <path>`: Use this global config file
//! - `--catalog <path>`: Catalog file or directory (repeatable)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ltag - Counted hierarchical labels stored in snapshot files
#[derive(Parser, Debug)]
#[command(name = "ltag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if ltag was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Global config file to use instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Catalog file or directory; overrides catalog.sources (repeatable)
    #[arg(long = "catalog", global = true, value_name = "PATH")]
    pub catalogs: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply tags to a state file
    #[command(
        name = "add",
        long_about = "Apply one or more tags to a state file.\n\n\
            Every node on a tag's path gains one application; missing nodes are \
            created with a count of one. The state file is created if it does not \
            exist. When a catalog is configured and strict mode is on, unknown tags \
            are rejected and nothing is written.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Apply a tag twice
    ltag add actor.json status.stunned status.stunned

    # Apply a tag the catalog does not know
    ltag add actor.json debug.probe --unchecked"
    )]
    Add {
        /// State file (snapshot JSON)
        state: PathBuf,

        /// Tags to apply, in order
        #[arg(required = true)]
        tags: Vec<String>,

        /// Skip catalog validation
        #[arg(long)]
        unchecked: bool,
    },

    /// Remove tag applications from a state file
    #[command(
        name = "remove",
        long_about = "Remove one application of each tag from a state file.\n\n\
            Every node on the path loses one application and nodes that reach zero \
            are detached together with their children. With --all the tag itself is \
            removed regardless of its count, while its ancestors still lose exactly \
            one application. Removing a tag that is not present changes nothing."
    )]
    Remove {
        /// State file (snapshot JSON)
        state: PathBuf,

        /// Tags to remove, in order
        #[arg(required = true)]
        tags: Vec<String>,

        /// Remove the tag entirely, ignoring its count
        #[arg(long)]
        all: bool,

        /// Skip catalog validation
        #[arg(long)]
        unchecked: bool,
    },

    /// Test for tags (exit code 1 when the answer is no)
    #[command(
        name = "has",
        long_about = "Test whether tags are present in a state file.\n\n\
            A tag is present when a node exists at its path, so ancestors of an \
            applied tag are present too. With --exact the node must also have no \
            children. By default any one tag is enough; --all requires every tag.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Scripting: branch on presence
    if ltag -q has actor.json status.stunned; then echo stunned; fi

    # Require both tags, leaf-only match
    ltag has actor.json status.stunned combat.attack --all --exact"
    )]
    Has {
        /// State file (snapshot JSON)
        state: PathBuf,

        /// Tags to test
        #[arg(required = true)]
        tags: Vec<String>,

        /// Only match nodes without children
        #[arg(long)]
        exact: bool,

        /// Require every tag instead of any
        #[arg(long)]
        all: bool,
    },

    /// Display the tags in a state file
    #[command(name = "show")]
    Show {
        /// State file (snapshot JSON)
        state: PathBuf,

        /// Only list the most specific tags
        #[arg(long)]
        leaf_only: bool,
    },

    /// Reconcile a state file with a snapshot
    #[command(
        name = "sync",
        long_about = "Bring a state file in line with another snapshot.\n\n\
            Tags the snapshot lacks are removed, tags it adds are created with the \
            snapshot's counts, and shared tags have their counts corrected. The \
            snapshot is validated completely first; a malformed snapshot leaves the \
            state file untouched. Prints the resulting changes."
    )]
    Sync {
        /// State file (snapshot JSON)
        state: PathBuf,

        /// Snapshot to reconcile with
        snapshot: PathBuf,
    },

    /// Inspect the tag catalog
    #[command(name = "catalog")]
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Verify a state file
    #[command(
        name = "verify",
        long_about = "Verify a state file.\n\n\
            Loads the state, checks the tree's structural invariants and, when a \
            catalog is configured, reports tags the catalog does not know. Prints \
            the state's fingerprint, which is independent of record order."
    )]
    Verify {
        /// State file (snapshot JSON)
        state: PathBuf,
    },
}

/// Catalog subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum CatalogAction {
    /// List known tags
    List {
        /// Only list the most specific tags
        #[arg(long)]
        leaf_only: bool,
    },
    /// Check tags against the catalog (exit code 1 if any is unknown)
    Check {
        /// Tags to check
        #[arg(required = true)]
        tags: Vec<String>,
    },
}
