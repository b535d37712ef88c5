//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the state file (and the catalog when it validates)
//! 2. Calls the tree to do the work
//! 3. Writes the state back if it mutated, then formats the result
//!
//! Query handlers return whether the answer was yes; dispatch maps that to
//! the exit code.

mod catalog_cmd;
mod mutate;
mod query;
mod sync;
mod verify;

// Re-export command functions for testing and direct invocation
pub use catalog_cmd::{check as catalog_check, list as catalog_list};
pub use mutate::{add, remove};
pub use query::{has, show};
pub use sync::sync;
pub use verify::verify;

use std::process::ExitCode;

use anyhow::Result;

use super::args::{CatalogAction, Command};
use super::Context;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Add {
            state,
            tags,
            unchecked,
        } => add(ctx, &state, &tags, unchecked).map(|()| ExitCode::SUCCESS),
        Command::Remove {
            state,
            tags,
            all,
            unchecked,
        } => remove(ctx, &state, &tags, all, unchecked).map(|()| ExitCode::SUCCESS),
        Command::Has {
            state,
            tags,
            exact,
            all,
        } => has(ctx, &state, &tags, exact, all).map(answer),
        Command::Show { state, leaf_only } => {
            show(ctx, &state, leaf_only).map(|()| ExitCode::SUCCESS)
        }
        Command::Sync { state, snapshot } => {
            sync(ctx, &state, &snapshot).map(|()| ExitCode::SUCCESS)
        }
        Command::Catalog { action } => match action {
            CatalogAction::List { leaf_only } => {
                catalog_list(ctx, leaf_only).map(|()| ExitCode::SUCCESS)
            }
            CatalogAction::Check { tags } => catalog_check(ctx, &tags).map(answer),
        },
        Command::Verify { state } => verify(ctx, &state).map(answer),
    }
}

fn answer(yes: bool) -> ExitCode {
    if yes {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
