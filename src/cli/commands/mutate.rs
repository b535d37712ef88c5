//! add / remove commands - Apply or withdraw tags in a state file
//!
//! Tags are applied in argument order. Any failure aborts before the state
//! file is written, so a command either lands completely or not at all.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::catalog::{AcceptAll, TagValidator};
use crate::cli::state::{load_state, save_state, StateLock};
use crate::cli::Context;
use crate::core::events::{Notify, TagChange};
use crate::core::tree::TagTree;
use crate::core::types::TagName;
use crate::ui::output;

/// Apply tags to a state file.
pub fn add(ctx: &Context, state: &Path, tags: &[String], unchecked: bool) -> Result<()> {
    mutate(ctx, state, tags, unchecked, |tree, tag| {
        if unchecked {
            Ok(tree.add_unchecked(&TagName::new(tag)?, Notify::Emit))
        } else {
            Ok(tree.add(tag)?)
        }
    })
}

/// Remove one application of each tag, or the whole tag with `all`.
pub fn remove(
    ctx: &Context,
    state: &Path,
    tags: &[String],
    all: bool,
    unchecked: bool,
) -> Result<()> {
    mutate(ctx, state, tags, unchecked, |tree, tag| {
        if unchecked {
            Ok(tree.remove_unchecked(&TagName::new(tag)?, all, Notify::Emit))
        } else if all {
            Ok(tree.remove_all(tag)?)
        } else {
            Ok(tree.remove(tag)?)
        }
    })
}

fn mutate<F>(
    ctx: &Context,
    state: &Path,
    tags: &[String],
    unchecked: bool,
    mut apply: F,
) -> Result<()>
where
    F: FnMut(&mut TagTree, &str) -> Result<Vec<TagChange>>,
{
    let path = ctx.resolve(state);
    let validator: Arc<dyn TagValidator> = if unchecked {
        Arc::new(AcceptAll)
    } else {
        ctx.validator()?
    };
    let _lock = StateLock::acquire(&path)?;
    let mut tree = load_state(&path, validator)?;

    let mut changes = Vec::new();
    for tag in tags {
        let applied = apply(&mut tree, tag).with_context(|| format!("Cannot apply '{}'", tag))?;
        changes.extend(applied);
    }

    if !changes.is_empty() || !path.exists() {
        save_state(&path, &tree)?;
    }

    if ctx.json {
        output::json(&changes)?;
    } else {
        output::print(output::format_changes(&changes), ctx.verbosity);
    }
    Ok(())
}
