//! has / show commands - Read-only views of a state file

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::catalog::AcceptAll;
use crate::cli::state::load_state;
use crate::cli::Context;
use crate::core::node::NodeRef;
use crate::core::types::TagName;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct HasReport<'a> {
    tags: &'a [String],
    exact: bool,
    all: bool,
    result: bool,
}

#[derive(Debug, Serialize)]
struct TagEntry {
    tag: TagName,
    count: i32,
}

/// Test tags against a state file.
///
/// Returns the answer; it is also printed unless quiet.
pub fn has(ctx: &Context, state: &Path, tags: &[String], exact: bool, all: bool) -> Result<bool> {
    let tree = load_state(&ctx.resolve(state), Arc::new(AcceptAll))?;

    let result = match (exact, all) {
        (false, false) => tree.has_any(tags),
        (false, true) => tree.has_all(tags),
        (true, false) => tags.iter().any(|t| tree.has_exact(t)),
        (true, true) => tags.iter().all(|t| tree.has_exact(t)),
    };

    if ctx.json {
        output::json(&HasReport {
            tags,
            exact,
            all,
            result,
        })?;
    } else {
        output::print(result, ctx.verbosity);
    }
    Ok(result)
}

/// Display the tags of a state file.
pub fn show(ctx: &Context, state: &Path, leaf_only: bool) -> Result<()> {
    let tree = load_state(&ctx.resolve(state), Arc::new(AcceptAll))?;

    if ctx.json {
        let tags = if leaf_only {
            tree.leaf_tags()
        } else {
            tree.current_tags()
        };
        let entries: Vec<TagEntry> = tags
            .into_iter()
            .filter_map(|tag| {
                let count = tree.count_of(tag.as_str())?;
                Some(TagEntry { tag, count })
            })
            .collect();
        output::json(&entries)?;
        return Ok(());
    }

    if tree.is_empty() {
        output::print("(no tags)", ctx.verbosity);
        return Ok(());
    }

    let lines: Vec<String> = if leaf_only {
        tree.leaf_tags()
            .iter()
            .map(|tag| match tree.count_of(tag.as_str()) {
                Some(count) if count > 1 => format!("{} ({})", tag, count),
                _ => tag.to_string(),
            })
            .collect()
    } else {
        let mut nodes = Vec::with_capacity(tree.len());
        for root in tree.roots() {
            collect_pre_order(root, &mut nodes);
        }
        nodes.iter().map(output::format_node).collect()
    };

    output::print(output::format_list(&lines, ""), ctx.verbosity);
    Ok(())
}

fn collect_pre_order<'a>(node: NodeRef<'a>, out: &mut Vec<NodeRef<'a>>) {
    out.push(node);
    for child in node.children() {
        collect_pre_order(child, out);
    }
}
