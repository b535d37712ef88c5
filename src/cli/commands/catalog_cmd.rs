//! catalog command - List or check known tags

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::catalog::{TagCatalog, TagValidator};
use crate::cli::Context;
use crate::core::types::TagName;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct CheckEntry<'a> {
    tag: &'a str,
    known: bool,
}

fn require_catalog(ctx: &Context) -> Result<TagCatalog> {
    ctx.load_catalog()?.ok_or_else(|| {
        anyhow!("No catalog sources configured. Pass --catalog or set catalog.sources")
    })
}

/// List every known tag.
pub fn list(ctx: &Context, leaf_only: bool) -> Result<()> {
    let catalog = require_catalog(ctx)?;
    let tags = if leaf_only {
        catalog.leaf_tags()
    } else {
        catalog.tags()
    };

    if ctx.json {
        output::json(&tags)?;
    } else {
        output::print(output::format_list(&tags, ""), ctx.verbosity);
    }
    Ok(())
}

/// Check tags against the catalog. True if every tag is known.
///
/// Malformed tags count as unknown.
pub fn check(ctx: &Context, tags: &[String]) -> Result<bool> {
    let catalog = require_catalog(ctx)?;

    let entries: Vec<CheckEntry<'_>> = tags
        .iter()
        .map(|raw| CheckEntry {
            tag: raw,
            known: TagName::new(raw).is_ok_and(|tag| catalog.is_known(tag.as_str())),
        })
        .collect();
    let all_known = entries.iter().all(|e| e.known);

    if ctx.json {
        output::json(&entries)?;
    } else {
        let lines: Vec<String> = entries
            .iter()
            .map(|e| format!("{}: {}", e.tag, if e.known { "known" } else { "unknown" }))
            .collect();
        output::print(output::format_list(&lines, ""), ctx.verbosity);
    }
    Ok(all_known)
}
