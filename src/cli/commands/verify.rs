//! verify command - Check a state file's invariants and catalog membership

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::catalog::{AcceptAll, TagValidator};
use crate::cli::state::load_state;
use crate::cli::Context;
use crate::core::types::TagName;
use crate::core::verify::verify_tree;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct VerifyReport {
    ok: bool,
    tags: usize,
    fingerprint: String,
    errors: Vec<String>,
    unknown: Vec<TagName>,
}

/// Verify a state file. True if it passed.
pub fn verify(ctx: &Context, state: &Path) -> Result<bool> {
    let tree = load_state(&ctx.resolve(state), Arc::new(AcceptAll))?;

    let result = verify_tree(&tree);
    let unknown: Vec<TagName> = match ctx.load_catalog()? {
        Some(catalog) => tree
            .leaf_tags()
            .into_iter()
            .filter(|tag| !catalog.is_known(tag.as_str()))
            .collect(),
        None => Vec::new(),
    };

    let report = VerifyReport {
        ok: result.ok && unknown.is_empty(),
        tags: tree.len(),
        fingerprint: tree.get_state().fingerprint()?.to_string(),
        errors: result.errors.iter().map(ToString::to_string).collect(),
        unknown,
    };

    if ctx.json {
        output::json(&report)?;
        return Ok(report.ok);
    }

    if report.ok {
        output::print(
            format!("ok: {} tags, fingerprint {}", report.tags, report.fingerprint),
            ctx.verbosity,
        );
    } else {
        for error in &report.errors {
            output::error(error);
        }
        for tag in &report.unknown {
            output::error(format!("tag '{}' is not in the catalog", tag));
        }
    }
    Ok(report.ok)
}
