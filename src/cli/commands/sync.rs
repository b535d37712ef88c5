//! sync command - Reconcile a state file with a snapshot

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::catalog::AcceptAll;
use crate::cli::state::{load_state, read_snapshot, save_state, StateLock};
use crate::cli::Context;
use crate::core::events::Notify;
use crate::ui::output;

/// Reconcile `state` with the snapshot at `snapshot`.
///
/// The snapshot bypasses the catalog: it describes state, not requests.
pub fn sync(ctx: &Context, state: &Path, snapshot: &Path) -> Result<()> {
    let state_path = ctx.resolve(state);
    let _lock = StateLock::acquire(&state_path)?;
    let mut tree = load_state(&state_path, Arc::new(AcceptAll))?;

    let desired = read_snapshot(&ctx.resolve(snapshot))?;
    let changes = tree
        .apply_snapshot(&desired, Notify::Emit)
        .with_context(|| format!("Cannot sync with '{}'", snapshot.display()))?;

    if !changes.is_empty() || !state_path.exists() {
        save_state(&state_path, &tree)?;
    }

    if ctx.json {
        output::json(&changes)?;
    } else {
        output::print(output::format_changes(&changes), ctx.verbosity);
    }
    Ok(())
}
