//! cli::state
//!
//! State files: a tree persisted as a snapshot envelope.
//!
//! A missing state file is an empty tree. Writes go to a temp file in the
//! same directory and are renamed into place.
//!
//! # Concurrency
//!
//! Commands that rewrite a state file hold a [`StateLock`] from load to
//! save: an OS-level exclusive lock on `<state>.lock`. Concurrent writers
//! queue up behind it instead of overwriting each other. Readers take no
//! lock; the rename means they see either the old file or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use fs2::FileExt;

use crate::catalog::TagValidator;
use crate::core::events::Notify;
use crate::core::snapshot::{parse_snapshot, serialize_snapshot, Snapshot};
use crate::core::tree::TagTree;

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    parse_snapshot(&contents).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Load a state file into a fresh tree guarded by `validator`.
pub fn load_state(path: &Path, validator: Arc<dyn TagValidator>) -> Result<TagTree> {
    let mut tree = TagTree::with_validator(validator);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "state file missing, starting empty");
        return Ok(tree);
    }

    let snapshot = read_snapshot(path)?;
    tree.apply_snapshot(&snapshot, Notify::Silent)
        .with_context(|| format!("Invalid state file '{}'", path.display()))?;
    Ok(tree)
}

/// Write the tree's state to `path` atomically.
pub fn save_state(path: &Path, tree: &TagTree) -> Result<()> {
    let contents = serialize_snapshot(&tree.get_state())?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }

    let temp_path = temp_path_for(path);
    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create '{}'", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .and_then(|()| file.sync_all())
        .with_context(|| format!("Failed to write '{}'", temp_path.display()))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace '{}'", path.display()))?;

    tracing::debug!(path = %path.display(), tags = tree.len(), "saved state");
    Ok(())
}

/// Exclusive lock guarding one state file across processes.
///
/// Released when dropped.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
    file: Option<File>,
}

impl StateLock {
    /// Lock the state file at `state`, waiting for any other holder.
    pub fn acquire(state: &Path) -> Result<Self> {
        if let Some(parent) = state.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }

        let path = sibling_path(state, ".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock '{}'", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                tracing::debug!(path = %path.display(), "state file busy, waiting for lock");
                file.lock_exclusive()
                    .with_context(|| format!("Failed to lock '{}'", path.display()))?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to lock '{}'", path.display()));
            }
        }

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    sibling_path(path, ".tmp")
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AcceptAll;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_tree() {
        let temp = TempDir::new().unwrap();
        let tree = load_state(&temp.path().join("none.json"), Arc::new(AcceptAll)).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn save_then_load_preserves_counts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/state.json");

        let mut tree = TagTree::new();
        tree.add("a.b").unwrap();
        tree.add("a.b").unwrap();
        tree.add("x").unwrap();
        save_state(&path, &tree).unwrap();

        let loaded = load_state(&path, Arc::new(AcceptAll)).unwrap();
        assert_eq!(loaded.get_state(), tree.get_state());
        assert!(!temp.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_state(&path, Arc::new(AcceptAll)).is_err());
    }

    #[test]
    fn lock_is_sibling_and_reacquirable() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join("nested/state.json");

        let lock = StateLock::acquire(&state).unwrap();
        assert_eq!(lock.path(), temp.path().join("nested/state.json.lock"));
        drop(lock);

        let again = StateLock::acquire(&state).unwrap();
        assert!(again.path().exists());
    }

    #[test]
    fn locked_writers_do_not_lose_updates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        let _lock = StateLock::acquire(&path).unwrap();
                        let mut tree = load_state(&path, Arc::new(AcceptAll)).unwrap();
                        tree.add("a.b").unwrap();
                        save_state(&path, &tree).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let tree = load_state(&path, Arc::new(AcceptAll)).unwrap();
        assert_eq!(tree.count_of("a.b"), Some(40));
    }

    #[test]
    fn temp_path_is_sibling() {
        assert_eq!(
            temp_path_for(Path::new("/x/state.json")),
            PathBuf::from("/x/state.json.tmp")
        );
    }
}
