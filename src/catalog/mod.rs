//! catalog
//!
//! The set of known tag names and the validator capability trees consult.
//!
//! # Sources
//!
//! A catalog source is plain text with one dotted tag per line:
//!
//! ```text
//! # comments start with '#'
//! [sections are ignored too]
//! combat.attack.heavy
//! status.stunned
//! ```
//!
//! Blank lines and lines starting with `#` or `[` are skipped. Multiple
//! sources merge by union. Directories are searched recursively for files
//! with the catalog extension (`.tags` by default).
//!
//! # Semantics
//!
//! A catalog entry also makes every ancestor known: listing
//! `combat.attack.heavy` means `combat` and `combat.attack` validate too.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::core::events::Notify;
use crate::core::tree::TagTree;
use crate::core::types::{TagName, TypeError};

/// Default extension for catalog files.
pub const DEFAULT_EXTENSION: &str = "tags";

/// Decides whether a tag may be attached or detached through the
/// validating entry points of a tree.
pub trait TagValidator: Send + Sync {
    /// True if `tag` (already case-folded) is a known tag.
    fn is_known(&self, tag: &str) -> bool;
}

/// Validator that knows every tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl TagValidator for AcceptAll {
    fn is_known(&self, _tag: &str) -> bool {
        true
    }
}

impl<F> TagValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_known(&self, tag: &str) -> bool {
        self(tag)
    }
}

/// Errors from catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {source}")]
    InvalidLine {
        path: PathBuf,
        line: usize,
        source: TypeError,
    },

    #[error("no catalog sources found")]
    NoSources,
}

/// A merged catalog of known tags.
///
/// # Example
///
/// ```
/// use labeltree::catalog::{TagCatalog, TagValidator};
///
/// let catalog = TagCatalog::parse_str("# abilities\ncombat.attack\nstatus.stunned\n").unwrap();
///
/// assert!(catalog.is_known("combat.attack"));
/// assert!(catalog.is_known("combat"));
/// assert!(!catalog.is_known("combat.block"));
/// ```
#[derive(Debug, Default)]
pub struct TagCatalog {
    tags: TagTree,
    sources: Vec<PathBuf>,
}

impl TagCatalog {
    /// Create an empty catalog. It knows no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse catalog text that did not come from a file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidLine` for the first malformed tag.
    pub fn parse_str(contents: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.add_source_text(Path::new("<inline>"), contents)?;
        Ok(catalog)
    }

    /// Load a set of files and/or directories and merge them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoSources` if no catalog file was found at all.
    pub fn load_sources(paths: &[PathBuf], extension: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for path in paths {
            if path.is_dir() {
                catalog.load_dir(path, extension)?;
            } else {
                catalog.load_file(path)?;
            }
        }

        if catalog.sources.is_empty() {
            return Err(CatalogError::NoSources);
        }
        Ok(catalog)
    }

    /// Merge one catalog file into this catalog.
    pub fn load_file(&mut self, path: &Path) -> Result<(), CatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.add_source_text(path, &contents)?;
        self.sources.push(path.to_path_buf());
        Ok(())
    }

    /// Merge every catalog file below `dir`, in sorted path order.
    pub fn load_dir(&mut self, dir: &Path, extension: &str) -> Result<(), CatalogError> {
        let mut files = Vec::new();
        collect_files(dir, extension, &mut files)?;
        files.sort();

        tracing::debug!(dir = %dir.display(), files = files.len(), "loading catalog directory");
        for file in files {
            self.load_file(&file)?;
        }
        Ok(())
    }

    /// Union another catalog into this one.
    pub fn merge(&mut self, other: &TagCatalog) {
        for tag in other.tags.current_tags() {
            self.tags.add_unchecked(&tag, Notify::Silent);
        }
        self.sources.extend(other.sources.iter().cloned());
    }

    /// Every known tag, ancestors included, in pre-order.
    pub fn tags(&self) -> Vec<TagName> {
        self.tags.current_tags()
    }

    /// Only the most specific known tags.
    pub fn leaf_tags(&self) -> Vec<TagName> {
        self.tags.leaf_tags()
    }

    /// Files this catalog was loaded from.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Wrap the catalog for sharing across trees.
    pub fn into_validator(self) -> Arc<dyn TagValidator> {
        Arc::new(self)
    }

    fn add_source_text(&mut self, path: &Path, contents: &str) -> Result<(), CatalogError> {
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }

            let tag = TagName::new(line).map_err(|source| CatalogError::InvalidLine {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
            self.tags.add_unchecked(&tag, Notify::Silent);
        }
        Ok(())
    }
}

impl TagValidator for TagCatalog {
    fn is_known(&self, tag: &str) -> bool {
        self.tags.has(tag)
    }
}

fn collect_files(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    let read_error = |e| CatalogError::ReadError {
        path: dir.to_path_buf(),
        source: e,
    };

    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            collect_files(&path, extension, out)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn skips_comments_sections_and_blanks() {
        let catalog = TagCatalog::parse_str("[Tags]\n# note\n\n  a.b  \n").unwrap();
        assert_eq!(
            catalog.tags().iter().map(TagName::as_str).collect::<Vec<_>>(),
            vec!["a", "a.b"]
        );
    }

    #[test]
    fn ancestors_are_known() {
        let catalog = TagCatalog::parse_str("a.b.c").unwrap();
        assert!(catalog.is_known("a"));
        assert!(catalog.is_known("a.b"));
        assert!(catalog.is_known("a.b.c"));
        assert!(!catalog.is_known("a.b.c.d"));
        assert!(!catalog.is_known("b"));
    }

    #[test]
    fn lookups_fold_case() {
        let catalog = TagCatalog::parse_str("Combat.Attack").unwrap();
        assert!(catalog.is_known("COMBAT.attack"));
    }

    #[test]
    fn invalid_line_reports_position() {
        let err = TagCatalog::parse_str("a\nb..c\n").unwrap_err();
        match err {
            CatalogError::InvalidLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn merge_is_union() {
        let mut first = TagCatalog::parse_str("a.b").unwrap();
        let second = TagCatalog::parse_str("a.c\nx").unwrap();
        first.merge(&second);

        for tag in ["a.b", "a.c", "x"] {
            assert!(first.is_known(tag), "{tag} should be known");
        }
        assert_eq!(first.leaf_tags().len(), 3);
    }

    #[test]
    fn load_dir_is_recursive_and_filters_extension() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("core.tags"), "combat.attack\n").unwrap();
        fs::write(nested.join("extra.tags"), "status.stunned\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored.tag\n").unwrap();

        let catalog =
            TagCatalog::load_sources(&[dir.path().to_path_buf()], DEFAULT_EXTENSION).unwrap();

        assert!(catalog.is_known("combat.attack"));
        assert!(catalog.is_known("status.stunned"));
        assert!(!catalog.is_known("ignored.tag"));
        assert_eq!(catalog.sources().len(), 2);
    }

    #[test]
    fn load_sources_requires_a_file() {
        let dir = TempDir::new().unwrap();
        let err = TagCatalog::load_sources(&[dir.path().to_path_buf()], DEFAULT_EXTENSION)
            .unwrap_err();
        assert!(matches!(err, CatalogError::NoSources));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = TagCatalog::load_sources(&[dir.path().join("missing.tags")], DEFAULT_EXTENSION)
            .unwrap_err();
        assert!(matches!(err, CatalogError::ReadError { .. }));
    }

    #[test]
    fn closures_are_validators() {
        let only_a = |tag: &str| tag.starts_with('a');
        assert!(only_a.is_known("a.b"));
        assert!(!TagValidator::is_known(&only_a, "b"));
        assert!(AcceptAll.is_known("anything"));
    }
}
