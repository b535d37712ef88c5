//! core::snapshot
//!
//! Point-in-time record of a tag tree (schema v1).
//!
//! # Wire Format
//!
//! A snapshot is an ordered sequence of `{name, parent_index, count}`
//! records in pre-order: every record's ancestors appear earlier in the
//! sequence, and `parent_index = -1` marks a root. This is the only
//! structural contract that must stay stable.
//!
//! On disk the records are wrapped in a self-describing envelope with
//! `kind` and `schema_version`, strictly parsed (unknown fields rejected).
//!
//! # Validation
//!
//! [`Snapshot::resolve`] rejects malformed input before a tree is touched:
//! out-of-range parent indices, invalid segment names, non-positive counts,
//! and duplicate full names are all fatal.
//!
//! # Example
//!
//! ```
//! use labeltree::core::snapshot::{parse_snapshot, serialize_snapshot, Snapshot, SnapshotRecord};
//!
//! let snapshot = Snapshot::new(vec![
//!     SnapshotRecord::new("a", -1, 2),
//!     SnapshotRecord::new("b", 0, 1),
//! ]);
//!
//! let json = serialize_snapshot(&snapshot).unwrap();
//! let parsed = parse_snapshot(&json).unwrap();
//! assert_eq!(parsed, snapshot);
//!
//! let resolved = parsed.resolve().unwrap();
//! assert_eq!(resolved[1].tag.as_str(), "a.b");
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Fingerprint, Segment, TagName, TypeError};

/// The kind identifier for snapshot files.
pub const SNAPSHOT_KIND: &str = "labeltree.snapshot";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from snapshot parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    ParseError(String),

    #[error("invalid kind '{found}', expected '{}'", SNAPSHOT_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("record {index}: parent index {parent_index} does not point at an earlier record")]
    ParentOutOfRange { index: usize, parent_index: i32 },

    #[error("record {index}: invalid name: {source}")]
    InvalidName { index: usize, source: TypeError },

    #[error("record {index}: count must be at least 1, got {count}")]
    InvalidCount { index: usize, count: i32 },

    #[error("record {index}: duplicate tag '{tag}'")]
    DuplicateName { index: usize, tag: TagName },
}

/// One node of the serialized tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRecord {
    /// Single segment name.
    pub name: String,
    /// Index of the parent record, or -1 for a root.
    pub parent_index: i32,
    pub count: i32,
}

impl SnapshotRecord {
    pub fn new(name: impl Into<String>, parent_index: i32, count: i32) -> Self {
        Self {
            name: name.into(),
            parent_index,
            count,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_index == -1
    }
}

/// A validated record with its full dotted name reconstructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    pub tag: TagName,
    pub segment: Segment,
    /// Position of the parent in the resolved sequence.
    pub parent: Option<usize>,
    pub count: i32,
}

/// An ordered, pre-order sequence of snapshot records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<SnapshotRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<SnapshotRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SnapshotRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SnapshotRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate every record and reconstruct full names.
    ///
    /// Names are case-folded, so `A` and `a` under the same parent are
    /// duplicates.
    ///
    /// # Errors
    ///
    /// Returns the first malformed record found. Nothing is partially
    /// resolved.
    pub fn resolve(&self) -> Result<Vec<ResolvedRecord>, SnapshotError> {
        let mut resolved: Vec<ResolvedRecord> = Vec::with_capacity(self.records.len());
        let mut seen = HashSet::with_capacity(self.records.len());

        for (index, record) in self.records.iter().enumerate() {
            let segment = Segment::new(&record.name)
                .map_err(|source| SnapshotError::InvalidName { index, source })?;

            if record.count < 1 {
                return Err(SnapshotError::InvalidCount {
                    index,
                    count: record.count,
                });
            }

            let parent = match record.parent_index {
                -1 => None,
                p if p >= 0 && (p as usize) < index => Some(p as usize),
                p => {
                    return Err(SnapshotError::ParentOutOfRange {
                        index,
                        parent_index: p,
                    })
                }
            };

            let tag = match parent {
                Some(p) => resolved[p].tag.join(&segment),
                None => TagName::from(segment.clone()),
            };

            if !seen.insert(tag.clone()) {
                return Err(SnapshotError::DuplicateName { index, tag });
            }

            resolved.push(ResolvedRecord {
                tag,
                segment,
                parent,
                count: record.count,
            });
        }

        Ok(resolved)
    }

    /// Order-independent content hash of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is malformed.
    pub fn fingerprint(&self) -> Result<Fingerprint, SnapshotError> {
        let entries: Vec<(TagName, i32)> = self
            .resolve()?
            .into_iter()
            .map(|r| (r.tag, r.count))
            .collect();
        Ok(Fingerprint::compute(&entries))
    }
}

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    kind: String,
    schema_version: u32,
}

/// On-disk form of a snapshot.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotFileV1 {
    kind: String,
    schema_version: u32,
    records: Vec<SnapshotRecord>,
}

/// Parse snapshot JSON with version dispatch.
///
/// Structural validation is left to [`Snapshot::resolve`].
///
/// # Errors
///
/// Returns an error if:
/// - The JSON is malformed
/// - The `kind` field doesn't match `SNAPSHOT_KIND`
/// - The `schema_version` is not supported
pub fn parse_snapshot(json: &str) -> Result<Snapshot, SnapshotError> {
    let envelope: SnapshotEnvelope =
        serde_json::from_str(json).map_err(|e| SnapshotError::ParseError(e.to_string()))?;

    if envelope.kind != SNAPSHOT_KIND {
        return Err(SnapshotError::InvalidKind {
            found: envelope.kind,
        });
    }

    if envelope.schema_version != SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedVersion(envelope.schema_version));
    }

    let file: SnapshotFileV1 =
        serde_json::from_str(json).map_err(|e| SnapshotError::ParseError(e.to_string()))?;

    Ok(Snapshot::new(file.records))
}

/// Serialize a snapshot into its versioned envelope (pretty JSON).
pub fn serialize_snapshot(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let file = SnapshotFileV1 {
        kind: SNAPSHOT_KIND.to_string(),
        schema_version: SCHEMA_VERSION,
        records: snapshot.records.clone(),
    };
    serde_json::to_string_pretty(&file).map_err(|e| SnapshotError::ParseError(e.to_string()))
}
