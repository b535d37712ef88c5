//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`TagName`] - Validated, case-folded dotted tag (`a.b.c`)
//! - [`Segment`] - One component of a tag, never containing the separator
//! - [`Fingerprint`] - Content hash of a tag set for divergence detection
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! Case folding is ASCII-only and culture-invariant: `"A.B"` and `"a.b"`
//! name the same tag, while non-ASCII characters are kept as written.
//!
//! # Examples
//!
//! ```
//! use labeltree::core::types::{Segment, TagName};
//!
//! // Valid constructions
//! let tag = TagName::new("Combat.Attack.Heavy").unwrap();
//! assert_eq!(tag.as_str(), "combat.attack.heavy");
//! assert_eq!(tag.depth(), 2);
//!
//! let segment = Segment::new("Light").unwrap();
//! assert_eq!(tag.parent().unwrap().join(&segment).as_str(), "combat.attack.light");
//!
//! // Invalid constructions fail at creation time
//! assert!(TagName::new("combat..attack").is_err());
//! assert!(Segment::new("a.b").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// The hierarchy separator between segments.
pub const SEPARATOR: char = '.';

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid tag: {0}")]
    InvalidTag(String),

    #[error("invalid tag segment: {0}")]
    InvalidSegment(String),
}

/// Culture-invariant case folding applied to every tag and segment.
pub(crate) fn fold_case(raw: &str) -> String {
    raw.to_ascii_lowercase()
}

/// Check the characters shared by tags and segments.
fn check_chars(raw: &str) -> Result<(), &'static str> {
    for c in raw.chars() {
        if c.is_control() {
            return Err("cannot contain control characters");
        }
        if c.is_whitespace() {
            return Err("cannot contain whitespace");
        }
    }
    Ok(())
}

/// A validated hierarchical tag such as `combat.attack.heavy`.
///
/// Tags must conform to these rules:
/// - Cannot be empty
/// - Cannot contain empty segments (`a..b`, `.a`, `a.`)
/// - Cannot contain whitespace or control characters
///
/// The stored form is always lowercase.
///
/// # Example
///
/// ```
/// use labeltree::core::types::TagName;
///
/// let tag = TagName::new("Status.Stunned").unwrap();
/// assert_eq!(tag.as_str(), "status.stunned");
/// assert_eq!(tag.segments().collect::<Vec<_>>(), vec!["status", "stunned"]);
///
/// assert!(TagName::new("").is_err());
/// assert!(TagName::new("status.").is_err());
/// assert!(TagName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Create a new validated tag, folding it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTag` if the tag is empty, has an empty
    /// segment, or contains whitespace or control characters.
    pub fn new(tag: impl AsRef<str>) -> Result<Self, TypeError> {
        let folded = fold_case(tag.as_ref());
        Self::validate(&folded)?;
        Ok(Self(folded))
    }

    fn validate(tag: &str) -> Result<(), TypeError> {
        if tag.is_empty() {
            return Err(TypeError::InvalidTag("tag cannot be empty".into()));
        }

        check_chars(tag).map_err(|reason| TypeError::InvalidTag(format!("'{tag}' {reason}")))?;

        if tag.split(SEPARATOR).any(str::is_empty) {
            return Err(TypeError::InvalidTag(format!(
                "'{tag}' cannot contain empty segments"
            )));
        }

        Ok(())
    }

    /// Build a tag from root-first segments.
    ///
    /// Returns `None` when `segments` is empty.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Option<Self> {
        let joined = segments
            .into_iter()
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join(".");
        if joined.is_empty() {
            None
        } else {
            Some(Self(joined))
        }
    }

    /// Get the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the segments from root to leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split(SEPARATOR)
    }

    /// Owned segments from root to leaf.
    pub fn to_segments(&self) -> Vec<Segment> {
        // Every component of a validated tag is a valid segment.
        self.segments().map(|s| Segment(s.to_string())).collect()
    }

    /// Number of ancestors of the leaf segment (a root tag has depth 0).
    pub fn depth(&self) -> usize {
        self.0.matches(SEPARATOR).count()
    }

    /// The leaf-most segment.
    pub fn leaf(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// The parent tag, or `None` for a root tag.
    pub fn parent(&self) -> Option<TagName> {
        self.0
            .rfind(SEPARATOR)
            .map(|idx| TagName(self.0[..idx].to_string()))
    }

    /// All strict ancestors, root first.
    pub fn ancestors(&self) -> Vec<TagName> {
        self.0
            .match_indices(SEPARATOR)
            .map(|(idx, _)| TagName(self.0[..idx].to_string()))
            .collect()
    }

    /// True if `self` is a strict ancestor of `other`.
    ///
    /// The comparison respects segment boundaries: `a.b` is an ancestor of
    /// `a.b.c` but not of `a.bc`.
    pub fn is_ancestor_of(&self, other: &TagName) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0[self.0.len()..].starts_with(SEPARATOR)
    }

    /// Append one segment below this tag.
    pub fn join(&self, segment: &Segment) -> TagName {
        TagName(format!("{}{}{}", self.0, SEPARATOR, segment.as_str()))
    }

    /// Put one segment above this tag's root.
    pub(crate) fn prefixed(&self, segment: &Segment) -> TagName {
        TagName(format!("{}{}{}", segment.as_str(), SEPARATOR, self.0))
    }
}

impl TryFrom<String> for TagName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TagName> for String {
    fn from(tag: TagName) -> Self {
        tag.0
    }
}

impl From<Segment> for TagName {
    fn from(segment: Segment) -> Self {
        TagName(segment.0)
    }
}

impl std::str::FromStr for TagName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single validated path component.
///
/// Segments are lowercase and never contain [`SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Segment(String);

impl Segment {
    /// Create a new validated segment, folding it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSegment` if the segment is empty, contains
    /// the separator, or contains whitespace or control characters.
    pub fn new(segment: impl AsRef<str>) -> Result<Self, TypeError> {
        let folded = fold_case(segment.as_ref());

        if folded.is_empty() {
            return Err(TypeError::InvalidSegment("segment cannot be empty".into()));
        }
        if folded.contains(SEPARATOR) {
            return Err(TypeError::InvalidSegment(format!(
                "'{folded}' cannot contain '{SEPARATOR}'"
            )));
        }
        check_chars(&folded)
            .map_err(|reason| TypeError::InvalidSegment(format!("'{folded}' {reason}")))?;

        Ok(Self(folded))
    }

    /// Get the segment as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Segment {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Segment> for String {
    fn from(segment: Segment) -> Self {
        segment.0
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of a set of counted tags.
///
/// Used to detect whether two state files describe the same tag set,
/// independent of the traversal order they were written in.
///
/// # Example
///
/// ```
/// use labeltree::core::types::{Fingerprint, TagName};
///
/// let a = TagName::new("a").unwrap();
/// let ab = TagName::new("a.b").unwrap();
///
/// let fp = Fingerprint::compute(&[(a.clone(), 2), (ab.clone(), 1)]);
/// let fp2 = Fingerprint::compute(&[(ab, 1), (a, 2)]);
/// assert_eq!(fp, fp2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from (tag, count) pairs.
    ///
    /// The pairs are sorted by tag before hashing to ensure determinism
    /// regardless of input order.
    pub fn compute(entries: &[(TagName, i32)]) -> Self {
        let mut sorted: Vec<_> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (tag, count) in sorted {
            hasher.update(tag.as_str().as_bytes());
            hasher.update(b"\0");
            hasher.update(count.to_le_bytes());
            hasher.update(b"\n");
        }

        let result = hasher.finalize();
        Self(hex::encode(result))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
