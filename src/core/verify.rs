//! core::verify
//!
//! Structural verification of a live tag tree.
//!
//! # Checks
//!
//! - Every attached node has a positive count
//! - Sibling names are unique
//! - Parent links agree with child lists, and depths follow the links
//! - Every stored name hash matches its name
//! - Every live node is reachable from the roots
//!
//! # Invariants
//!
//! - Never mutates the tree
//! - Must be deterministic
//!
//! A failed verification is a programming defect, not bad input: debug
//! builds run it after every mutation and panic on failure.

use std::collections::HashSet;

use thiserror::Error;

use super::node::{hash_name, NodeId};
use super::tree::TagTree;

/// Errors from verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("attached node {node} has non-positive count {count}")]
    NonPositiveCount { node: NodeId, count: i32 },

    #[error("duplicate sibling name '{name}' under {parent}")]
    DuplicateSibling { parent: String, name: String },

    #[error("node {child} is listed under {listed_under} but links to {linked_to}")]
    ParentMismatch {
        child: NodeId,
        listed_under: String,
        linked_to: String,
    },

    #[error("node {node} has depth {found}, expected {expected}")]
    DepthMismatch {
        node: NodeId,
        found: usize,
        expected: usize,
    },

    #[error("node {0} has a stale name hash")]
    StaleHash(NodeId),

    #[error("node {0} is referenced but not live")]
    DanglingChild(NodeId),

    #[error("node {0} is live but unreachable from the roots")]
    Unreachable(NodeId),
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }
}

fn describe(id: Option<NodeId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<root>".to_string(),
    }
}

/// Verify every structural invariant of `tree`.
pub fn verify_tree(tree: &TagTree) -> VerifyResult {
    let arena = tree.arena();
    let mut errors = Vec::new();
    let mut reached = HashSet::new();

    // (expected parent, expected depth, sibling ids)
    let mut pending: Vec<(Option<NodeId>, usize, &[NodeId])> = vec![(None, 0, tree.root_ids())];

    while let Some((parent, depth, siblings)) = pending.pop() {
        let mut names = HashSet::new();

        for &id in siblings {
            let Some(node) = arena.get(id) else {
                errors.push(VerifyError::DanglingChild(id));
                continue;
            };
            reached.insert(id);

            if node.count() <= 0 {
                errors.push(VerifyError::NonPositiveCount {
                    node: id,
                    count: node.count(),
                });
            }
            if !names.insert(node.name()) {
                errors.push(VerifyError::DuplicateSibling {
                    parent: describe(parent),
                    name: node.name().to_string(),
                });
            }
            if node.parent() != parent {
                errors.push(VerifyError::ParentMismatch {
                    child: id,
                    listed_under: describe(parent),
                    linked_to: describe(node.parent()),
                });
            }
            if node.depth() != depth {
                errors.push(VerifyError::DepthMismatch {
                    node: id,
                    found: node.depth(),
                    expected: depth,
                });
            }
            if node.name_hash() != hash_name(node.name()) {
                errors.push(VerifyError::StaleHash(id));
            }

            pending.push((Some(id), depth + 1, node.children()));
        }
    }

    for id in arena.ids() {
        if !reached.contains(&id) {
            errors.push(VerifyError::Unreachable(id));
        }
    }

    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}
