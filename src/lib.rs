//! labeltree - Counted hierarchical labels
//!
//! A label is a dotted path such as `combat.attack.heavy`. Labels live in a
//! [`core::tree::TagTree`], a forest where every node counts how many times
//! its path was applied. Adding a label bumps every node on the path;
//! removing it walks back up and detaches whatever reaches zero.
//!
//! # Architecture
//!
//! - [`core`] - Tag types, nodes, the tree, change records, snapshots, verification
//! - [`catalog`] - The validator capability and the catalog of known tags
//! - [`cli`] - The `ltag` command-line interface over snapshot state files
//! - [`ui`] - User-facing output helpers
//!
//! # Correctness Invariants
//!
//! 1. An attached node always has a positive count
//! 2. Sibling names are unique after case folding
//! 3. A malformed snapshot never touches the tree
//! 4. Detached node ids never resolve again

pub mod catalog;
pub mod cli;
pub mod core;
pub mod ui;
