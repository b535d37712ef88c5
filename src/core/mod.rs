//! core
//!
//! Core domain types and the label tree.
//!
//! # Modules
//!
//! - [`types`] - Strong types: TagName, Segment, Fingerprint
//! - [`node`] - Arena nodes, unattached chains, lineage comparison
//! - [`tree`] - The counted label forest
//! - [`events`] - Change records and synchronous subscribers
//! - [`snapshot`] - Flat pre-order state and its file format
//! - [`verify`] - Structural verification of a live tree
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents malformed tags past the boundary
//! - Schemas are strict and self-describing
//! - All verification is deterministic

pub mod config;
pub mod events;
pub mod node;
pub mod snapshot;
pub mod tree;
pub mod types;
pub mod verify;
