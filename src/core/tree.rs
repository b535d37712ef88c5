//! core::tree
//!
//! The label tree: a forest of counted tag nodes.
//!
//! # Architecture
//!
//! Nodes live in an arena owned by the tree; the forest is a list of root
//! ids. Each node counts its outstanding applications, and a node is
//! reachable from the roots iff its count is positive.
//!
//! # Invariants
//!
//! - Adding a tag increments every node on its path by one
//! - A node whose count reaches zero is detached with its whole subtree,
//!   and every detached node is reported as `Removed`
//! - Sibling names are unique
//!
//! Debug builds re-verify these after every mutation and panic on failure.
//!
//! # Concurrency
//!
//! A tree is plain single-threaded state. Hosts touching one tree from
//! several threads must serialize access themselves.
//!
//! # Example
//!
//! ```
//! use labeltree::core::tree::TagTree;
//!
//! let mut tree = TagTree::new();
//! tree.add("a").unwrap();
//! tree.add("a.b").unwrap();
//! tree.add("a.b.c").unwrap();
//! tree.add("a.b.c").unwrap();
//!
//! assert_eq!(tree.count_of("a"), Some(4));
//! assert_eq!(tree.count_of("a.b"), Some(3));
//! assert_eq!(tree.count_of("a.b.c"), Some(2));
//!
//! // Prefix semantics: an ancestor path counts as present.
//! assert!(tree.has("a.b"));
//! assert!(!tree.has_exact("a.b"));
//! assert!(tree.has_exact("a.b.c"));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use super::events::{ChangeKind, ChangeNotifier, Notify, TagChange};
use super::node::{hash_name, Arena, NodeId, NodeRef, TagChain, TagNode};
use super::snapshot::{Snapshot, SnapshotError, SnapshotRecord};
use super::types::{Segment, TagName, TypeError};
use crate::catalog::{AcceptAll, TagValidator};

/// Errors from tree mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error(transparent)]
    InvalidTag(#[from] TypeError),

    #[error("tag '{0}' is not in the catalog")]
    UnknownTag(TagName),

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// A forest of counted hierarchical tags.
pub struct TagTree {
    arena: Arena,
    roots: Vec<NodeId>,
    validator: Arc<dyn TagValidator>,
    notifier: ChangeNotifier,
}

impl Default for TagTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TagTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagTree")
            .field("tags", &self.current_tags())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl TagTree {
    /// Create an empty tree whose validating entry points accept any tag.
    pub fn new() -> Self {
        Self::with_validator(Arc::new(AcceptAll))
    }

    /// Create an empty tree that checks `add`/`remove` against `validator`.
    pub fn with_validator(validator: Arc<dyn TagValidator>) -> Self {
        Self {
            arena: Arena::default(),
            roots: Vec::new(),
            validator,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn validator(&self) -> &Arc<dyn TagValidator> {
        &self.validator
    }

    pub fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    // ========== Validating mutations ==========

    /// Add a tag, or bump its count if it is already present.
    ///
    /// # Errors
    ///
    /// Fails before touching the tree if `tag` is malformed or the
    /// validator does not know it.
    pub fn add(&mut self, tag: &str) -> Result<Vec<TagChange>, TreeError> {
        let tag = self.checked(tag)?;
        Ok(self.add_unchecked(&tag, Notify::Emit))
    }

    /// Remove one application of a tag.
    ///
    /// # Errors
    ///
    /// Fails before touching the tree if `tag` is malformed or unknown.
    pub fn remove(&mut self, tag: &str) -> Result<Vec<TagChange>, TreeError> {
        let tag = self.checked(tag)?;
        Ok(self.remove_unchecked(&tag, false, Notify::Emit))
    }

    /// Remove a tag entirely regardless of its count.
    ///
    /// Ancestors still lose exactly one application.
    pub fn remove_all(&mut self, tag: &str) -> Result<Vec<TagChange>, TreeError> {
        let tag = self.checked(tag)?;
        Ok(self.remove_unchecked(&tag, true, Notify::Emit))
    }

    fn checked(&self, raw: &str) -> Result<TagName, TreeError> {
        let tag = TagName::new(raw)?;
        if !self.validator.is_known(tag.as_str()) {
            tracing::debug!(tag = %tag, "rejected unknown tag");
            return Err(TreeError::UnknownTag(tag));
        }
        Ok(tag)
    }

    // ========== Core mutations ==========

    /// Attach `tag` without consulting the validator.
    ///
    /// Every live node on the path gains one application
    /// (`CounterIncreased`); the unmatched rest of the path is spliced in
    /// below the last match (`Added`, root to leaf).
    ///
    /// Counts saturate at `i32::MAX`: a node already there is left as is
    /// and reports no change.
    pub fn add_unchecked(&mut self, tag: &TagName, notify: Notify) -> Vec<TagChange> {
        let chain = TagChain::create(tag);
        let mut changes = Vec::new();
        let mut attach_point: Option<NodeId> = None;
        let mut matched = 0;

        for segment in chain.segments() {
            let Some(id) = self.find_child(attach_point, segment.as_str()) else {
                break;
            };
            let node = self.node_mut(id);
            if let Some(next) = node.count().checked_add(1) {
                node.set_count(next);
                changes.push(self.record(id, ChangeKind::CounterIncreased));
            } else {
                tracing::warn!(tag = %tag, node = %id, "count saturated, not incremented");
            }
            attach_point = Some(id);
            matched += 1;
        }

        for segment in chain.split_off(matched) {
            let id = self.attach(attach_point, segment, 1);
            changes.push(self.record(id, ChangeKind::Added));
            attach_point = Some(id);
        }

        tracing::debug!(tag = %tag, changes = changes.len(), "added tag");
        self.check_invariants();
        self.publish(changes, notify)
    }

    /// Detach one application of `tag` without consulting the validator.
    ///
    /// Walks from the node up to its root. The target is forced to zero when
    /// `ignore_count` is set; every other node loses exactly one. Nodes that
    /// reach zero are detached (`Removed`, followed by one `Removed` per
    /// descendant dropped with them), the rest report `CounterDecreased`.
    /// A missing tag is a no-op.
    pub fn remove_unchecked(
        &mut self,
        tag: &TagName,
        ignore_count: bool,
        notify: Notify,
    ) -> Vec<TagChange> {
        let Some(target) = self.locate(tag) else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        let mut current = Some(target);

        while let Some(id) = current {
            let node = self.node_mut(id);
            let next = if ignore_count && id == target {
                0
            } else {
                node.count() - 1
            };
            node.set_count(next);
            let (parent, count) = (node.parent(), node.count());

            if count <= 0 {
                changes.push(self.record(id, ChangeKind::Removed));
                self.detach(id, &mut changes);
            } else {
                changes.push(self.record(id, ChangeKind::CounterDecreased));
            }
            current = parent;
        }

        tracing::debug!(tag = %tag, ignore_count, changes = changes.len(), "removed tag");
        self.check_invariants();
        self.publish(changes, notify)
    }

    /// Detach every root, and with them the whole forest. No events.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.roots.clear();
    }

    // ========== Queries ==========

    /// True if a node exists at exactly this path, with or without children.
    pub fn has(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// True if a node exists at this path and has no children.
    pub fn has_exact(&self, tag: &str) -> bool {
        self.get(tag).is_some_and(|node| !node.has_children())
    }

    /// True if any tag is present; with no tags, true if the tree is non-empty.
    pub fn has_any<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        if tags.is_empty() {
            return !self.is_empty();
        }
        tags.iter().any(|t| self.has(t.as_ref()))
    }

    /// True if every tag is present; always false with no tags.
    pub fn has_all<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        !tags.is_empty() && tags.iter().all(|t| self.has(t.as_ref()))
    }

    /// Look up the node for a tag. Malformed tags are simply absent.
    pub fn get(&self, tag: &str) -> Option<NodeRef<'_>> {
        let tag = TagName::new(tag).ok()?;
        self.locate(&tag).and_then(|id| self.node(id))
    }

    pub fn count_of(&self, tag: &str) -> Option<i32> {
        self.get(tag).map(|node| node.count())
    }

    /// Resolve a node id. Detached ids resolve to `None`.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        NodeRef::new(&self.arena, id)
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.roots.iter().filter_map(|id| self.node(*id))
    }

    /// Direct children of a tag, or `None` if the tag is absent.
    pub fn children_of(&self, tag: &str) -> Option<Vec<NodeRef<'_>>> {
        self.get(tag).map(|node| node.children().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of attached nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Full names of every attached node, in pre-order.
    pub fn current_tags(&self) -> Vec<TagName> {
        self.pre_order()
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|node| node.full_name())
            .collect()
    }

    /// Full names of attached nodes without children, in pre-order.
    pub fn leaf_tags(&self) -> Vec<TagName> {
        self.pre_order()
            .into_iter()
            .filter_map(|id| self.node(id))
            .filter(|node| !node.has_children())
            .map(|node| node.full_name())
            .collect()
    }

    /// Human-readable listing of leaf tags, with counts above one.
    pub fn debug_info(&self) -> String {
        let mut out = String::from("= [TAGS]\n");
        for node in self.pre_order().into_iter().filter_map(|id| self.node(id)) {
            if node.has_children() {
                continue;
            }
            out.push_str(&format!("- {}", node.full_name()));
            if node.count() > 1 {
                out.push_str(&format!(": {}", node.count()));
            }
            out.push('\n');
        }
        out
    }

    // ========== Snapshots ==========

    /// Pre-order record of the whole forest.
    pub fn get_state(&self) -> Snapshot {
        let mut records = Vec::with_capacity(self.len());
        let mut stack: Vec<(NodeId, i32)> = self.roots.iter().rev().map(|id| (*id, -1)).collect();

        while let Some((id, parent_index)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            let index = records.len() as i32;
            records.push(SnapshotRecord::new(node.name(), parent_index, node.count()));
            stack.extend(node.children().iter().rev().map(|child| (*child, index)));
        }

        Snapshot::new(records)
    }

    /// Resynchronize the live tree to `snapshot`.
    ///
    /// The snapshot is fully validated first; a malformed snapshot leaves
    /// the tree untouched. Then:
    /// - live tags the snapshot lacks are detached with their subtrees
    /// - snapshot tags missing from the tree are spliced in under their
    ///   parent with the snapshot's count
    /// - tags in both whose counts differ are set in place
    ///
    /// Untouched tags keep their node identity, and ancestors that the
    /// snapshot keeps are never detached along the way.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &Snapshot,
        notify: Notify,
    ) -> Result<Vec<TagChange>, TreeError> {
        let desired = snapshot.resolve()?;
        let wanted: HashSet<&TagName> = desired.iter().map(|r| &r.tag).collect();
        let live: HashMap<TagName, NodeId> = self
            .pre_order()
            .into_iter()
            .filter_map(|id| self.node(id).map(|node| (node.full_name(), id)))
            .collect();

        let mut changes = Vec::new();

        // Removals in pre-order so a removed ancestor takes its subtree along.
        for id in self.pre_order() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if wanted.contains(&node.full_name()) {
                continue;
            }
            self.node_mut(id).set_count(0);
            changes.push(self.record(id, ChangeKind::Removed));
            self.detach(id, &mut changes);
        }

        let mut placed: Vec<NodeId> = Vec::with_capacity(desired.len());
        for record in &desired {
            let existing = live
                .get(&record.tag)
                .copied()
                .filter(|id| self.arena.get(*id).is_some());

            let id = match existing {
                Some(id) => {
                    let node = self.node_mut(id);
                    let before = node.count();
                    if before != record.count {
                        node.set_count(record.count);
                        let kind = if record.count > before {
                            ChangeKind::CounterIncreased
                        } else {
                            ChangeKind::CounterDecreased
                        };
                        changes.push(self.record(id, kind));
                    }
                    id
                }
                None => {
                    let parent = record.parent.map(|p| placed[p]);
                    let id = self.attach(parent, record.segment.clone(), record.count);
                    changes.push(self.record(id, ChangeKind::Added));
                    id
                }
            };
            placed.push(id);
        }

        tracing::debug!(
            records = desired.len(),
            changes = changes.len(),
            "applied snapshot"
        );
        self.check_invariants();
        Ok(self.publish(changes, notify))
    }

    // ========== Internals ==========

    /// Pre-order ids of every attached node.
    pub(crate) fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if let Some(node) = self.arena.get(id) {
                order.push(id);
                stack.extend(node.children().iter().rev().copied());
            }
        }
        order
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn root_ids(&self) -> &[NodeId] {
        &self.roots
    }

    #[cfg(test)]
    pub(crate) fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    fn siblings(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent.map(|id| self.arena.get(id)) {
            Some(Some(node)) => node.children(),
            Some(None) => &[],
            None => &self.roots,
        }
    }

    fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        let name_hash = hash_name(name);
        self.siblings(parent).iter().copied().find(|id| {
            self.arena
                .get(*id)
                .is_some_and(|node| node.is_named(name, name_hash))
        })
    }

    fn locate(&self, tag: &TagName) -> Option<NodeId> {
        let mut current = None;
        for segment in tag.segments() {
            current = Some(self.find_child(current, segment)?);
        }
        current
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TagNode {
        self.arena
            .get_mut(id)
            .unwrap_or_else(|| panic!("tag tree references detached node {id}"))
    }

    fn attach(&mut self, parent: Option<NodeId>, segment: Segment, count: i32) -> NodeId {
        assert!(
            self.find_child(parent, segment.as_str()).is_none(),
            "duplicate sibling '{segment}'"
        );

        let depth = match parent {
            Some(p) => self.node_mut(p).depth() + 1,
            None => 0,
        };
        let id = self.arena.insert(TagNode::new(segment, count, parent, depth));
        match parent {
            Some(p) => self.node_mut(p).push_child(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Unlink a node from its parent and release its whole subtree.
    ///
    /// The caller records the node itself; every descendant still holding
    /// a count is reported here as `Removed`, in pre-order.
    fn detach(&mut self, id: NodeId, changes: &mut Vec<TagChange>) {
        let Some(parent) = self.arena.get(id).map(TagNode::parent) else {
            return;
        };

        let mut subtree = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get(current) {
                subtree.push(current);
                stack.extend(node.children().iter().rev().copied());
            }
        }
        for &descendant in &subtree[1..] {
            self.node_mut(descendant).set_count(0);
            changes.push(self.record(descendant, ChangeKind::Removed));
        }

        match parent {
            Some(p) => self.node_mut(p).remove_child(id),
            None => self.roots.retain(|r| *r != id),
        }
        for current in subtree {
            self.arena.release(current);
        }
    }

    fn record(&self, id: NodeId, kind: ChangeKind) -> TagChange {
        let node = NodeRef::new(&self.arena, id)
            .unwrap_or_else(|| panic!("change record for detached node {id}"));
        TagChange::new(id, node.full_name(), kind, node.count())
    }

    fn publish(&mut self, changes: Vec<TagChange>, notify: Notify) -> Vec<TagChange> {
        match notify {
            Notify::Silent => Vec::new(),
            Notify::Emit => {
                for change in &changes {
                    self.notifier.emit(change);
                }
                changes
            }
        }
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        let result = super::verify::verify_tree(self);
        assert!(result.ok, "tag tree invariants violated: {:?}", result.errors);
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self) {}
}
