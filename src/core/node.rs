//! core::node
//!
//! Label nodes, the arena that owns them, and hierarchical comparison.
//!
//! # Architecture
//!
//! Live nodes are stored in an [`Arena`] and addressed by [`NodeId`]:
//! - Edges point both ways as ids (parent id, ordered child ids)
//! - Releasing a slot bumps its generation, so a detached node's id never
//!   resolves again even if the slot is reused
//!
//! A freshly created tag is a [`TagChain`]: an unattached run of pending
//! nodes, one per segment, each with count 1. The tree splices the part of a
//! chain it does not already hold into the arena.
//!
//! # Lifecycle
//!
//! ```text
//! UNATTACHED (TagChain) --splice--> ATTACHED (in Arena) --release--> DETACHED
//! ```
//!
//! DETACHED is terminal.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::types::{Segment, TagName, TypeError};

/// Stable handle to a node in a tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Precomputed hash of a segment name, used to skip most string
/// comparisons during sibling lookup.
pub(crate) fn hash_name(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

/// One attached segment of the hierarchy.
#[derive(Debug, Clone)]
pub struct TagNode {
    name: Segment,
    name_hash: u64,
    count: i32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
}

impl TagNode {
    pub(crate) fn new(name: Segment, count: i32, parent: Option<NodeId>, depth: usize) -> Self {
        let name_hash = hash_name(name.as_str());
        Self {
            name,
            name_hash,
            count: count.max(0),
            parent,
            children: Vec::new(),
            depth,
        }
    }

    /// The segment this node represents.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn segment(&self) -> &Segment {
        &self.name
    }

    pub fn name_hash(&self) -> u64 {
        self.name_hash
    }

    /// Number of outstanding applications of this node's tag.
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Set the count, clamping at zero.
    pub(crate) fn set_count(&mut self, value: i32) {
        self.count = value.max(0);
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|c| *c != child);
    }

    /// True if this node carries `name`, checking the hash first.
    pub(crate) fn is_named(&self, name: &str, name_hash: u64) -> bool {
        self.name_hash == name_hash && self.name.as_str() == name
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<TagNode>,
}

/// Generational storage for attached nodes.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Arena {
    pub(crate) fn insert(&mut self, node: TagNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&TagNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TagNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Release a node. Its id is invalid from here on.
    pub(crate) fn release(&mut self, id: NodeId) -> Option<TagNode> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Release every node, invalidating all outstanding ids.
    pub(crate) fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }

    /// Ids of every live node, in slot order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|_| NodeId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }
}

/// Anything that can be walked upward segment by segment.
///
/// Implemented by live nodes ([`NodeRef`]) and unattached chains
/// ([`ChainLink`]) so both can be compared with each other.
pub trait TagLineage: Copy {
    /// The segment at this position.
    fn name(&self) -> &str;

    /// Number of ancestors.
    fn depth(&self) -> usize;

    /// The next node toward the root.
    fn parent(&self) -> Option<Self>;
}

fn ascend<L: TagLineage>(mut node: L, depth: usize) -> Option<L> {
    while node.depth() > depth {
        node = node.parent()?;
    }
    Some(node)
}

/// Prefix comparison: the deeper lineage is aligned to the shallower one's
/// depth, then both are walked to the root comparing segment names.
///
/// `a.b` matches `a.b.c`; `a.b.x` does not match `a.b.y`. The relation is
/// reflexive and symmetric.
pub fn compare<A: TagLineage, B: TagLineage>(a: A, b: B) -> bool {
    let depth = a.depth().min(b.depth());
    let (Some(mut a), Some(mut b)) = (ascend(a, depth), ascend(b, depth)) else {
        return false;
    };

    loop {
        if a.name() != b.name() {
            return false;
        }
        match (a.parent(), b.parent()) {
            (Some(pa), Some(pb)) => {
                a = pa;
                b = pb;
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Exact comparison: true iff both full names are identical.
pub fn compare_exact<A: TagLineage, B: TagLineage>(a: A, b: B) -> bool {
    a.depth() == b.depth() && compare(a, b)
}

/// An unattached chain of pending nodes built from a dotted path.
///
/// Every pending node has count 1 until it is spliced into a tree.
///
/// # Example
///
/// ```
/// use labeltree::core::node::{compare, compare_exact, TagChain};
///
/// let abc = TagChain::parse("A.B.C").unwrap();
/// let ab = TagChain::parse("a.b").unwrap();
///
/// assert_eq!(abc.leaf().full_name().as_str(), "a.b.c");
/// assert!(compare(ab.leaf(), abc.leaf()));
/// assert!(!compare_exact(ab.leaf(), abc.leaf()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChain {
    segments: Vec<Segment>,
}

impl TagChain {
    /// Build the chain for an already validated tag.
    pub fn create(tag: &TagName) -> Self {
        Self {
            segments: tag.to_segments(),
        }
    }

    /// Case-fold and validate `raw`, then build its chain.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTag` if `raw` is not a valid tag.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        Ok(Self::create(&TagName::new(raw)?))
    }

    /// The leaf-most pending node.
    pub fn leaf(&self) -> ChainLink<'_> {
        ChainLink {
            chain: self,
            depth: self.segments.len() - 1,
        }
    }

    /// The pending node at `depth`, if the chain is that deep.
    pub fn link(&self, depth: usize) -> Option<ChainLink<'_>> {
        (depth < self.segments.len()).then_some(ChainLink { chain: self, depth })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Detach the pending nodes from `depth` downward, root-most first.
    pub(crate) fn split_off(mut self, depth: usize) -> Vec<Segment> {
        self.segments.split_off(depth)
    }
}

/// A view of one pending node inside a [`TagChain`].
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'a> {
    chain: &'a TagChain,
    depth: usize,
}

impl ChainLink<'_> {
    /// Pending nodes always carry a single application.
    pub fn count(&self) -> i32 {
        1
    }

    pub fn full_name(&self) -> TagName {
        let prefix = &self.chain.segments[..=self.depth];
        let mut name = TagName::from(prefix[0].clone());
        for segment in &prefix[1..] {
            name = name.join(segment);
        }
        name
    }
}

impl TagLineage for ChainLink<'_> {
    fn name(&self) -> &str {
        self.chain.segments[self.depth].as_str()
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn parent(&self) -> Option<Self> {
        self.depth.checked_sub(1).map(|depth| ChainLink {
            chain: self.chain,
            depth,
        })
    }
}

/// A borrowed view of one attached node.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a Arena,
    id: NodeId,
    node: &'a TagNode,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(arena: &'a Arena, id: NodeId) -> Option<Self> {
        arena.get(id).map(|node| Self { arena, id, node })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a TagNode {
        self.node
    }

    pub fn segment(&self) -> &'a Segment {
        self.node.segment()
    }

    pub fn count(&self) -> i32 {
        self.node.count()
    }

    pub fn has_children(&self) -> bool {
        !self.node.children().is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let arena = self.arena;
        self.node
            .children()
            .iter()
            .filter_map(move |id| NodeRef::new(arena, *id))
    }

    /// Dot-joined names from the root down to this node.
    pub fn full_name(&self) -> TagName {
        let mut name = TagName::from(self.segment().clone());
        let mut current = TagLineage::parent(self);
        while let Some(node) = current {
            name = name.prefixed(node.segment());
            current = TagLineage::parent(&node);
        }
        name
    }
}

impl TagLineage for NodeRef<'_> {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn depth(&self) -> usize {
        self.node.depth()
    }

    fn parent(&self) -> Option<Self> {
        self.node
            .parent()
            .and_then(|id| NodeRef::new(self.arena, id))
    }
}
