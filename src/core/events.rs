//! core::events
//!
//! Typed change records and their synchronous delivery.
//!
//! # Design
//!
//! Every mutating tree call returns the records it produced, in emission
//! order. A [`ChangeNotifier`] owned by the tree also hands each record to
//! registered subscribers before the call returns. There is no queue and no
//! async boundary.
//!
//! # Ordering
//!
//! - `add`: root to leaf
//! - `remove`: leaf to root
//! - snapshot application: removals first, then pre-order additions and
//!   count corrections

use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::types::TagName;

/// What happened to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The node was spliced into the tree.
    Added,
    /// The node was detached; its id no longer resolves. Descendants
    /// dropped along with an ancestor get their own `Removed`.
    Removed,
    CounterIncreased,
    CounterDecreased,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::CounterIncreased => "counter-increased",
            ChangeKind::CounterDecreased => "counter-decreased",
        };
        write!(f, "{label}")
    }
}

/// One change record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChange {
    /// The node that changed. Stale once `kind` is `Removed`.
    #[serde(skip)]
    pub node: Option<NodeId>,
    /// Full name of the node at the time of the change.
    pub tag: TagName,
    pub kind: ChangeKind,
    /// The node's count after the change.
    pub count: i32,
}

impl TagChange {
    pub fn new(node: NodeId, tag: TagName, kind: ChangeKind, count: i32) -> Self {
        Self {
            node: Some(node),
            tag,
            kind,
            count,
        }
    }
}

impl std::fmt::Display for TagChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.tag, self.count)
    }
}

/// Whether a mutation reports its changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notify {
    #[default]
    Emit,
    Silent,
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&TagChange) + Send + Sync>;

/// Synchronous fan-out of change records to subscribers.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use labeltree::core::events::ChangeKind;
/// use labeltree::core::tree::TagTree;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let mut tree = TagTree::new();
/// let id = tree.notifier_mut().subscribe(move |change| {
///     sink.lock().unwrap().push(change.kind);
/// });
///
/// tree.add("a.b").unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![ChangeKind::Added, ChangeKind::Added]);
///
/// assert!(tree.notifier_mut().unsubscribe(id));
/// tree.add("a").unwrap();
/// assert_eq!(seen.lock().unwrap().len(), 2);
/// ```
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. It is called for every record, in order.
    ///
    /// Subscribers are `Send + Sync` so trees can be shared as validators.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&TagChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver a record to every subscriber.
    pub fn emit(&mut self, change: &TagChange) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(change);
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
