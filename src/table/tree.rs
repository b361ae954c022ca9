//! Bucket Trees
//!
//! Every bucket is an AVL tree ordered by byte-wise key comparison. All trees
//! of a table live in one [`Arena`]: nodes are addressed by index, and a
//! bucket only stores the index of its root. Freed slots are recycled through
//! a free list.
//!
//! ```text
//! buckets: [ None | Some(4) | None | Some(0) | ... ]
//!                       │              │
//! arena:   ┌────┬────┬──▼─┬────┬────┐  │
//!          │ n0 │ n1 │ n2 │ -- │ n4 │◄─┘
//!          └────┴────┴────┴────┴────┘
//!                      free list: [3]
//! ```

use std::cmp::Ordering;

use super::entry::Entry;

/// Index of a node inside the arena
pub(crate) type NodeId = usize;

struct Node<V> {
    entry: Entry<V>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: u8,
}

/// Node pool shared by all bucket trees of a table
pub(crate) struct Arena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
}

impl<V> Arena<V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live nodes across all trees
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find the node holding `key` in the tree rooted at `root`
    pub(crate) fn find(&self, root: Option<NodeId>, key: &str) -> Option<NodeId> {
        let mut cursor = root;
        while let Some(id) = cursor {
            let node = self.node(id);
            cursor = match key.cmp(node.entry.key()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    pub(crate) fn entry(&self, id: NodeId) -> &Entry<V> {
        &self.node(id).entry
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> &mut Entry<V> {
        &mut self.node_mut(id).entry
    }

    pub(crate) fn children(&self, id: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        let node = self.node(id);
        (node.left, node.right)
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert `entry` into the tree rooted at `root`.
    ///
    /// Returns the new root, and the entry itself when its key is already
    /// present (the tree is left untouched in that case).
    pub(crate) fn insert(
        &mut self,
        root: Option<NodeId>,
        entry: Entry<V>,
    ) -> (NodeId, Option<Entry<V>>) {
        let Some(id) = root else {
            return (self.alloc(entry), None);
        };

        let (left, right) = self.children(id);
        match entry.key().cmp(self.node(id).entry.key()) {
            Ordering::Less => {
                let (child, rejected) = self.insert(left, entry);
                self.node_mut(id).left = Some(child);
                if rejected.is_some() {
                    return (id, rejected);
                }
                (self.rebalance(id), None)
            }
            Ordering::Greater => {
                let (child, rejected) = self.insert(right, entry);
                self.node_mut(id).right = Some(child);
                if rejected.is_some() {
                    return (id, rejected);
                }
                (self.rebalance(id), None)
            }
            Ordering::Equal => (id, Some(entry)),
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove the entry for `key` from the tree rooted at `root`.
    ///
    /// Returns the new root and the detached entry, if any.
    pub(crate) fn remove(
        &mut self,
        root: Option<NodeId>,
        key: &str,
    ) -> (Option<NodeId>, Option<Entry<V>>) {
        let Some(id) = root else {
            return (None, None);
        };

        let (left, right) = self.children(id);
        match key.cmp(self.node(id).entry.key()) {
            Ordering::Less => {
                let (child, removed) = self.remove(left, key);
                if removed.is_none() {
                    return (Some(id), None);
                }
                self.node_mut(id).left = child;
                (Some(self.rebalance(id)), removed)
            }
            Ordering::Greater => {
                let (child, removed) = self.remove(right, key);
                if removed.is_none() {
                    return (Some(id), None);
                }
                self.node_mut(id).right = child;
                (Some(self.rebalance(id)), removed)
            }
            Ordering::Equal => {
                let node = self.dealloc(id);
                let replacement = match (left, right) {
                    (None, None) => None,
                    (Some(child), None) | (None, Some(child)) => Some(child),
                    (Some(left), Some(right)) => {
                        // Successor takes the removed node's place
                        let (rest, successor) = self.detach_min(right);
                        let slot = self.node_mut(successor);
                        slot.left = Some(left);
                        slot.right = rest;
                        Some(self.rebalance(successor))
                    }
                };
                (replacement, Some(node.entry))
            }
        }
    }

    /// Unlink the leftmost node under `id`; returns (new subtree root, min)
    fn detach_min(&mut self, id: NodeId) -> (Option<NodeId>, NodeId) {
        let (left, right) = self.children(id);
        match left {
            None => (right, id),
            Some(left) => {
                let (rest, min) = self.detach_min(left);
                self.node_mut(id).left = rest;
                (Some(self.rebalance(id)), min)
            }
        }
    }

    /// Remove every node of the tree rooted at `root`, returning its entries
    /// in no particular order
    pub(crate) fn drain(&mut self, root: Option<NodeId>) -> Vec<Entry<V>> {
        let mut entries = Vec::new();
        let mut stack: Vec<NodeId> = root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.dealloc(id);
            stack.extend(node.left);
            stack.extend(node.right);
            entries.push(node.entry);
        }

        entries
    }

    // =========================================================================
    // Balancing
    // =========================================================================

    fn height(&self, id: Option<NodeId>) -> u8 {
        id.map_or(0, |id| self.node(id).height)
    }

    fn balance_factor(&self, id: NodeId) -> i16 {
        let (left, right) = self.children(id);
        self.height(left) as i16 - self.height(right) as i16
    }

    fn update_height(&mut self, id: NodeId) {
        let (left, right) = self.children(id);
        let height = 1 + self.height(left).max(self.height(right));
        self.node_mut(id).height = height;
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.node(id).left else {
            return id;
        };
        let inner = self.node(pivot).right;
        self.node_mut(id).left = inner;
        self.node_mut(pivot).right = Some(id);
        self.update_height(id);
        self.update_height(pivot);
        pivot
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.node(id).right else {
            return id;
        };
        let inner = self.node(pivot).left;
        self.node_mut(id).right = inner;
        self.node_mut(pivot).left = Some(id);
        self.update_height(id);
        self.update_height(pivot);
        pivot
    }

    /// Restore the AVL property at `id`; returns the subtree's new root
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update_height(id);
        let balance = self.balance_factor(id);
        let (left, right) = self.children(id);

        if balance > 1 {
            if let Some(left) = left {
                if self.balance_factor(left) < 0 {
                    let rotated = self.rotate_left(left);
                    self.node_mut(id).left = Some(rotated);
                }
            }
            return self.rotate_right(id);
        }

        if balance < -1 {
            if let Some(right) = right {
                if self.balance_factor(right) > 0 {
                    let rotated = self.rotate_right(right);
                    self.node_mut(id).right = Some(rotated);
                }
            }
            return self.rotate_left(id);
        }

        id
    }

    // =========================================================================
    // Slot Management
    // =========================================================================

    fn alloc(&mut self, entry: Entry<V>) -> NodeId {
        let node = Node {
            entry,
            left: None,
            right: None,
            height: 1,
        };

        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.slots[id].is_none(), "free list points at a live node");
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn dealloc(&mut self, id: NodeId) -> Node<V> {
        let node = self.slots[id].take();
        self.free.push(id);
        match node {
            Some(node) => node,
            None => unreachable!("node {id} released twice"),
        }
    }

    fn node(&self, id: NodeId) -> &Node<V> {
        match &self.slots[id] {
            Some(node) => node,
            None => unreachable!("dangling node index {id}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match &mut self.slots[id] {
            Some(node) => node,
            None => unreachable!("dangling node index {id}"),
        }
    }
}
