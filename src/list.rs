//! Intrusive singly-linked list.
//!
//! Nodes are embedded in their owner records and addressed by index into
//! an owner-managed store (see [`Nodes`]); the list only keeps the head and
//! tail indices and a length. Nothing here allocates or frees storage.
//!
//! All state sits in [`Cell`]s, so the list can be relinked through a shared
//! reference while one of its owners is executing.

use core::cell::Cell;

/// A single forward link, embedded in an owner record.
#[derive(Debug, Default)]
pub struct ListNode {
    next: Cell<Option<usize>>,
}

impl ListNode {
    pub const fn new() -> Self {
        Self {
            next: Cell::new(None),
        }
    }

    /// Index of the following node, if any.
    pub fn next(&self) -> Option<usize> {
        self.next.get()
    }

    /// Drops the forward link.
    pub fn reset(&self) {
        self.next.set(None);
    }
}

/// Storage resolving node indices to the nodes embedded in their owners.
pub trait Nodes {
    fn node(&self, index: usize) -> Option<&ListNode>;
}

impl Nodes for [ListNode] {
    fn node(&self, index: usize) -> Option<&ListNode> {
        self.get(index)
    }
}

impl<const N: usize> Nodes for [ListNode; N] {
    fn node(&self, index: usize) -> Option<&ListNode> {
        self.get(index)
    }
}

/// Head, tail and length of a singly-linked list of indices.
///
/// `len()` always equals the number of nodes reachable from the head, and the
/// tail's link is always `None`.
#[derive(Debug, Default)]
pub struct List {
    head: Cell<Option<usize>>,
    tail: Cell<Option<usize>>,
    size: Cell<usize>,
}

impl List {
    pub const fn new() -> Self {
        Self {
            head: Cell::new(None),
            tail: Cell::new(None),
            size: Cell::new(0),
        }
    }

    /// Forgets every node. The nodes' own links are left as they are.
    pub fn init(&self) {
        self.head.set(None);
        self.tail.set(None);
        self.size.set(0);
    }

    pub fn is_empty(&self) -> bool {
        self.head.get().is_none()
    }

    pub fn len(&self) -> usize {
        self.size.get()
    }

    pub fn head(&self) -> Option<usize> {
        self.head.get()
    }

    pub fn tail(&self) -> Option<usize> {
        self.tail.get()
    }

    /// Links `node` in front of the current head. O(1).
    ///
    /// `node` must not be linked into any list already.
    pub fn insert_head<S>(&self, nodes: &S, node: usize)
        where S: Nodes + ?Sized,
    {
        let new = match nodes.node(node) {
            Some(new) => new,
            None => return,
        };
        new.reset();

        match self.head.get() {
            None => {
                self.head.set(Some(node));
                self.tail.set(Some(node));
            }
            Some(head) => {
                new.next.set(Some(head));
                self.head.set(Some(node));
            }
        }

        self.size.set(self.size.get() + 1);
    }

    /// Links `node` after the current tail. O(1).
    ///
    /// `node` must not be linked into any list already.
    pub fn insert_tail<S>(&self, nodes: &S, node: usize)
        where S: Nodes + ?Sized,
    {
        let new = match nodes.node(node) {
            Some(new) => new,
            None => return,
        };
        new.reset();

        match self.tail.get() {
            None => {
                self.head.set(Some(node));
                self.tail.set(Some(node));
            }
            Some(tail) => {
                if let Some(tail) = nodes.node(tail) {
                    tail.next.set(Some(node));
                }
                self.tail.set(Some(node));
            }
        }

        self.size.set(self.size.get() + 1);
    }

    /// Splices `node` in right after `pos`. O(1).
    ///
    /// `pos` has to be a member of this list; only unresolvable indices are
    /// rejected.
    pub fn insert_after<S>(&self, nodes: &S, pos: usize, node: usize)
        where S: Nodes + ?Sized,
    {
        let (at, new) = match (nodes.node(pos), nodes.node(node)) {
            (Some(at), Some(new)) => (at, new),
            _ => return,
        };
        new.reset();

        if self.tail.get() == Some(pos) {
            self.insert_tail(nodes, node);
        } else {
            new.next.set(at.next());
            at.next.set(Some(node));
            self.size.set(self.size.get() + 1);
        }
    }

    /// Unlinks `node`, returning it, or `None` if it is not a member. O(n).
    pub fn remove_node<S>(&self, nodes: &S, node: usize) -> Option<usize>
        where S: Nodes + ?Sized,
    {
        let target = nodes.node(node)?;
        let head = self.head.get()?;

        if head == node {
            self.head.set(target.next());
            if self.tail.get() == Some(node) {
                self.tail.set(None);
            }
        } else {
            let prev = self.predecessor(nodes, head, node)?;
            let at = nodes.node(prev)?;
            at.next.set(target.next());
            if self.tail.get() == Some(node) {
                self.tail.set(Some(prev));
            }
        }

        target.reset();
        self.size.set(self.size.get() - 1);
        Some(node)
    }

    /// Unlinks and returns the head. O(1).
    pub fn remove_head<S>(&self, nodes: &S) -> Option<usize>
        where S: Nodes + ?Sized,
    {
        let head = self.head.get()?;
        let node = nodes.node(head)?;

        if self.tail.get() == Some(head) {
            self.head.set(None);
            self.tail.set(None);
        } else {
            self.head.set(node.next());
        }

        node.reset();
        self.size.set(self.size.get() - 1);
        Some(head)
    }

    /// Unlinks and returns the tail. O(n).
    pub fn remove_tail<S>(&self, nodes: &S) -> Option<usize>
        where S: Nodes + ?Sized,
    {
        let tail = self.tail.get()?;
        let head = self.head.get()?;
        let node = nodes.node(tail)?;

        if head == tail {
            self.head.set(None);
            self.tail.set(None);
        } else {
            let prev = self.predecessor(nodes, head, tail)?;
            if let Some(at) = nodes.node(prev) {
                at.reset();
            }
            self.tail.set(Some(prev));
        }

        node.reset();
        self.size.set(self.size.get() - 1);
        Some(tail)
    }

    /// Walks the list front to back.
    ///
    /// The link out of each node is read before the node is yielded, so the
    /// yielded node may be unlinked without cutting the walk short.
    pub fn iter<'n, S>(&self, nodes: &'n S) -> Iter<'n, S>
        where S: Nodes + ?Sized,
    {
        Iter {
            nodes,
            next: self.head.get(),
        }
    }

    fn predecessor<S>(&self, nodes: &S, head: usize, node: usize) -> Option<usize>
        where S: Nodes + ?Sized,
    {
        let mut prev = head;
        loop {
            match nodes.node(prev)?.next() {
                Some(next) if next == node => return Some(prev),
                Some(next) => prev = next,
                None => return None,
            }
        }
    }
}

pub struct Iter<'n, S>
    where S: Nodes + ?Sized,
{
    nodes: &'n S,
    next: Option<usize>,
}

impl<'n, S> Iterator for Iter<'n, S>
    where S: Nodes + ?Sized,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.nodes.node(current).and_then(ListNode::next);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::{
        List,
        ListNode,
    };

    fn nodes<const N: usize>() -> [ListNode; N] {
        core::array::from_fn(|_| ListNode::new())
    }

    fn order<const N: usize>(list: &List, nodes: &[ListNode; N]) -> Vec<usize> {
        list.iter(nodes).collect()
    }

    /// Every structural invariant of the list, checked against the nodes.
    fn assert_consistent<const N: usize>(list: &List, nodes: &[ListNode; N]) {
        let walked = order(list, nodes);
        assert_eq!(walked.len(), list.len());
        assert_eq!(walked.first().copied(), list.head());
        assert_eq!(walked.last().copied(), list.tail());
        assert_eq!(list.is_empty(), list.len() == 0);
        if let Some(tail) = list.tail() {
            assert_eq!(nodes[tail].next(), None);
        }
    }

    #[test]
    fn empty_list() {
        let nodes = nodes::<2>();
        let list = List::new();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);

        assert_eq!(list.remove_head(&nodes), None);
        assert_eq!(list.remove_tail(&nodes), None);
        assert_eq!(list.remove_node(&nodes, 0), None);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn insert_tail_keeps_order() {
        let nodes = nodes::<4>();
        let list = List::new();

        for i in 0..4 {
            list.insert_tail(&nodes, i);
        }

        assert_eq!(order(&list, &nodes), vec![0, 1, 2, 3]);
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn insert_head_reverses_order() {
        let nodes = nodes::<3>();
        let list = List::new();

        for i in 0..3 {
            list.insert_head(&nodes, i);
        }

        assert_eq!(order(&list, &nodes), vec![2, 1, 0]);
        assert_eq!(list.tail(), Some(0));
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn insert_after_middle_and_tail() {
        let nodes = nodes::<5>();
        let list = List::new();
        list.insert_tail(&nodes, 0);
        list.insert_tail(&nodes, 1);

        list.insert_after(&nodes, 0, 2);
        assert_eq!(order(&list, &nodes), vec![0, 2, 1]);

        list.insert_after(&nodes, 1, 3);
        assert_eq!(order(&list, &nodes), vec![0, 2, 1, 3]);
        assert_eq!(list.tail(), Some(3));
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn unresolved_indices_are_ignored() {
        let nodes = nodes::<2>();
        let list = List::new();

        list.insert_tail(&nodes, 7);
        list.insert_head(&nodes, 7);
        assert!(list.is_empty());

        list.insert_tail(&nodes, 0);
        list.insert_after(&nodes, 0, 9);
        list.insert_after(&nodes, 9, 1);
        assert_eq!(order(&list, &nodes), vec![0]);
        assert_eq!(list.remove_node(&nodes, 9), None);
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn remove_node_reroots_head_and_tail() {
        let nodes = nodes::<4>();
        let list = List::new();
        for i in 0..4 {
            list.insert_tail(&nodes, i);
        }

        assert_eq!(list.remove_node(&nodes, 0), Some(0));
        assert_eq!(list.head(), Some(1));

        assert_eq!(list.remove_node(&nodes, 3), Some(3));
        assert_eq!(list.tail(), Some(2));

        assert_eq!(list.remove_node(&nodes, 1), Some(1));
        assert_eq!(order(&list, &nodes), vec![2]);
        assert_consistent(&list, &nodes);

        assert_eq!(list.remove_node(&nodes, 2), Some(2));
        assert!(list.is_empty());
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn remove_node_not_a_member() {
        let nodes = nodes::<3>();
        let list = List::new();
        list.insert_tail(&nodes, 0);
        list.insert_tail(&nodes, 1);

        assert_eq!(list.remove_node(&nodes, 2), None);
        assert_eq!(list.len(), 2);
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn remove_head_and_tail() {
        let nodes = nodes::<3>();
        let list = List::new();
        for i in 0..3 {
            list.insert_tail(&nodes, i);
        }

        assert_eq!(list.remove_tail(&nodes), Some(2));
        assert_eq!(list.tail(), Some(1));
        assert_eq!(nodes[1].next(), None);

        assert_eq!(list.remove_head(&nodes), Some(0));
        assert_eq!(list.head(), Some(1));

        assert_eq!(list.remove_tail(&nodes), Some(1));
        assert!(list.is_empty());
        assert_eq!(list.remove_head(&nodes), None);
        assert_eq!(list.remove_tail(&nodes), None);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn removed_nodes_can_be_relinked() {
        let nodes = nodes::<3>();
        let list = List::new();
        for i in 0..3 {
            list.insert_tail(&nodes, i);
        }

        list.remove_node(&nodes, 1);
        assert_eq!(nodes[1].next(), None);
        list.insert_head(&nodes, 1);
        assert_eq!(order(&list, &nodes), vec![1, 0, 2]);
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn iter_survives_unlinking_the_yielded_node() {
        let nodes = nodes::<4>();
        let list = List::new();
        for i in 0..4 {
            list.insert_tail(&nodes, i);
        }

        let mut seen = Vec::new();
        for i in list.iter(&nodes) {
            seen.push(i);
            if i % 2 == 0 {
                list.remove_node(&nodes, i);
            }
        }

        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(order(&list, &nodes), vec![1, 3]);
        assert_consistent(&list, &nodes);
    }

    #[test]
    fn init_forgets_everything() {
        let nodes = nodes::<2>();
        let list = List::new();
        list.insert_tail(&nodes, 0);
        list.insert_tail(&nodes, 1);

        list.init();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn slices_are_node_stores() {
        let nodes = nodes::<3>();
        let store: &[ListNode] = &nodes;
        let list = List::new();

        list.insert_tail(store, 0);
        list.insert_tail(store, 2);
        assert_eq!(list.iter(store).collect::<Vec<_>>(), vec![0, 2]);
    }

    /// Random mix of operations, mirrored into a `VecDeque` model.
    #[test]
    fn random_operations_match_model() {
        const COUNT: usize = 8;
        let nodes = nodes::<COUNT>();
        let list = List::new();
        let mut model: VecDeque<usize> = VecDeque::new();

        // xorshift, fixed seed
        let mut state: u32 = 0x2545_f491;
        let mut rand = move |bound: u32| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % bound) as usize
        };

        for _ in 0..2_000 {
            let node = rand(COUNT as u32);
            let linked = model.contains(&node);
            match rand(6) {
                0 if !linked => {
                    list.insert_head(&nodes, node);
                    model.push_front(node);
                }
                1 if !linked => {
                    list.insert_tail(&nodes, node);
                    model.push_back(node);
                }
                2 if !linked && !model.is_empty() => {
                    let at = rand(model.len() as u32);
                    let pos = model[at];
                    list.insert_after(&nodes, pos, node);
                    model.insert(at + 1, node);
                }
                3 => {
                    let expected = if linked {
                        model.retain(|&n| n != node);
                        Some(node)
                    } else {
                        None
                    };
                    assert_eq!(list.remove_node(&nodes, node), expected);
                }
                4 => assert_eq!(list.remove_head(&nodes), model.pop_front()),
                5 => assert_eq!(list.remove_tail(&nodes), model.pop_back()),
                _ => {}
            }

            assert_eq!(order(&list, &nodes), model.iter().copied().collect::<Vec<_>>());
            assert_consistent(&list, &nodes);
        }
    }
}
