//! LRU Index Module
//!
//! Recency ordering over live keys for eviction.
//!
//! Nodes live in a slot arena and link to each other by slot index, so an
//! unlinked node can never leave a dangling reference behind. All mutating
//! operations are O(1).

// == Node Handle ==
/// Opaque identity of a node in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU List ==
/// Doubly-linked recency list.
///
/// - Head = most recently used
/// - Tail = least recently used
#[derive(Debug, Default)]
pub struct LruList {
    /// Arena of nodes, `None` marks a vacant slot
    slots: Vec<Option<Node>>,
    /// Vacant slots available for reuse
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl LruList {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert Front ==
    /// Adds a key as the most recently used entry.
    pub fn insert_front(&mut self, key: String) -> NodeHandle {
        let node = Node {
            key,
            prev: None,
            next: self.head,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(old_head) => self.node_mut(old_head).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;

        NodeHandle(idx)
    }

    // == Touch ==
    /// Marks a node as recently used (moves to front).
    pub fn touch(&mut self, handle: NodeHandle) {
        let idx = handle.0;
        if self.head == Some(idx) || !self.is_live(idx) {
            return;
        }

        self.unlink(idx);

        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    // == Remove ==
    /// Removes a node, returning its key. Vacated handles are ignored.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<String> {
        let idx = handle.0;
        if !self.is_live(idx) {
            return None;
        }

        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(node.key)
    }

    // == Remove Tail ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the list is empty.
    pub fn remove_tail(&mut self) -> Option<String> {
        let tail = self.tail?;
        self.remove(NodeHandle(tail))
    }

    // == Peek Tail ==
    /// Returns the least recently used key without removing it.
    pub fn peek_tail(&self) -> Option<&str> {
        self.tail
            .and_then(|idx| self.slots[idx].as_ref())
            .map(|node| node.key.as_str())
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Key behind a handle, if the node is still linked.
    pub fn key(&self, handle: NodeHandle) -> Option<&str> {
        self.slots
            .get(handle.0)
            .and_then(|slot| slot.as_ref())
            .map(|node| node.key.as_str())
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let mut current = self.head;
        std::iter::from_fn(move || {
            let idx = current?;
            let node = self.slots[idx].as_ref()?;
            current = node.next;
            Some(node.key.as_str())
        })
    }

    /// Walks the chain in both directions and checks every link.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        if self.head.is_none() != self.tail.is_none() || self.head.is_none() != (self.len == 0) {
            return false;
        }

        let mut forward = Vec::new();
        let mut prev = None;
        let mut current = self.head;
        while let Some(idx) = current {
            let Some(node) = self.slots[idx].as_ref() else {
                return false;
            };
            if node.prev != prev || forward.len() > self.len {
                return false;
            }
            forward.push(idx);
            prev = Some(idx);
            current = node.next;
        }
        if prev != self.tail || forward.len() != self.len {
            return false;
        }

        let mut backward = Vec::new();
        let mut current = self.tail;
        while let Some(idx) = current {
            backward.push(idx);
            current = self.slots[idx].as_ref().and_then(|n| n.prev);
            if backward.len() > self.len {
                return false;
            }
        }
        backward.reverse();

        let live = self.slots.iter().filter(|s| s.is_some()).count();
        forward == backward && live == self.len
    }

    // == Internal linked-list operations ==

    fn is_live(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Some(_)))
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        match self.slots[idx].as_mut() {
            Some(node) => node,
            None => unreachable!("linked slot {} is vacant", idx),
        }
    }

    /// Detaches a node from its neighbours, repairing head and tail.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(lru: &LruList) -> Vec<&str> {
        lru.keys().collect()
    }

    #[test]
    fn test_lru_new() {
        let lru = LruList::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_insert_front_orders_by_recency() {
        let mut lru = LruList::new();

        lru.insert_front("key1".to_string());
        lru.insert_front("key2".to_string());
        lru.insert_front("key3".to_string());

        assert_eq!(lru.len(), 3);
        assert_eq!(order(&lru), vec!["key3", "key2", "key1"]);
        assert_eq!(lru.peek_tail(), Some("key1"));
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_touch_moves_to_front() {
        let mut lru = LruList::new();

        let a = lru.insert_front("a".to_string());
        lru.insert_front("b".to_string());
        lru.insert_front("c".to_string());

        lru.touch(a);

        assert_eq!(order(&lru), vec!["a", "c", "b"]);
        assert_eq!(lru.peek_tail(), Some("b"));
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_touch_head_is_noop() {
        let mut lru = LruList::new();

        lru.insert_front("a".to_string());
        let b = lru.insert_front("b".to_string());

        lru.touch(b);
        assert_eq!(order(&lru), vec!["b", "a"]);
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_touch_tail_updates_tail() {
        let mut lru = LruList::new();

        let a = lru.insert_front("a".to_string());
        lru.insert_front("b".to_string());

        lru.touch(a);
        assert_eq!(lru.peek_tail(), Some("b"));
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_remove_middle_head_and_tail() {
        let mut lru = LruList::new();

        let a = lru.insert_front("a".to_string());
        let b = lru.insert_front("b".to_string());
        let c = lru.insert_front("c".to_string());

        assert_eq!(lru.remove(b), Some("b".to_string()));
        assert_eq!(order(&lru), vec!["c", "a"]);
        assert!(lru.is_consistent());

        assert_eq!(lru.remove(c), Some("c".to_string()));
        assert_eq!(order(&lru), vec!["a"]);
        assert!(lru.is_consistent());

        assert_eq!(lru.remove(a), Some("a".to_string()));
        assert!(lru.is_empty());
        assert_eq!(lru.peek_tail(), None);
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_remove_vacated_handle_is_noop() {
        let mut lru = LruList::new();

        let a = lru.insert_front("a".to_string());
        lru.insert_front("b".to_string());

        assert!(lru.remove(a).is_some());
        assert!(lru.remove(a).is_none());
        lru.touch(a);

        assert_eq!(order(&lru), vec!["b"]);
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_remove_tail() {
        let mut lru = LruList::new();

        lru.insert_front("key1".to_string());
        lru.insert_front("key2".to_string());
        lru.insert_front("key3".to_string());

        assert_eq!(lru.remove_tail(), Some("key1".to_string()));
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.remove_tail(), Some("key2".to_string()));
        assert_eq!(lru.remove_tail(), Some("key3".to_string()));
        assert_eq!(lru.remove_tail(), None);
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_slots_are_reused() {
        let mut lru = LruList::new();

        let a = lru.insert_front("a".to_string());
        lru.remove(a);
        let b = lru.insert_front("b".to_string());

        assert_eq!(a, b);
        assert_eq!(lru.key(b), Some("b"));
        assert!(lru.is_consistent());
    }

    #[test]
    fn test_clear() {
        let mut lru = LruList::new();

        lru.insert_front("a".to_string());
        lru.insert_front("b".to_string());
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.remove_tail(), None);
        assert!(lru.is_consistent());

        lru.insert_front("c".to_string());
        assert_eq!(order(&lru), vec!["c"]);
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let mut lru = LruList::new();

        let a = lru.insert_front("a".to_string());
        let b = lru.insert_front("b".to_string());
        let c = lru.insert_front("c".to_string());

        lru.touch(a);
        lru.touch(c);
        lru.touch(b);

        // front=[b, c, a]=back
        assert_eq!(lru.remove_tail(), Some("a".to_string()));
        assert_eq!(lru.remove_tail(), Some("c".to_string()));
        assert_eq!(lru.remove_tail(), Some("b".to_string()));
    }
}
