//! Intrusive recency list keyed by [`TextureId`].

use crate::texture::TextureId;

#[derive(Clone, Copy, Debug, Default)]
struct Link {
    prev: Option<TextureId>,
    next: Option<TextureId>,
}

/// Doubly linked list threaded through a slot vector indexed by texture id.
///
/// Front is most recently used, back is the eviction candidate. Every
/// operation is O(1); the slot vector grows to the largest id ever inserted.
#[derive(Debug, Default)]
pub struct LruList {
    slots: Vec<Option<Link>>,
    head: Option<TextureId>,
    tail: Option<TextureId>,
    len: usize,
}

impl LruList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: TextureId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Insert `id` as most recently used. Moves it there if already present.
    pub fn push_front(&mut self, id: TextureId) {
        if self.contains(id) {
            self.move_to_front(id);
            return;
        }
        if self.slots.len() <= id.index() {
            self.slots.resize(id.index() + 1, None);
        }
        self.slots[id.index()] = Some(Link {
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(old) => self.link_mut(old).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    /// Splice `id` to the front. Returns `false` if it is not in the list.
    pub fn move_to_front(&mut self, id: TextureId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.head != Some(id) {
            self.unlink(id);
            self.push_front(id);
        }
        true
    }

    /// Remove and return the least recently used id.
    pub fn pop_back(&mut self) -> Option<TextureId> {
        let tail = self.tail?;
        self.unlink(tail);
        Some(tail)
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = TextureId> + '_ {
        std::iter::successors(self.head, move |id| self.link(*id).next)
    }

    fn link(&self, id: TextureId) -> Link {
        self.slots[id.index()].unwrap_or_default()
    }

    fn link_mut(&mut self, id: TextureId) -> &mut Link {
        self.slots[id.index()].get_or_insert_with(Link::default)
    }

    fn unlink(&mut self, id: TextureId) {
        let Some(link) = self.slots[id.index()].take() else {
            return;
        };
        match link.prev {
            Some(prev) => self.link_mut(prev).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => self.link_mut(next).prev = link.prev,
            None => self.tail = link.prev,
        }
        self.len -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &LruList) -> Vec<u32> {
        list.iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_push_front_orders_by_recency() {
        let mut list = LruList::new();
        for i in 0..3 {
            list.push_front(TextureId(i));
        }
        assert_eq!(ids(&list), vec![2, 1, 0]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_move_to_front_from_middle_and_tail() {
        let mut list = LruList::new();
        for i in 0..4 {
            list.push_front(TextureId(i));
        }
        assert!(list.move_to_front(TextureId(2)));
        assert_eq!(ids(&list), vec![2, 3, 1, 0]);
        assert!(list.move_to_front(TextureId(0)));
        assert_eq!(ids(&list), vec![0, 2, 3, 1]);
        assert!(!list.move_to_front(TextureId(9)));
    }

    #[test]
    fn test_pop_back_returns_least_recent() {
        let mut list = LruList::new();
        list.push_front(TextureId(5));
        list.push_front(TextureId(7));
        assert_eq!(list.pop_back(), Some(TextureId(5)));
        assert_eq!(list.pop_back(), Some(TextureId(7)));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_splice_then_pop_keeps_links_consistent() {
        let mut list = LruList::new();
        for i in 0..3 {
            list.push_front(TextureId(i));
        }
        assert!(list.move_to_front(TextureId(1)));
        assert_eq!(ids(&list), vec![1, 2, 0]);
        assert_eq!(list.pop_back(), Some(TextureId(0)));
        assert_eq!(list.pop_back(), Some(TextureId(2)));
        assert_eq!(ids(&list), vec![1]);
        list.push_front(TextureId(0));
        assert_eq!(ids(&list), vec![0, 1]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_duplicate_push_does_not_grow() {
        let mut list = LruList::new();
        list.push_front(TextureId(0));
        list.push_front(TextureId(1));
        list.push_front(TextureId(0));
        assert_eq!(list.len(), 2);
        assert_eq!(ids(&list), vec![0, 1]);
    }
}
