//! An index-linked, doubly-linked list over the slots of a fixed pool.
//!
//! Each lock domain owns one (or two) of these. Links live in a boxed slice
//! indexed by slot id, so membership changes never allocate and every
//! operation is O(1). A slot is linked into at most one list per domain.

use std::fmt;

use crate::pool::SlotId;

#[derive(Debug, Clone, Copy, Default)]
struct Link {
  prev: Option<u32>,
  next: Option<u32>,
  linked: bool,
}

pub(crate) struct SlotList {
  links: Box<[Link]>,
  head: Option<u32>,
  tail: Option<u32>,
  len: usize,
}

impl fmt::Debug for SlotList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SlotList")
      .field("len", &self.len)
      .field("head", &self.head)
      .field("tail", &self.tail)
      .finish()
  }
}

impl SlotList {
  /// Creates an empty list able to link slot ids `0..capacity`.
  pub(crate) fn new(capacity: usize) -> Self {
    Self {
      links: vec![Link::default(); capacity].into_boxed_slice(),
      head: None,
      tail: None,
      len: 0,
    }
  }

  /// Creates a list holding every slot id `0..capacity` in ascending order.
  pub(crate) fn filled(capacity: usize) -> Self {
    let mut list = Self::new(capacity);
    for index in 0..capacity {
      list.push_back(SlotId::from_index(index));
    }
    list
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.len
  }

  #[inline(always)]
  pub(crate) fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub(crate) fn contains(&self, id: SlotId) -> bool {
    self.links[id.index()].linked
  }

  pub(crate) fn front(&self) -> Option<SlotId> {
    self.head.map(SlotId::new)
  }

  pub(crate) fn push_back(&mut self, id: SlotId) {
    let raw = id.raw();
    debug_assert!(!self.contains(id), "slot {} is already linked", raw);

    let old_tail = self.tail;
    self.links[id.index()] = Link {
      prev: old_tail,
      next: None,
      linked: true,
    };
    match old_tail {
      Some(tail) => self.links[tail as usize].next = Some(raw),
      None => self.head = Some(raw),
    }
    self.tail = Some(raw);
    self.len += 1;
  }

  pub(crate) fn push_front(&mut self, id: SlotId) {
    let raw = id.raw();
    debug_assert!(!self.contains(id), "slot {} is already linked", raw);

    let old_head = self.head;
    self.links[id.index()] = Link {
      prev: None,
      next: old_head,
      linked: true,
    };
    match old_head {
      Some(head) => self.links[head as usize].prev = Some(raw),
      None => self.tail = Some(raw),
    }
    self.head = Some(raw);
    self.len += 1;
  }

  pub(crate) fn pop_front(&mut self) -> Option<SlotId> {
    let id = self.front()?;
    self.unlink(id);
    Some(id)
  }

  /// Unlinks `id` if it is a member. Returns whether it was.
  pub(crate) fn remove(&mut self, id: SlotId) -> bool {
    if !self.contains(id) {
      return false;
    }
    self.unlink(id);
    true
  }

  fn unlink(&mut self, id: SlotId) {
    let Link { prev, next, .. } = self.links[id.index()];

    match prev {
      Some(prev) => self.links[prev as usize].next = next,
      None => self.head = next,
    }
    match next {
      Some(next) => self.links[next as usize].prev = prev,
      None => self.tail = prev,
    }

    self.links[id.index()] = Link::default();
    self.len -= 1;
  }

  /// Iterates members front to back without unlinking them.
  #[cfg(test)]
  pub(crate) fn iter(&self) -> Iter<'_> {
    Iter {
      list: self,
      cursor: self.head,
    }
  }
}

#[cfg(test)]
pub(crate) struct Iter<'a> {
  list: &'a SlotList,
  cursor: Option<u32>,
}

#[cfg(test)]
impl Iterator for Iter<'_> {
  type Item = SlotId;

  fn next(&mut self) -> Option<SlotId> {
    let raw = self.cursor?;
    self.cursor = self.list.links[raw as usize].next;
    Some(SlotId::new(raw))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(list: &SlotList) -> Vec<usize> {
    list.iter().map(SlotId::index).collect()
  }

  #[test]
  fn filled_list_is_in_index_order() {
    let list = SlotList::filled(4);
    assert_eq!(list.len(), 4);
    assert_eq!(ids(&list), vec![0, 1, 2, 3]);
  }

  #[test]
  fn push_back_pop_front_is_fifo() {
    let mut list = SlotList::new(4);
    list.push_back(SlotId::from_index(2));
    list.push_back(SlotId::from_index(0));
    list.push_back(SlotId::from_index(3));

    assert_eq!(list.pop_front(), Some(SlotId::from_index(2)));
    assert_eq!(list.pop_front(), Some(SlotId::from_index(0)));
    assert_eq!(list.pop_front(), Some(SlotId::from_index(3)));
    assert_eq!(list.pop_front(), None);
    assert!(list.is_empty());
  }

  #[test]
  fn push_front_goes_ahead_of_existing_members() {
    let mut list = SlotList::new(3);
    list.push_back(SlotId::from_index(0));
    list.push_front(SlotId::from_index(1));
    assert_eq!(ids(&list), vec![1, 0]);

    let mut empty = SlotList::new(3);
    empty.push_front(SlotId::from_index(2));
    assert_eq!(empty.front(), Some(SlotId::from_index(2)));
    assert_eq!(empty.pop_front(), Some(SlotId::from_index(2)));
    assert!(empty.is_empty());
  }

  #[test]
  fn remove_head_middle_and_tail() {
    let mut list = SlotList::filled(5);

    assert!(list.remove(SlotId::from_index(2)));
    assert_eq!(ids(&list), vec![0, 1, 3, 4]);

    assert!(list.remove(SlotId::from_index(0)));
    assert_eq!(ids(&list), vec![1, 3, 4]);

    assert!(list.remove(SlotId::from_index(4)));
    assert_eq!(ids(&list), vec![1, 3]);
    assert_eq!(list.len(), 2);

    // Removing a non-member is a no-op.
    assert!(!list.remove(SlotId::from_index(4)));
    assert_eq!(list.len(), 2);
  }

  #[test]
  fn contains_tracks_membership() {
    let mut list = SlotList::new(2);
    let id = SlotId::from_index(1);
    assert!(!list.contains(id));
    list.push_back(id);
    assert!(list.contains(id));
    list.pop_front();
    assert!(!list.contains(id));

    // A slot can be relinked after leaving.
    list.push_back(id);
    assert_eq!(list.len(), 1);
  }
}
