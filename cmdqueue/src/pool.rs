//! The fixed slab of command payloads.
//!
//! The pool is allocated once at construction and never grows or shrinks. It
//! does no bookkeeping of its own: which party may touch a payload is decided
//! entirely by which queue (or which owner) currently holds the slot id.

use std::cell::UnsafeCell;
use std::fmt;

/// Slot ids are `u32`, so a pool can hold at most this many slots.
pub(crate) const MAX_SLOTS: usize = u32::MAX as usize - 1;

/// The identity of one slot in a queue's pool.
///
/// Ids are dense (`0..slot_count`) and stable for the life of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
  #[inline]
  pub(crate) fn new(raw: u32) -> Self {
    SlotId(raw)
  }

  #[inline]
  pub(crate) fn from_index(index: usize) -> Self {
    debug_assert!(index <= MAX_SLOTS);
    SlotId(index as u32)
  }

  /// The position of this slot within the pool.
  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }

  #[inline]
  pub(crate) fn raw(self) -> u32 {
    self.0
  }
}

impl fmt::Display for SlotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "slot#{}", self.0)
  }
}

pub(crate) struct Pool<P> {
  payloads: Box<[UnsafeCell<P>]>,
}

// SAFETY: a payload is only ever reached through `payload`/`payload_mut`,
// whose callers must own the slot exclusively. Ownership changes hands only
// under one of the queue's mutexes, which also orders the memory accesses.
unsafe impl<P: Send> Sync for Pool<P> {}

impl<P> fmt::Debug for Pool<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pool")
      .field("slots", &self.payloads.len())
      .finish_non_exhaustive()
  }
}

impl<P> Pool<P> {
  pub(crate) fn new(count: usize, mut init: impl FnMut(SlotId) -> P) -> Self {
    let payloads = (0..count)
      .map(|index| UnsafeCell::new(init(SlotId::from_index(index))))
      .collect();
    Self { payloads }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.payloads.len()
  }

  /// # Safety
  ///
  /// The caller must exclusively own `id`: it is out of every queue and no
  /// other reference to this payload is live.
  #[inline]
  #[allow(clippy::mut_from_ref)]
  pub(crate) unsafe fn payload_mut(&self, id: SlotId) -> &mut P {
    &mut *self.payloads[id.index()].get()
  }

  /// # Safety
  ///
  /// Same contract as [`Pool::payload_mut`]; no mutable reference may be live.
  #[inline]
  pub(crate) unsafe fn payload(&self, id: SlotId) -> &P {
    &*self.payloads[id.index()].get()
  }
}
