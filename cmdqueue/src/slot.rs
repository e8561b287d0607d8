use crate::pool::SlotId;
use crate::shared::Shared;

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};

/// Exclusive access to one acquired slot of a [`CmdQueue`](crate::CmdQueue).
///
/// Fill the payload through `DerefMut`, then hand the slot to one of the
/// queue's submit methods, which consume it. A slot can therefore be
/// submitted at most once per acquisition. Dropping an unsubmitted slot
/// returns it to the free queue.
///
/// Payloads are not reset between uses; a freshly acquired slot holds
/// whatever the previous command left in it.
pub struct CmdSlot<'q, P> {
  shared: &'q Shared<P>,
  id: SlotId,
  _payload: PhantomData<&'q mut P>,
}

impl<'q, P> CmdSlot<'q, P> {
  /// The caller must exclusively own `id`.
  pub(crate) fn new(shared: &'q Shared<P>, id: SlotId) -> Self {
    Self {
      shared,
      id,
      _payload: PhantomData,
    }
  }

  /// The pool position of this slot.
  pub fn id(&self) -> SlotId {
    self.id
  }

  pub(crate) fn belongs_to(&self, shared: &Shared<P>) -> bool {
    std::ptr::eq(self.shared, shared)
  }

  /// Gives up the handle without returning the slot to Free. The caller takes
  /// over responsibility for routing it.
  pub(crate) fn into_id(self) -> SlotId {
    let id = self.id;
    mem::forget(self);
    id
  }
}

impl<P> Deref for CmdSlot<'_, P> {
  type Target = P;

  fn deref(&self) -> &P {
    // SAFETY: a live `CmdSlot` is the slot's only owner.
    unsafe { self.shared.pool.payload(self.id) }
  }
}

impl<P> DerefMut for CmdSlot<'_, P> {
  fn deref_mut(&mut self) -> &mut P {
    // SAFETY: as above, and `&mut self` rules out other borrows of the handle.
    unsafe { self.shared.pool.payload_mut(self.id) }
  }
}

impl<P> Drop for CmdSlot<'_, P> {
  fn drop(&mut self) {
    self.shared.free.release_front(self.id);
  }
}

impl<P: fmt::Debug> fmt::Debug for CmdSlot<'_, P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CmdSlot")
      .field("queue", &self.shared.name)
      .field("id", &self.id)
      .field("payload", &**self)
      .finish()
  }
}
