//! State shared between the queue handle, its slot handles and the worker.
//!
//! There is no global lock. Free, Pending and Done are independent lock
//! domains; when an operation needs more than one it always takes them in the
//! order Pending → Free → Done.

use crate::config::ShutdownPolicy;
use crate::handler::{CommandInfo, Lane, Mode};
use crate::list::SlotList;
use crate::metrics::{Metrics, QueueStats};
use crate::pool::{Pool, SlotId};

use std::panic::{self, AssertUnwindSafe};

use parking_lot::{Condvar, Mutex};
use tracing::{error, trace};

// --- Free ---

#[derive(Debug)]
pub(crate) struct FreeQueue {
  pub(crate) list: Mutex<SlotList>,
  slot_freed: Condvar,
}

impl FreeQueue {
  fn new(capacity: usize) -> Self {
    Self {
      list: Mutex::new(SlotList::filled(capacity)),
      slot_freed: Condvar::new(),
    }
  }

  pub(crate) fn try_take(&self) -> Option<SlotId> {
    self.list.lock().pop_front()
  }

  /// Takes a slot, blocking until one is released if the queue is empty.
  pub(crate) fn take(&self) -> SlotId {
    let mut list = self.list.lock();
    loop {
      if let Some(id) = list.pop_front() {
        return id;
      }
      self.slot_freed.wait(&mut list);
    }
  }

  /// Returns a slot to the back of the free queue.
  pub(crate) fn release(&self, id: SlotId) {
    self.list.lock().push_back(id);
    self.slot_freed.notify_one();
  }

  /// Returns a slot to the front, so the next acquisition reuses it while its
  /// payload is still warm.
  pub(crate) fn release_front(&self, id: SlotId) {
    self.list.lock().push_front(id);
    self.slot_freed.notify_one();
  }

  /// Wakes acquirers after a bulk release made under an already-held lock.
  pub(crate) fn notify_released(&self, count: usize) {
    match count {
      0 => {}
      1 => {
        self.slot_freed.notify_one();
      }
      _ => {
        self.slot_freed.notify_all();
      }
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.list.lock().len()
  }
}

// --- Pending ---

#[derive(Debug)]
pub(crate) struct PendingState {
  pub(crate) normal: SlotList,
  pub(crate) high: SlotList,
  /// Mode flag of every slot, written when the slot is scheduled.
  pub(crate) modes: Box<[Mode]>,
  pub(crate) stop: bool,
}

impl PendingState {
  pub(crate) fn is_empty(&self) -> bool {
    self.normal.is_empty() && self.high.is_empty()
  }

  /// Dequeues the next command: the high lane strictly before the normal
  /// lane, FIFO within a lane.
  pub(crate) fn pop_next(&mut self) -> Option<CommandInfo> {
    let (slot, lane) = match self.high.pop_front() {
      Some(id) => (id, Lane::High),
      None => (self.normal.pop_front()?, Lane::Normal),
    };
    Some(CommandInfo {
      slot,
      mode: self.modes[slot.index()],
      lane,
    })
  }
}

#[derive(Debug)]
pub(crate) struct PendingQueue {
  pub(crate) state: Mutex<PendingState>,
  pub(crate) work_ready: Condvar,
}

impl PendingQueue {
  fn new(capacity: usize) -> Self {
    Self {
      state: Mutex::new(PendingState {
        normal: SlotList::new(capacity),
        high: SlotList::new(capacity),
        modes: vec![Mode::Async; capacity].into_boxed_slice(),
        stop: false,
      }),
      work_ready: Condvar::new(),
    }
  }

  pub(crate) fn push(&self, id: SlotId, mode: Mode, lane: Lane) {
    let mut state = self.state.lock();
    state.modes[id.index()] = mode;
    match lane {
      Lane::Normal => state.normal.push_back(id),
      Lane::High => state.high.push_back(id),
    }
    drop(state);
    // Only the worker ever waits here.
    self.work_ready.notify_one();
  }

  pub(crate) fn request_stop(&self) {
    self.state.lock().stop = true;
    self.work_ready.notify_all();
  }
}

// --- Done ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
  Completed,
  Cancelled,
}

#[derive(Debug)]
pub(crate) struct DoneState {
  list: SlotList,
  outcomes: Box<[Outcome]>,
}

/// Completed synchronous slots waiting to be claimed by their submitter.
///
/// Every slot has its own completion signal, so finishing one command wakes
/// exactly the thread that submitted it.
#[derive(Debug)]
pub(crate) struct DoneQueue {
  state: Mutex<DoneState>,
  signals: Box<[Condvar]>,
}

impl DoneQueue {
  fn new(capacity: usize) -> Self {
    Self {
      state: Mutex::new(DoneState {
        list: SlotList::new(capacity),
        outcomes: vec![Outcome::Completed; capacity].into_boxed_slice(),
      }),
      signals: (0..capacity).map(|_| Condvar::new()).collect(),
    }
  }

  pub(crate) fn complete(&self, id: SlotId, outcome: Outcome) {
    let mut state = self.state.lock();
    state.outcomes[id.index()] = outcome;
    state.list.push_back(id);
    drop(state);
    self.signals[id.index()].notify_one();
  }

  /// Blocks until `id` is in the done queue, then unlinks it. The caller
  /// owns the slot again afterwards.
  pub(crate) fn claim(&self, id: SlotId) -> Outcome {
    let mut state = self.state.lock();
    while !state.list.contains(id) {
      self.signals[id.index()].wait(&mut state);
    }
    state.list.remove(id);
    state.outcomes[id.index()]
  }

  pub(crate) fn len(&self) -> usize {
    self.state.lock().list.len()
  }
}

// --- Shared ---

#[derive(Debug)]
pub(crate) struct Shared<P> {
  pub(crate) name: String,
  pub(crate) pool: Pool<P>,
  pub(crate) free: FreeQueue,
  pub(crate) pending: PendingQueue,
  pub(crate) done: DoneQueue,
  pub(crate) metrics: Metrics,
  pub(crate) shutdown_policy: ShutdownPolicy,
}

impl<P> Shared<P> {
  pub(crate) fn new(name: String, pool: Pool<P>, shutdown_policy: ShutdownPolicy) -> Self {
    let capacity = pool.len();
    Self {
      name,
      pool,
      free: FreeQueue::new(capacity),
      pending: PendingQueue::new(capacity),
      done: DoneQueue::new(capacity),
      metrics: Metrics::new(),
      shutdown_policy,
    }
  }

  pub(crate) fn capacity(&self) -> usize {
    self.pool.len()
  }

  /// Drains the normal lane without dispatching anything.
  ///
  /// Holds the Pending and Free locks for the whole drain, so `cancel` must
  /// not call back into the queue. Asynchronous slots go straight to Free;
  /// synchronous ones are handed back to their blocked submitter as
  /// cancelled. A panicking `cancel` does not stop the drain and the slot is
  /// still routed.
  pub(crate) fn flush(&self, cancel: &mut dyn FnMut(CommandInfo, &mut P)) -> usize {
    let mut pending = self.pending.state.lock();
    let mut free = self.free.list.lock();

    let mut drained = 0;
    let mut released = 0;
    while let Some(slot) = pending.normal.pop_front() {
      let info = CommandInfo {
        slot,
        mode: pending.modes[slot.index()],
        lane: Lane::Normal,
      };
      // SAFETY: the slot just left the pending lane under its lock and has
      // not been routed anywhere else yet.
      let payload = unsafe { self.pool.payload_mut(slot) };
      if panic::catch_unwind(AssertUnwindSafe(|| cancel(info, payload))).is_err() {
        Metrics::incr(&self.metrics.cancel_panics);
        error!(queue = %self.name, %info, "flush callback panicked; routing the command as cancelled");
      }
      trace!(queue = %self.name, %info, "flushed command");

      match info.mode {
        Mode::Async => {
          free.push_back(slot);
          released += 1;
        }
        Mode::Sync => {
          Metrics::incr(&self.metrics.cancelled_sync);
          self.done.complete(slot, Outcome::Cancelled);
        }
      }
      drained += 1;
    }

    drop(free);
    drop(pending);
    self.free.notify_released(released);
    Metrics::add(&self.metrics.flushed, drained as u64);
    drained
  }

  /// Returns every still-pending slot to Free. Only called once the worker
  /// has been joined.
  pub(crate) fn reclaim_pending(&self) -> usize {
    let mut pending = self.pending.state.lock();
    let mut free = self.free.list.lock();

    let mut reclaimed = 0;
    while let Some(info) = pending.pop_next() {
      debug_assert_eq!(info.mode, Mode::Async, "sync submitter outlived its queue");
      free.push_back(info.slot);
      reclaimed += 1;
    }

    drop(free);
    drop(pending);
    self.free.notify_released(reclaimed);
    reclaimed
  }

  pub(crate) fn stats(&self) -> QueueStats {
    let capacity = self.capacity();
    let (pending_normal, pending_high) = {
      let pending = self.pending.state.lock();
      (pending.normal.len(), pending.high.len())
    };
    let free = self.free.len();
    let done = self.done.len();
    let settled = free + pending_normal + pending_high + done;

    QueueStats {
      capacity,
      free,
      pending_normal,
      pending_high,
      done,
      outstanding: capacity.saturating_sub(settled),
    }
  }
}
