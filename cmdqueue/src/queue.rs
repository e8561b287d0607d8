use crate::builder::CmdQueueBuilder;
use crate::error::{BuildError, SubmitError};
use crate::handler::{CommandHandler, CommandInfo, Lane, Mode};
use crate::metrics::{Metrics, MetricsSnapshot, QueueStats};
use crate::pool::SlotId;
use crate::shared::{Outcome, Shared};
use crate::slot::CmdSlot;
use crate::worker;

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace, warn};

/// A command dispatch queue with a fixed pool of slots and one worker thread.
///
/// Producers [`acquire`](CmdQueue::acquire) a slot, fill in its payload and
/// submit it. The worker runs the queue's [`CommandHandler`] on each
/// submitted slot, high-priority lane first, FIFO within a lane.
///
/// `CmdQueue` is `Sync`; share it between producer threads by reference
/// (e.g. `std::thread::scope`) or inside an `Arc`. Every slot handle borrows
/// the queue, so the queue cannot be torn down while a producer still holds a
/// slot or waits on a synchronous submission.
///
/// Dropping the queue stops the worker and joins it; see
/// [`ShutdownPolicy`](crate::ShutdownPolicy) for what happens to commands
/// that are still pending at that point.
pub struct CmdQueue<P: Send + 'static> {
  shared: Arc<Shared<P>>,
  worker: Option<JoinHandle<()>>,
}

impl<P: Send + 'static> fmt::Debug for CmdQueue<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CmdQueue")
      .field("name", &self.shared.name)
      .field("stats", &self.shared.stats())
      .field("running", &self.worker.is_some())
      .finish()
  }
}

impl<P: Send + 'static> CmdQueue<P> {
  /// Starts configuring a new queue.
  pub fn builder(name: impl Into<String>) -> CmdQueueBuilder<P> {
    CmdQueueBuilder::new(name)
  }

  /// Creates a queue with `slot_count` default-initialized slots and starts
  /// its worker thread.
  pub fn new<H>(name: impl Into<String>, slot_count: usize, handler: H) -> Result<Self, BuildError>
  where
    P: Default,
    H: CommandHandler<P>,
  {
    Self::builder(name).slots(slot_count).build(handler)
  }

  pub(crate) fn launch<H>(shared: Shared<P>, handler: H, stack_size: Option<usize>) -> Result<Self, BuildError>
  where
    H: CommandHandler<P>,
  {
    let shared = Arc::new(shared);
    let worker_shared = Arc::clone(&shared);

    let mut builder = thread::Builder::new().name(shared.name.clone());
    if let Some(bytes) = stack_size {
      builder = builder.stack_size(bytes);
    }
    let handle = builder.spawn(move || worker::run(worker_shared, handler))?;

    debug!(
      queue = %shared.name,
      slots = shared.capacity(),
      shutdown_policy = ?shared.shutdown_policy,
      "command queue started"
    );

    Ok(Self {
      shared,
      worker: Some(handle),
    })
  }

  pub fn name(&self) -> &str {
    &self.shared.name
  }

  /// The number of slots in the pool.
  pub fn capacity(&self) -> usize {
    self.shared.capacity()
  }

  // --- Acquisition ---

  /// Takes a free slot, blocking until one is released if the pool is
  /// exhausted. Never fails.
  pub fn acquire(&self) -> CmdSlot<'_, P> {
    let id = self.shared.free.take();
    CmdSlot::new(&self.shared, id)
  }

  /// Takes a free slot if one is available right now.
  pub fn try_acquire(&self) -> Option<CmdSlot<'_, P>> {
    let id = self.shared.free.try_take()?;
    Some(CmdSlot::new(&self.shared, id))
  }

  // --- Submission ---

  /// Schedules `slot` on the normal lane and returns immediately.
  ///
  /// No completion signal is ever delivered; the worker recycles the slot
  /// right after the handler returns.
  pub fn submit_async(&self, slot: CmdSlot<'_, P>) {
    Metrics::incr(&self.shared.metrics.submitted_async);
    self.schedule(slot, Mode::Async, Lane::Normal);
  }

  /// Schedules `slot` on the normal lane and blocks until the handler has
  /// run on it. The slot is back in the free queue when this returns.
  ///
  /// Fails only if a [`flush`](CmdQueue::flush) cancelled the command before
  /// the worker reached it.
  pub fn submit_sync(&self, slot: CmdSlot<'_, P>) -> Result<(), SubmitError> {
    self.submit_sync_with(slot, |_| ())
  }

  /// Like [`submit_sync`](CmdQueue::submit_sync), and additionally runs
  /// `inspect` on the payload after the handler finished but before the slot
  /// is recycled. This is the only window in which the submitter can read
  /// what the handler left in the payload.
  pub fn submit_sync_with<R>(
    &self,
    slot: CmdSlot<'_, P>,
    inspect: impl FnOnce(&P) -> R,
  ) -> Result<R, SubmitError> {
    Metrics::incr(&self.shared.metrics.submitted_sync);
    let id = self.schedule(slot, Mode::Sync, Lane::Normal);
    self.wait_for(id, inspect)
  }

  /// Like [`submit_sync`](CmdQueue::submit_sync), but on the high-priority
  /// lane: the command is dispatched ahead of every normal-lane command not
  /// yet picked up by the worker.
  ///
  /// Flush never touches the high lane, so this cannot be cancelled.
  pub fn submit_sync_high_priority(&self, slot: CmdSlot<'_, P>) {
    self.submit_sync_high_priority_with(slot, |_| ())
  }

  /// High-priority counterpart of
  /// [`submit_sync_with`](CmdQueue::submit_sync_with).
  pub fn submit_sync_high_priority_with<R>(&self, slot: CmdSlot<'_, P>, inspect: impl FnOnce(&P) -> R) -> R {
    Metrics::incr(&self.shared.metrics.submitted_high);
    let id = self.schedule(slot, Mode::Sync, Lane::High);
    match self.wait_for(id, inspect) {
      Ok(value) => value,
      Err(SubmitError::Cancelled) => unreachable!("high-priority commands are never flushed"),
    }
  }

  fn schedule(&self, slot: CmdSlot<'_, P>, mode: Mode, lane: Lane) -> SlotId {
    assert!(
      slot.belongs_to(&self.shared),
      "slot submitted to a command queue it was not acquired from"
    );
    let id = slot.into_id();
    trace!(queue = %self.shared.name, slot = %id, ?mode, ?lane, "submitting command");
    self.shared.pending.push(id, mode, lane);
    id
  }

  /// Waits for our own slot to show up in Done, claims it, and recycles it.
  fn wait_for<R>(&self, id: SlotId, inspect: impl FnOnce(&P) -> R) -> Result<R, SubmitError> {
    let outcome = self.shared.done.claim(id);
    // Owning the slot again; the handle puts it back on Free when dropped,
    // even if `inspect` panics.
    let slot = CmdSlot::new(&*self.shared, id);
    match outcome {
      Outcome::Completed => {
        Metrics::incr(&self.shared.metrics.completed_sync);
        Ok(inspect(&*slot))
      }
      Outcome::Cancelled => Err(SubmitError::Cancelled),
    }
  }

  // --- Cancellation ---

  /// Drains every command from the normal pending lane without dispatching
  /// it, calling `cancel` on each in FIFO order. Returns how many were
  /// drained.
  ///
  /// The high-priority lane and the command currently running are left
  /// alone. Asynchronous slots are returned to the free queue directly.
  /// Synchronous slots are handed back to their blocked submitter, whose
  /// `submit_sync*` call returns [`SubmitError::Cancelled`].
  ///
  /// `cancel` runs while internal locks are held and must not call back into
  /// this queue.
  pub fn flush<F>(&self, mut cancel: F) -> usize
  where
    F: FnMut(CommandInfo, &mut P),
  {
    let drained = self.shared.flush(&mut cancel);
    debug!(queue = %self.shared.name, drained, "flushed normal lane");
    drained
  }

  // --- Introspection ---

  /// Where the slots currently are.
  pub fn stats(&self) -> QueueStats {
    self.shared.stats()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  // --- Teardown ---

  /// Stops the worker, waits for it to exit and returns the final counters.
  ///
  /// Equivalent to dropping the queue, but hands back the metrics.
  pub fn shutdown(mut self) -> MetricsSnapshot {
    self.stop_worker();
    self.shared.metrics.snapshot()
  }

  fn stop_worker(&mut self) {
    let Some(handle) = self.worker.take() else {
      return;
    };

    self.shared.pending.request_stop();
    if handle.join().is_err() {
      error!(queue = %self.shared.name, "command queue worker exited with a panic");
    }

    let discarded = self.shared.reclaim_pending();
    if discarded > 0 {
      Metrics::add(&self.shared.metrics.discarded_on_shutdown, discarded as u64);
      warn!(queue = %self.shared.name, discarded, "discarded pending commands at shutdown");
    }
    debug!(queue = %self.shared.name, "command queue stopped");
  }
}

impl<P: Send + 'static> Drop for CmdQueue<P> {
  fn drop(&mut self) {
    self.stop_worker();
  }
}
