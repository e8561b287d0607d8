use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// Lock-free counters updated by producers and the worker.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Submissions ---
  pub(crate) submitted_async: CachePadded<AtomicU64>,
  pub(crate) submitted_sync: CachePadded<AtomicU64>,
  pub(crate) submitted_high: CachePadded<AtomicU64>,

  // --- Worker ---
  pub(crate) dispatched: CachePadded<AtomicU64>,
  pub(crate) completed_sync: CachePadded<AtomicU64>,
  pub(crate) handler_panics: CachePadded<AtomicU64>,

  // --- Cancellation ---
  pub(crate) flushed: CachePadded<AtomicU64>,
  pub(crate) cancelled_sync: CachePadded<AtomicU64>,
  pub(crate) discarded_on_shutdown: CachePadded<AtomicU64>,
  pub(crate) cancel_panics: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      submitted_async: CachePadded::new(AtomicU64::new(0)),
      submitted_sync: CachePadded::new(AtomicU64::new(0)),
      submitted_high: CachePadded::new(AtomicU64::new(0)),
      dispatched: CachePadded::new(AtomicU64::new(0)),
      completed_sync: CachePadded::new(AtomicU64::new(0)),
      handler_panics: CachePadded::new(AtomicU64::new(0)),
      flushed: CachePadded::new(AtomicU64::new(0)),
      cancelled_sync: CachePadded::new(AtomicU64::new(0)),
      discarded_on_shutdown: CachePadded::new(AtomicU64::new(0)),
      cancel_panics: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn add(counter: &AtomicU64, amount: u64) {
    counter.fetch_add(amount, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    MetricsSnapshot {
      submitted_async: self.submitted_async.load(Ordering::Relaxed),
      submitted_sync: self.submitted_sync.load(Ordering::Relaxed),
      submitted_high: self.submitted_high.load(Ordering::Relaxed),
      dispatched: self.dispatched.load(Ordering::Relaxed),
      completed_sync: self.completed_sync.load(Ordering::Relaxed),
      handler_panics: self.handler_panics.load(Ordering::Relaxed),
      flushed: self.flushed.load(Ordering::Relaxed),
      cancelled_sync: self.cancelled_sync.load(Ordering::Relaxed),
      discarded_on_shutdown: self.discarded_on_shutdown.load(Ordering::Relaxed),
      cancel_panics: self.cancel_panics.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time snapshot of a queue's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
  /// Commands submitted fire-and-forget.
  pub submitted_async: u64,
  /// Commands submitted synchronously on the normal lane.
  pub submitted_sync: u64,
  /// Commands submitted synchronously on the high-priority lane.
  pub submitted_high: u64,
  /// Commands handed to the handler.
  pub dispatched: u64,
  /// Synchronous commands whose submitter observed completion.
  pub completed_sync: u64,
  /// Handler invocations that panicked.
  pub handler_panics: u64,
  /// Commands drained from the normal lane by `flush`.
  pub flushed: u64,
  /// Flushed commands that had a blocked synchronous submitter.
  pub cancelled_sync: u64,
  /// Commands still pending when the queue was torn down with
  /// `ShutdownPolicy::Discard`.
  pub discarded_on_shutdown: u64,
  /// Flush callback invocations that panicked.
  pub cancel_panics: u64,
  pub uptime_secs: u64,
}

/// Where the slots of a queue currently are.
///
/// Each count is read under its own lock, one after another, so under
/// concurrent activity the parts may come from slightly different instants.
/// When the queue is quiescent they sum to `capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
  pub capacity: usize,
  pub free: usize,
  pub pending_normal: usize,
  pub pending_high: usize,
  /// Completed synchronous commands not yet claimed by their submitter.
  pub done: usize,
  /// Slots held by producers or by the worker (`capacity` minus the rest).
  pub outstanding: usize,
}

impl QueueStats {
  pub fn pending(&self) -> usize {
    self.pending_normal + self.pending_high
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stats_debug_shows_each_lane() {
    let stats = QueueStats {
      capacity: 4,
      free: 1,
      pending_normal: 2,
      pending_high: 1,
      done: 0,
      outstanding: 0,
    };
    let rendered = format!("{:?}", stats);
    assert!(rendered.contains("pending_normal: 2"));
    assert!(rendered.contains("pending_high: 1"));
    assert_eq!(stats.pending(), 3);
  }
}
