use std::fmt;

use crate::pool::SlotId;

/// How a command was submitted, and therefore where its slot goes after the
/// handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
  /// Fire-and-forget. The slot returns to the free queue as soon as the
  /// handler returns; the submitter never hears about it again.
  Async,
  /// The submitter blocks until the handler has run and then recycles the
  /// slot itself.
  Sync,
}

/// The pending sub-queue a command was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
  Normal,
  /// Always drained before the normal lane. There is no aging, so a steady
  /// stream of high-priority work starves the normal lane.
  High,
}

/// The generic header of a dispatched (or flushed) command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
  pub slot: SlotId,
  pub mode: Mode,
  pub lane: Lane,
}

impl fmt::Display for CommandInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({:?}, {:?} lane)", self.slot, self.mode, self.lane)
  }
}

/// Executes commands on the queue's worker thread.
///
/// `handle` is called exactly once per dispatched slot, always on the worker
/// thread, one command at a time. A handler that stalls stalls the whole
/// queue. Results travel back through `payload`: a synchronous submitter can
/// read it before its submit call returns (see `CmdQueue::submit_sync_with`).
///
/// Any `FnMut(CommandInfo, &mut P) + Send + 'static` closure is a handler; its
/// captures play the role of the callback cookie.
pub trait CommandHandler<P>: Send + 'static {
  fn handle(&mut self, info: CommandInfo, payload: &mut P);
}

impl<P, F> CommandHandler<P> for F
where
  F: FnMut(CommandInfo, &mut P) + Send + 'static,
{
  #[inline]
  fn handle(&mut self, info: CommandInfo, payload: &mut P) {
    self(info, payload)
  }
}
