//! The single dispatch thread.
//!
//! The worker sleeps until a pending lane is non-empty or a stop is
//! requested, dequeues one command (high lane first), releases the pending
//! lock and runs the handler. Producers keep submitting while the handler
//! runs. Afterwards the slot goes to Free (async) or Done (sync).

use crate::config::ShutdownPolicy;
use crate::handler::{CommandHandler, CommandInfo, Mode};
use crate::metrics::Metrics;
use crate::shared::{Outcome, Shared};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, debug_span, error, trace};

pub(crate) fn run<P, H>(shared: Arc<Shared<P>>, mut handler: H)
where
  H: CommandHandler<P>,
{
  let span = debug_span!("cmdqueue_worker", queue = %shared.name);
  let _entered = span.enter();
  debug!("worker started");

  while let Some(info) = next_command(&shared) {
    dispatch(&shared, &mut handler, info);
  }

  debug!("worker stopped");
}

/// Blocks until there is something to dispatch. `None` means stop.
fn next_command<P>(shared: &Shared<P>) -> Option<CommandInfo> {
  let mut pending = shared.pending.state.lock();
  loop {
    if pending.stop
      && (shared.shutdown_policy == ShutdownPolicy::Discard || pending.is_empty())
    {
      return None;
    }
    if let Some(info) = pending.pop_next() {
      return Some(info);
    }
    shared.pending.work_ready.wait(&mut pending);
  }
}

fn dispatch<P, H>(shared: &Shared<P>, handler: &mut H, info: CommandInfo)
where
  H: CommandHandler<P>,
{
  Metrics::incr(&shared.metrics.dispatched);
  trace!(%info, "dispatching command");

  // SAFETY: the slot is in flight. It left Pending under the pending lock and
  // nothing else can reach it until it is routed below.
  let payload = unsafe { shared.pool.payload_mut(info.slot) };
  let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(info, payload)));
  if result.is_err() {
    Metrics::incr(&shared.metrics.handler_panics);
    error!(%info, "command handler panicked; treating the command as handled");
  }

  match info.mode {
    Mode::Async => shared.free.release(info.slot),
    Mode::Sync => shared.done.complete(info.slot, Outcome::Completed),
  }
}
