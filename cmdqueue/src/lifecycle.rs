//! A small service-lifecycle adapter on top of [`CmdQueue`].
//!
//! `LifecycleQueue` maps four domain commands onto a single-slot command
//! queue and runs them synchronously on its worker thread. Handler-side
//! effects are reported to an optional [`LifecycleListener`], so callers hear
//! about `Started`/`Stopped` on the worker thread rather than through the
//! queue itself.
//!
//! ```
//! use fibre_cmdqueue::lifecycle::{LifecycleEvent, LifecycleQueue};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let service = LifecycleQueue::with_listener(move |event: LifecycleEvent| {
//!   sink.lock().unwrap().push(event);
//! })
//! .unwrap();
//!
//! service.start();
//! service.stop();
//! service.deinit();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![LifecycleEvent::Started, LifecycleEvent::Stopped]);
//! ```

use crate::error::BuildError;
use crate::handler::{CommandHandler, CommandInfo};
use crate::queue::CmdQueue;

use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

const LIFECYCLE_QUEUE_NAME: &str = "lifecycle";

/// The commands a [`LifecycleQueue`] carries in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleCommand {
  #[default]
  Init,
  Deinit,
  Start,
  Stop,
}

/// Notifications forwarded to a [`LifecycleListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
  /// The `Start` command ran.
  Started,
  /// The `Stop` command ran.
  Stopped,
}

impl fmt::Display for LifecycleEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LifecycleEvent::Started => write!(f, "started"),
      LifecycleEvent::Stopped => write!(f, "stopped"),
    }
  }
}

/// Receives lifecycle notifications. Called on the queue's worker thread.
pub trait LifecycleListener: Send + Sync {
  fn on_event(&self, event: LifecycleEvent);
}

impl<F> LifecycleListener for F
where
  F: Fn(LifecycleEvent) + Send + Sync,
{
  fn on_event(&self, event: LifecycleEvent) {
    self(event)
  }
}

struct LifecycleHandler {
  listener: Option<Arc<dyn LifecycleListener>>,
}

impl LifecycleHandler {
  fn notify(&self, event: LifecycleEvent) {
    if let Some(listener) = &self.listener {
      listener.on_event(event);
    }
  }
}

impl CommandHandler<LifecycleCommand> for LifecycleHandler {
  fn handle(&mut self, _info: CommandInfo, command: &mut LifecycleCommand) {
    trace!(?command, "lifecycle command");
    match *command {
      LifecycleCommand::Init | LifecycleCommand::Deinit => {}
      LifecycleCommand::Start => self.notify(LifecycleEvent::Started),
      LifecycleCommand::Stop => self.notify(LifecycleEvent::Stopped),
    }
  }
}

/// A service front-end whose lifecycle commands execute one at a time on a
/// dedicated thread.
///
/// Construction submits `Init`; [`deinit`](LifecycleQueue::deinit) (or drop)
/// submits `Deinit` and tears the queue down. Every call blocks until its
/// command has run.
pub struct LifecycleQueue {
  queue: Option<CmdQueue<LifecycleCommand>>,
}

impl fmt::Debug for LifecycleQueue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LifecycleQueue")
      .field("queue", &self.queue)
      .finish()
  }
}

impl LifecycleQueue {
  /// Creates the queue without a listener and runs `Init`.
  pub fn new() -> Result<Self, BuildError> {
    Self::init(None)
  }

  /// Creates the queue and runs `Init`. `listener` hears about every
  /// subsequent `Start` and `Stop`.
  pub fn with_listener<L>(listener: L) -> Result<Self, BuildError>
  where
    L: LifecycleListener + 'static,
  {
    Self::init(Some(Arc::new(listener)))
  }

  fn init(listener: Option<Arc<dyn LifecycleListener>>) -> Result<Self, BuildError> {
    // One slot: lifecycle commands are strictly one at a time anyway.
    let queue = CmdQueue::builder(LIFECYCLE_QUEUE_NAME)
      .slots(1)
      .build(LifecycleHandler { listener })?;
    let this = Self { queue: Some(queue) };
    this.send(LifecycleCommand::Init);
    Ok(this)
  }

  pub fn start(&self) {
    self.send(LifecycleCommand::Start);
  }

  pub fn stop(&self) {
    self.send(LifecycleCommand::Stop);
  }

  /// Runs `Deinit` and stops the worker thread.
  pub fn deinit(mut self) {
    self.teardown();
  }

  fn send(&self, command: LifecycleCommand) {
    let Some(queue) = &self.queue else {
      return;
    };
    let mut slot = queue.acquire();
    *slot = command;
    // Nothing flushes this queue, so a cancellation is unexpected.
    if let Err(err) = queue.submit_sync(slot) {
      warn!(?command, %err, "lifecycle command did not run");
    }
  }

  fn teardown(&mut self) {
    if self.queue.is_none() {
      return;
    }
    self.send(LifecycleCommand::Deinit);
    if let Some(queue) = self.queue.take() {
      queue.shutdown();
    }
  }
}

impl Drop for LifecycleQueue {
  fn drop(&mut self) {
    self.teardown();
  }
}
