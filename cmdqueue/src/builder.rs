use crate::config::{QueueConfig, ShutdownPolicy};
use crate::error::BuildError;
use crate::handler::CommandHandler;
use crate::pool::{Pool, SlotId, MAX_SLOTS};
use crate::queue::CmdQueue;
use crate::shared::Shared;

use core::fmt;
use std::marker::PhantomData;

/// A builder for [`CmdQueue`].
///
/// ```
/// use fibre_cmdqueue::{CmdQueue, CommandInfo, ShutdownPolicy};
///
/// let queue = CmdQueue::<u64>::builder("adder")
///   .slots(4)
///   .shutdown_policy(ShutdownPolicy::Drain)
///   .build(|_info: CommandInfo, value: &mut u64| *value += 1)
///   .unwrap();
///
/// let mut slot = queue.acquire();
/// *slot = 41;
/// let answer = queue.submit_sync_with(slot, |value| *value).unwrap();
/// assert_eq!(answer, 42);
/// ```
pub struct CmdQueueBuilder<P> {
  name: String,
  config: QueueConfig,
  _payload: PhantomData<fn() -> P>,
}

impl<P> fmt::Debug for CmdQueueBuilder<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CmdQueueBuilder")
      .field("name", &self.name)
      .field("config", &self.config)
      .finish()
  }
}

impl<P: Send + 'static> CmdQueueBuilder<P> {
  /// Creates a builder with the default [`QueueConfig`]. `name` names the
  /// worker thread and tags every log event of the queue.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      config: QueueConfig::default(),
      _payload: PhantomData,
    }
  }

  /// Sets the number of slots in the pool. This is also the maximum number of
  /// commands that can be outstanding at once.
  pub fn slots(mut self, slot_count: usize) -> Self {
    self.config.slot_count = slot_count;
    self
  }

  /// Sets what happens to pending commands when the queue is torn down.
  ///
  /// Defaults to [`ShutdownPolicy::Discard`].
  pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
    self.config.shutdown_policy = policy;
    self
  }

  pub fn worker_stack_size(mut self, bytes: usize) -> Self {
    self.config.worker_stack_size = Some(bytes);
    self
  }

  /// Replaces every setting with the values from `config`. Builder calls made
  /// afterwards override individual fields again.
  pub fn config(mut self, config: QueueConfig) -> Self {
    self.config = config;
    self
  }

  /// Builds the queue with default-initialized payloads and starts its
  /// worker.
  pub fn build<H>(self, handler: H) -> Result<CmdQueue<P>, BuildError>
  where
    P: Default,
    H: CommandHandler<P>,
  {
    self.build_with(handler, |_| P::default())
  }

  /// Builds the queue, creating each slot's initial payload with `init`, and
  /// starts its worker.
  pub fn build_with<H, I>(self, handler: H, init: I) -> Result<CmdQueue<P>, BuildError>
  where
    H: CommandHandler<P>,
    I: FnMut(SlotId) -> P,
  {
    self.validate()?;

    let pool = Pool::new(self.config.slot_count, init);
    let shared = Shared::new(self.name, pool, self.config.shutdown_policy);
    CmdQueue::launch(shared, handler, self.config.worker_stack_size)
  }

  fn validate(&self) -> Result<(), BuildError> {
    if self.name.is_empty() || self.name.contains('\0') {
      return Err(BuildError::InvalidName(self.name.clone()));
    }
    match self.config.slot_count {
      0 => Err(BuildError::ZeroSlots),
      n if n > MAX_SLOTS => Err(BuildError::TooManySlots {
        requested: n,
        max: MAX_SLOTS,
      }),
      _ => Ok(()),
    }
  }
}
