use thiserror::Error;

/// Errors that can occur when building a [`CmdQueue`](crate::CmdQueue).
#[derive(Debug, Error)]
pub enum BuildError {
  /// A queue needs at least one slot, or nothing could ever be submitted.
  #[error("command queue slot count cannot be zero")]
  ZeroSlots,

  #[error("command queue slot count {requested} exceeds the maximum of {max}")]
  TooManySlots { requested: usize, max: usize },

  /// The name is used for the worker thread and in log output, so it must be
  /// non-empty and free of NUL bytes.
  #[error("invalid command queue name {0:?}")]
  InvalidName(String),

  #[error("failed to spawn the worker thread: {0}")]
  Spawn(#[from] std::io::Error),
}

/// Error returned by the synchronous submit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
  /// The command was drained by [`CmdQueue::flush`](crate::CmdQueue::flush)
  /// before the worker picked it up. The handler never ran; the flush
  /// callback did.
  #[error("command was cancelled by a flush before dispatch")]
  Cancelled,
}
