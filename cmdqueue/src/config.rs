//! Plain-data configuration for a command queue.
//!
//! `QueueConfig` carries the knobs that make sense to keep in a config file.
//! It can be applied to a builder with
//! [`CmdQueueBuilder::config`](crate::CmdQueueBuilder::config). With the
//! `serde` feature it deserializes from any serde format, and every field is
//! optional.

#[cfg(feature = "serde")]
use serde::Deserialize;

/// The default number of slots in a queue's pool.
pub const DEFAULT_SLOT_COUNT: usize = 16;

/// What the worker does with commands still pending when the queue is torn
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShutdownPolicy {
  /// Stop as soon as the stop request is seen. Pending commands are never
  /// dispatched; their slots are returned to the pool.
  #[default]
  Discard,
  /// Keep dispatching until both pending lanes are empty, then stop.
  Drain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct QueueConfig {
  /// Number of slots allocated up front. Bounds the total number of
  /// outstanding commands.
  pub slot_count: usize,
  pub shutdown_policy: ShutdownPolicy,
  /// Stack size for the worker thread, in bytes. `None` uses the platform
  /// default for spawned threads.
  pub worker_stack_size: Option<usize>,
}

impl Default for QueueConfig {
  fn default() -> Self {
    Self {
      slot_count: DEFAULT_SLOT_COUNT,
      shutdown_policy: ShutdownPolicy::default(),
      worker_stack_size: None,
    }
  }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
  use super::*;

  #[test]
  fn missing_fields_take_defaults() {
    let config: QueueConfig = serde_json::from_str(r#"{ "slot_count": 4 }"#).unwrap();
    assert_eq!(config.slot_count, 4);
    assert_eq!(config.shutdown_policy, ShutdownPolicy::Discard);
    assert_eq!(config.worker_stack_size, None);
  }

  #[test]
  fn shutdown_policy_uses_snake_case() {
    let config: QueueConfig = serde_json::from_str(r#"{ "shutdown_policy": "drain" }"#).unwrap();
    assert_eq!(config.shutdown_policy, ShutdownPolicy::Drain);
    assert_eq!(config.slot_count, DEFAULT_SLOT_COUNT);
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let result = serde_json::from_str::<QueueConfig>(r#"{ "slots": 4 }"#);
    assert!(result.is_err());
  }
}
