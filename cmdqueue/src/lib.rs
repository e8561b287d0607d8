#![warn(missing_debug_implementations, rust_2018_idioms)]

//! An in-process command dispatch queue.
//!
//! A [`CmdQueue`] owns a fixed pool of command slots and one dedicated worker
//! thread. Any number of producer threads acquire a slot, fill in its payload
//! and submit it; the worker runs the queue's handler on each submitted slot.
//!
//! # Features
//! - **Fixed pool**: every slot is allocated at construction. The pool size
//!   bounds the number of outstanding commands; acquisition blocks (or, with
//!   `try_acquire`, returns `None`) when the pool is exhausted.
//! - **Sync & async submission**: fire-and-forget, or block until the handler
//!   has run on your command.
//! - **Two priority lanes**: synchronous high-priority commands overtake every
//!   normal command that has not been picked up yet.
//! - **Flush**: bulk-cancel everything waiting on the normal lane.
//! - **Targeted completion**: a finishing command wakes only its own
//!   submitter.
//!
//! ```
//! use fibre_cmdqueue::{CmdQueue, CommandInfo};
//!
//! #[derive(Default)]
//! struct Job {
//!   input: u32,
//!   output: u32,
//! }
//!
//! let queue = CmdQueue::<Job>::new("squarer", 8, |_info: CommandInfo, job: &mut Job| {
//!   job.output = job.input * job.input;
//! })
//! .unwrap();
//!
//! // Fire-and-forget.
//! let mut slot = queue.acquire();
//! slot.input = 3;
//! queue.submit_async(slot);
//!
//! // Wait for completion and read the result back out of the payload.
//! let mut slot = queue.acquire();
//! slot.input = 7;
//! let squared = queue.submit_sync_with(slot, |job| job.output).unwrap();
//! assert_eq!(squared, 49);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod metrics;

// Internal, crate-only modules
mod list;
mod pool;
mod queue;
mod shared;
mod slot;
mod worker;

// Re-export the primary user-facing types for convenience
pub use builder::CmdQueueBuilder;
pub use config::{QueueConfig, ShutdownPolicy};
pub use error::{BuildError, SubmitError};
pub use handler::{CommandHandler, CommandInfo, Lane, Mode};
pub use metrics::{MetricsSnapshot, QueueStats};
pub use pool::SlotId;
pub use queue::CmdQueue;
pub use slot::CmdSlot;

#[allow(dead_code)]
fn assert_send_sync<T: Send + Sync>() {}

#[allow(dead_code)]
fn assert_queue_is_shareable() {
  assert_send_sync::<CmdQueue<Vec<u8>>>();
}
