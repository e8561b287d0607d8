#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fibre_cmdqueue::CommandInfo;
use parking_lot::{Condvar, Mutex};

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(100);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(3);
pub const ITEMS_LOW: usize = 50;
pub const ITEMS_MEDIUM: usize = 200;

/// Payload used by most tests.
#[derive(Debug, Default, Clone)]
pub struct TestCmd {
  pub tag: u32,
  /// The handler parks on the test's gate before doing anything else.
  pub hold: bool,
  pub output: u32,
}

impl TestCmd {
  pub fn tagged(tag: u32) -> Self {
    Self {
      tag,
      ..Self::default()
    }
  }

  pub fn holding(tag: u32) -> Self {
    Self {
      tag,
      hold: true,
      output: 0,
    }
  }
}

/// A latch the worker can be parked on, so tests can pile up pending work
/// behind a command that is still in flight.
#[derive(Debug, Default)]
pub struct Gate {
  open: Mutex<bool>,
  opened: Condvar,
  entered: AtomicUsize,
}

impl Gate {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Called by the handler. Blocks until `open`.
  pub fn pass(&self) {
    self.entered.fetch_add(1, Ordering::SeqCst);
    let mut open = self.open.lock();
    while !*open {
      self.opened.wait(&mut open);
    }
  }

  pub fn open(&self) {
    *self.open.lock() = true;
    self.opened.notify_all();
  }

  /// Waits until some handler is parked on the gate.
  pub fn wait_entered(&self) {
    assert!(
      wait_until(LONG_TIMEOUT, || self.entered.load(Ordering::SeqCst) > 0),
      "worker never reached the gate"
    );
  }
}

/// Records the tags the handler saw, in dispatch order.
#[derive(Debug, Default)]
pub struct Journal {
  seen: Mutex<Vec<u32>>,
}

impl Journal {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn record(&self, tag: u32) {
    self.seen.lock().push(tag);
  }

  pub fn tags(&self) -> Vec<u32> {
    self.seen.lock().clone()
  }

  pub fn len(&self) -> usize {
    self.seen.lock().len()
  }
}

/// A handler that journals every tag, parks on `gate` when asked to, and
/// writes `tag * 2` into the output.
pub fn journaling_handler(
  journal: Arc<Journal>,
  gate: Arc<Gate>,
) -> impl FnMut(CommandInfo, &mut TestCmd) + Send + 'static {
  move |_info: CommandInfo, cmd: &mut TestCmd| {
    if cmd.hold {
      gate.pass();
    }
    journal.record(cmd.tag);
    cmd.output = cmd.tag * 2;
  }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
  let deadline = Instant::now() + timeout;
  while Instant::now() < deadline {
    if condition() {
      return true;
    }
    thread::sleep(Duration::from_millis(2));
  }
  condition()
}
