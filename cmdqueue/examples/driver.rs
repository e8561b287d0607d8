use fibre_cmdqueue::{CmdQueue, CommandInfo};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Kind {
  #[default]
  Init,
  Work,
  Fast,
  Done,
}

#[derive(Debug, Default)]
struct Job {
  kind: Kind,
  idx: u32,
}

fn handle(info: CommandInfo, job: &mut Job) {
  println!("CB {:<4?} {:>2}  ({})", job.kind, job.idx, info);
  let pause = match job.kind {
    Kind::Init => Duration::from_millis(1),
    Kind::Work => Duration::from_millis(10),
    Kind::Fast => Duration::from_millis(5),
    Kind::Done => Duration::ZERO,
  };
  thread::sleep(pause);
}

fn main() {
  // RUST_LOG=fibre_cmdqueue=trace shows every submission and dispatch.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_thread_names(true)
    .init();

  let queue = CmdQueue::<Job>::new("myqueue", 16, handle).expect("Failed to build command queue");

  let schedule_sync = |kind, idx| {
    let mut slot = queue.acquire();
    *slot = Job { kind, idx };
    queue.submit_sync(slot).expect("nothing flushes this queue");
  };
  let schedule_async = |kind, idx| {
    let mut slot = queue.acquire();
    *slot = Job { kind, idx };
    queue.submit_async(slot);
  };
  let schedule_high = |kind, idx| {
    let mut slot = queue.acquire();
    *slot = Job { kind, idx };
    queue.submit_sync_high_priority(slot);
  };

  schedule_sync(Kind::Init, 1);
  schedule_sync(Kind::Work, 2);
  schedule_sync(Kind::Work, 3);
  schedule_async(Kind::Work, 4);
  schedule_async(Kind::Work, 5);
  // Overtakes 5 if the worker is still busy with 4.
  schedule_high(Kind::Fast, 6);
  schedule_async(Kind::Work, 7);
  schedule_sync(Kind::Work, 8);
  schedule_sync(Kind::Work, 9);
  schedule_async(Kind::Work, 10);
  schedule_async(Kind::Work, 11);
  println!("done scheduling");

  schedule_sync(Kind::Done, 12);
  println!("done");

  println!("\nQueue stats: {:?}", queue.stats());
  let metrics = queue.shutdown();
  println!("Final metrics: {:#?}", metrics);
}
