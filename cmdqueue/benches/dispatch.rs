use bench_matrix::{
  criterion_runner::sync_suite::SyncBenchmarkSuite, AbstractCombination, MatrixCellValue,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fibre_cmdqueue::{CmdQueue, CommandInfo};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

// --- Config, State, Context ---

#[derive(Debug, Clone)]
struct BenchConfig {
  mode: String,
  slots: usize,
  num_items: usize,
  producers: usize,
}

struct BenchState {
  queue: Arc<CmdQueue<u64>>,
}

type BenchContext = ();

// --- Extractor Function ---

fn extract_config(combo: &AbstractCombination) -> Result<BenchConfig, String> {
  Ok(BenchConfig {
    mode: combo.get_string(0)?.to_string(),
    slots: combo.get_u64(1)? as usize,
    num_items: combo.get_u64(2)? as usize,
    producers: combo.get_u64(3)? as usize,
  })
}

// --- Benchmark Functions ---

fn setup_fn(cfg: &BenchConfig) -> Result<(BenchContext, BenchState), String> {
  if !matches!(cfg.mode.as_str(), "Async" | "Sync" | "High") {
    return Err("Invalid submission mode".to_string());
  }
  let queue = CmdQueue::<u64>::builder("bench")
    .slots(cfg.slots)
    .build(|_info: CommandInfo, value: &mut u64| {
      *value = black_box(value.wrapping_mul(31).wrapping_add(7));
    })
    .map_err(|e| e.to_string())?;
  Ok(((), BenchState { queue: Arc::new(queue) }))
}

fn benchmark_logic(
  _ctx: BenchContext,
  state: BenchState,
  cfg: &BenchConfig,
) -> (BenchContext, BenchState, Duration) {
  let barrier = Arc::new(Barrier::new(cfg.producers));
  let per_producer = cfg.num_items / cfg.producers;
  let target = state.queue.metrics().dispatched + (per_producer * cfg.producers) as u64;

  let start_time = Instant::now();

  thread::scope(|s| {
    for producer in 0..cfg.producers {
      let barrier_clone = barrier.clone();
      let queue = &state.queue;
      let mode = cfg.mode.as_str();

      s.spawn(move || {
        barrier_clone.wait();
        for i in 0..per_producer {
          let mut slot = queue.acquire();
          *slot = (producer * per_producer + i) as u64;
          match mode {
            "Async" => queue.submit_async(slot),
            "Sync" => {
              black_box(queue.submit_sync_with(slot, |value| *value).ok());
            }
            "High" => {
              black_box(queue.submit_sync_high_priority_with(slot, |value| *value));
            }
            _ => unreachable!(),
          }
        }
      });
    }
  });

  // Async submissions return early; wait for the worker to catch up.
  while state.queue.metrics().dispatched < target {
    thread::yield_now();
  }

  let duration = start_time.elapsed();
  ((), state, duration)
}

fn dispatch_benches(c: &mut Criterion) {
  let parameter_axes = vec![
    vec![
      MatrixCellValue::String("Async".to_string()),
      MatrixCellValue::String("Sync".to_string()),
      MatrixCellValue::String("High".to_string()),
    ], // Submission mode
    vec![MatrixCellValue::Unsigned(4), MatrixCellValue::Unsigned(64)], // Pool size
    vec![MatrixCellValue::Unsigned(10_000)], // Commands per iteration
    vec![
      MatrixCellValue::Unsigned(1), // Producer threads
      MatrixCellValue::Unsigned(4),
      MatrixCellValue::Unsigned(8),
    ],
  ];
  let parameter_names = vec![
    "Mode".to_string(),
    "Slots".to_string(),
    "Items".to_string(),
    "Producers".to_string(),
  ];

  SyncBenchmarkSuite::new(
    c,
    "Dispatch".to_string(),
    Some(parameter_names),
    parameter_axes,
    Box::new(extract_config),
    setup_fn,
    benchmark_logic,
    |_, _, _| {}, // Teardown
  )
  .throughput(|cfg: &BenchConfig| Throughput::Elements(cfg.num_items as u64))
  .run();
}

criterion_group!(benches, dispatch_benches);
criterion_main!(benches);
