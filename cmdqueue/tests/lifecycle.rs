use fibre_cmdqueue::lifecycle::{LifecycleEvent, LifecycleQueue};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

type EventLog = Arc<Mutex<Vec<(LifecycleEvent, Option<String>)>>>;

fn recording_service() -> (LifecycleQueue, EventLog) {
  let log: EventLog = Arc::new(Mutex::new(Vec::new()));
  let sink = log.clone();
  let service = LifecycleQueue::with_listener(move |event: LifecycleEvent| {
    let thread_name = thread::current().name().map(str::to_owned);
    sink.lock().push((event, thread_name));
  })
  .unwrap();
  (service, log)
}

fn events(log: &EventLog) -> Vec<LifecycleEvent> {
  log.lock().iter().map(|(event, _)| *event).collect()
}

#[test]
fn init_and_deinit_without_a_listener() {
  let service = LifecycleQueue::new().unwrap();
  service.start();
  service.stop();
  service.deinit();
}

#[test]
fn start_and_stop_are_reported_in_order() {
  let (service, log) = recording_service();
  // Init produces no event.
  assert!(events(&log).is_empty());

  service.start();
  assert_eq!(events(&log), vec![LifecycleEvent::Started]);

  service.stop();
  service.start();
  service.stop();
  service.deinit();

  assert_eq!(
    events(&log),
    vec![
      LifecycleEvent::Started,
      LifecycleEvent::Stopped,
      LifecycleEvent::Started,
      LifecycleEvent::Stopped,
    ]
  );
}

#[test]
fn events_arrive_on_the_lifecycle_worker() {
  let (service, log) = recording_service();
  service.start();
  drop(service);

  let log = log.lock();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].1.as_deref(), Some("lifecycle"));
}

#[test]
fn commands_from_many_threads_run_one_at_a_time() {
  let (service, log) = recording_service();

  thread::scope(|s| {
    for _ in 0..4 {
      s.spawn(|| {
        for _ in 0..10 {
          service.start();
          service.stop();
        }
      });
    }
  });
  service.deinit();

  let events = events(&log);
  assert_eq!(events.len(), 80);
  let started = events.iter().filter(|e| **e == LifecycleEvent::Started).count();
  assert_eq!(started, 40);
}

#[test]
fn event_display() {
  assert_eq!(LifecycleEvent::Started.to_string(), "started");
  assert_eq!(LifecycleEvent::Stopped.to_string(), "stopped");
}
