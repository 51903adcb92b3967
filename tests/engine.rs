use rill::prelude::*;
use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  thread,
  time::Duration,
};

struct SignalLog {
  log: Arc<Mutex<Vec<Notification<i32, &'static str>>>>,
}

impl Observer<i32, &'static str> for SignalLog {
  fn next(&mut self, value: i32) {
    self.log.lock().unwrap().push(Notification::Next(value));
  }

  fn error(self, err: &'static str) {
    self.log.lock().unwrap().push(Notification::Error(err));
  }

  fn complete(self) {
    self.log.lock().unwrap().push(Notification::Complete);
  }

  fn is_closed(&self) -> bool { false }
}

/// Many pushers and several racing terminals against one serializer: the
/// observer must see a strictly serialized sequence ending in exactly one
/// terminal, with nothing after it.
#[test]
fn racing_signals_reach_the_observer_legally_serialized() {
  let log = Arc::new(Mutex::new(vec![]));
  let serializer = HalfSerializerThreads::new(SignalLog { log: log.clone() });

  let mut handles = vec![];
  for t in 0..4i32 {
    let serializer = serializer.clone();
    handles.push(thread::spawn(move || {
      for i in 0..1000 {
        serializer.forward_next(t * 1000 + i);
      }
    }));
  }
  for _ in 0..2 {
    let serializer = serializer.clone();
    handles.push(thread::spawn(move || serializer.forward_complete()));
  }
  {
    let serializer = serializer.clone();
    handles.push(thread::spawn(move || serializer.forward_error("boom")));
  }
  for handle in handles {
    handle.join().unwrap();
  }

  let log = log.lock().unwrap();
  let terminals = log.iter().filter(|n| n.is_terminal()).count();
  assert_eq!(terminals, 1);
  assert!(log.last().unwrap().is_terminal());
}

/// The racing coordinator forwards signals of exactly one source.
#[test]
fn amb_forwards_exactly_one_of_two_racing_sources() {
  let collected = Arc::new(Mutex::new(Vec::<i32>::new()));
  let a: SubjectThreads<i32, ()> = SubjectThreads::default();
  let b: SubjectThreads<i32, ()> = SubjectThreads::default();
  let completed = Arc::new(AtomicUsize::new(0));
  {
    let collected = collected.clone();
    let completed = completed.clone();
    a.clone()
      .amb_threads(b.clone())
      .on_complete(move || {
        completed.fetch_add(1, Ordering::SeqCst);
      })
      .subscribe(move |v| collected.lock().unwrap().push(v));
  }

  let race_a = {
    let mut a = a.clone();
    thread::spawn(move || {
      for i in 0..100 {
        a.next(i);
      }
      Observer::<i32, ()>::complete(a);
    })
  };
  let race_b = {
    let mut b = b.clone();
    thread::spawn(move || {
      for i in 1000..1100 {
        b.next(i);
      }
      Observer::<i32, ()>::complete(b);
    })
  };
  race_a.join().unwrap();
  race_b.join().unwrap();

  let values = collected.lock().unwrap();
  assert_eq!(values.len(), 100);
  let all_a = values.iter().all(|v| *v < 1000);
  let all_b = values.iter().all(|v| *v >= 1000);
  assert!(all_a || all_b, "winner output must come from one source only");
  assert_eq!(completed.load(Ordering::SeqCst), 1);
}

/// A notifier firing from another thread completes the stream exactly
/// once; values pushed afterwards never reach the observer.
#[test]
fn take_until_threads_settles_once_under_fire() {
  let collected = Arc::new(Mutex::new(Vec::<usize>::new()));
  let completed = Arc::new(AtomicUsize::new(0));
  let data: SubjectThreads<usize, ()> = SubjectThreads::default();
  let stop: SubjectThreads<(), ()> = SubjectThreads::default();
  {
    let collected = collected.clone();
    let completed = completed.clone();
    data
      .clone()
      .take_until_threads(stop.clone())
      .on_complete(move || {
        completed.fetch_add(1, Ordering::SeqCst);
      })
      .subscribe(move |v| collected.lock().unwrap().push(v));
  }

  let pusher = {
    let mut data = data.clone();
    thread::spawn(move || {
      for i in 0..200_000 {
        data.next(i);
      }
    })
  };
  thread::sleep(Duration::from_millis(5));
  let mut trigger = stop.clone();
  trigger.next(());
  pusher.join().unwrap();

  assert_eq!(completed.load(Ordering::SeqCst), 1);
  let settled_len = collected.lock().unwrap().len();
  let mut emitter = data.clone();
  emitter.next(999_999_999);
  assert_eq!(collected.lock().unwrap().len(), settled_len);
}

/// A synchronously-firing notifier yields an empty completed stream; not
/// one value slips through.
#[test]
fn take_until_synchronous_notifier_is_airtight() {
  let mut count = 0;
  let mut completed = 0;
  observable::from_iter(0..10_000)
    .take_until(observable::of(()))
    .on_complete(|| completed += 1)
    .subscribe(|_| count += 1);
  assert_eq!(count, 0);
  assert_eq!(completed, 1);
}

struct ReleaseCounter(Arc<AtomicUsize>);

impl Subscription for ReleaseCounter {
  fn unsubscribe(self) { self.0.fetch_add(1, Ordering::SeqCst); }

  fn is_closed(&self) -> bool { false }
}

/// Disposal is idempotent even when every clone of a handle races to
/// unsubscribe at once.
#[test]
fn concurrent_disposal_releases_exactly_once() {
  let releases = Arc::new(AtomicUsize::new(0));
  let slot = DeferredSubscriptionThreads::default();
  slot.set(ReleaseCounter(releases.clone()));

  let racers: Vec<_> = (0..8)
    .map(|_| {
      let slot = slot.clone();
      thread::spawn(move || slot.unsubscribe())
    })
    .collect();
  for racer in racers {
    racer.join().unwrap();
  }
  assert_eq!(releases.load(Ordering::SeqCst), 1);
}

/// The shared upstream of `group_by` is released only when the outer
/// subscription and every group subscription are gone, in any order.
#[test]
fn group_by_upstream_outlives_outer_until_groups_release() {
  let upstream: SubjectThreads<i32, ()> = SubjectThreads::default();
  let group_subs = Arc::new(Mutex::new(Vec::new()));
  let outer_sub = {
    let group_subs = group_subs.clone();
    upstream
      .clone()
      .group_by_threads(|v| v % 2)
      .subscribe(move |group| {
        group_subs.lock().unwrap().push(group.subscribe(|_| {}));
      })
  };

  let mut emitter = upstream.clone();
  emitter.next(1);
  emitter.next(2);
  assert_eq!(upstream.subscribed_size(), 1);

  // primary released first: children keep the upstream alive
  outer_sub.unsubscribe();
  assert_eq!(upstream.subscribed_size(), 1);

  let subs: Vec<_> = group_subs.lock().unwrap().drain(..).collect();
  for sub in subs {
    sub.unsubscribe();
  }
  assert_eq!(upstream.subscribed_size(), 0);
}

/// Partition completeness: the union of the group streams is the source
/// stream, keyed and in order.
#[test]
fn group_by_partition_is_complete() {
  use std::{cell::RefCell, rc::Rc};

  let seen: Rc<RefCell<HashMap<i32, Vec<i32>>>> =
    Rc::new(RefCell::new(HashMap::new()));
  {
    let seen = seen.clone();
    observable::from_iter(0..1000)
      .group_by(|v| v % 7)
      .subscribe(move |group| {
        let key = group.key;
        let seen = seen.clone();
        group.subscribe(move |v| {
          seen.borrow_mut().entry(key).or_default().push(v);
        });
      });
  }
  let seen = seen.borrow();
  for key in 0..7 {
    let expected: Vec<i32> = (0..1000).filter(|v| v % 7 == key).collect();
    assert_eq!(seen[&key], expected);
  }
}

/// The trampoline keeps huge concatenation chains off the call stack in
/// the thread-safe flavor as well.
#[test]
fn concat_iter_threads_is_stack_safe() {
  let count = Arc::new(AtomicUsize::new(0));
  {
    let count = count.clone();
    observable::concat_iter_threads((0..30_000).map(observable::of))
      .subscribe(move |_| {
        count.fetch_add(1, Ordering::Relaxed);
      });
  }
  assert_eq!(count.load(Ordering::Relaxed), 30_000);
}

/// Merged concurrent pushers keep the downstream observer serialized and
/// complete exactly once, after both sides finish.
#[test]
fn merge_threads_serializes_and_completes_once() {
  let total = Arc::new(AtomicUsize::new(0));
  let completed = Arc::new(AtomicUsize::new(0));
  let a: SubjectThreads<i32, ()> = SubjectThreads::default();
  let b: SubjectThreads<i32, ()> = SubjectThreads::default();
  {
    let total = total.clone();
    let completed = completed.clone();
    a.clone()
      .merge_threads(b.clone())
      .on_complete(move || {
        completed.fetch_add(1, Ordering::SeqCst);
      })
      .subscribe(move |_| {
        total.fetch_add(1, Ordering::SeqCst);
      });
  }
  let drive = |subject: SubjectThreads<i32, ()>| {
    thread::spawn(move || {
      let mut emitter = subject;
      for i in 0..5000 {
        emitter.next(i);
      }
      Observer::<i32, ()>::complete(emitter);
    })
  };
  let ta = drive(a);
  let tb = drive(b);
  ta.join().unwrap();
  tb.join().unwrap();

  assert_eq!(total.load(Ordering::SeqCst), 10_000);
  assert_eq!(completed.load(Ordering::SeqCst), 1);
}
