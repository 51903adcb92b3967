use crate::{observer::Observer, subscription::Subscription};
use std::sync::{Arc, Condvar, Mutex};

/// Which push signals a pull adapter is willing to keep.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PullMode {
  /// Overwrite the slot on every push: a pull observes the freshest value
  /// and staleness in between is deliberately tolerated.
  Latest,
  /// Only accept a push while a pull is already waiting: values arriving
  /// unobserved are dropped, so a pull always yields a value that arrived
  /// after it started.
  Next,
}

struct PullSlot<Item, Err> {
  value: Option<Item>,
  /// `Some(None)` is completion, `Some(Some(e))` an error; sticky once set.
  terminal: Option<Option<Err>>,
  waiting: bool,
}

/// One bounded signal slot plus the gate a pulling thread blocks on.
struct Gate<Item, Err> {
  slot: Mutex<PullSlot<Item, Err>>,
  ready: Condvar,
}

impl<Item, Err> Default for Gate<Item, Err> {
  fn default() -> Self {
    Gate {
      slot: Mutex::new(PullSlot { value: None, terminal: None, waiting: false }),
      ready: Condvar::new(),
    }
  }
}

/// Push-side sink of the pull adapters. The producer never blocks: a push
/// either lands in the slot or is dropped, per the adapter's mode.
pub struct PullObserverThreads<Item, Err> {
  gate: Arc<Gate<Item, Err>>,
  mode: PullMode,
}

impl<Item, Err> Observer<Item, Err> for PullObserverThreads<Item, Err> {
  fn next(&mut self, value: Item) {
    let mut slot = self.gate.slot.lock().unwrap();
    if slot.terminal.is_some() {
      return;
    }
    match self.mode {
      PullMode::Latest => {
        slot.value = Some(value);
        self.gate.ready.notify_one();
      }
      PullMode::Next => {
        if slot.waiting && slot.value.is_none() {
          slot.value = Some(value);
          self.gate.ready.notify_one();
        }
      }
    }
  }

  fn error(self, err: Err) {
    let mut slot = self.gate.slot.lock().unwrap();
    if slot.terminal.is_none() {
      slot.terminal = Some(Some(err));
      self.gate.ready.notify_all();
    }
  }

  fn complete(self) {
    let mut slot = self.gate.slot.lock().unwrap();
    if slot.terminal.is_none() {
      slot.terminal = Some(None);
      self.gate.ready.notify_all();
    }
  }

  fn is_closed(&self) -> bool {
    self.gate.slot.lock().unwrap().terminal.is_some()
  }
}

enum Pulled<Item, Err> {
  Value(Item),
  Failed(Err),
  Exhausted,
}

fn pull<Item, Err>(gate: &Gate<Item, Err>, mode: PullMode) -> Pulled<Item, Err> {
  let mut slot = gate.slot.lock().unwrap();
  if mode == PullMode::Next {
    slot.waiting = true;
  }
  loop {
    if let Some(value) = slot.value.take() {
      slot.waiting = false;
      return Pulled::Value(value);
    }
    // a buffered value always drains before the terminal is surfaced
    if slot.terminal.is_some() {
      slot.waiting = false;
      let terminal = slot.terminal.as_mut().unwrap();
      return match terminal.take() {
        Some(err) => Pulled::Failed(err),
        None => Pulled::Exhausted,
      };
    }
    slot = gate.ready.wait(slot).unwrap();
  }
}

macro_rules! impl_pull_iter {
  ($name: ident, $mode: expr, $doc: literal) => {
    #[doc = $doc]
    ///
    /// Each `next` call blocks the pulling thread until a signal is
    /// available, so the subscription must be driven by other threads. An
    /// upstream error surfaces once as `Some(Err(_))`; afterwards, and
    /// after completion, the iterator is exhausted. Dropping the iterator
    /// unsubscribes upstream.
    pub struct $name<Item, Err, U: Subscription> {
      gate: Arc<Gate<Item, Err>>,
      unsub: Option<U>,
      done: bool,
    }

    impl<Item, Err, U: Subscription> $name<Item, Err, U> {
      pub(crate) fn subscribe_on<S>(source: S) -> Self
      where
        S: crate::observable::Observable<
          Item,
          Err,
          PullObserverThreads<Item, Err>,
          Unsub = U,
        >,
      {
        let gate = Arc::new(Gate::default());
        let unsub = source.actual_subscribe(PullObserverThreads {
          gate: gate.clone(),
          mode: $mode,
        });
        Self { gate, unsub: Some(unsub), done: false }
      }
    }

    impl<Item, Err, U: Subscription> Iterator for $name<Item, Err, U> {
      type Item = Result<Item, Err>;

      fn next(&mut self) -> Option<Self::Item> {
        if self.done {
          return None;
        }
        match pull(&self.gate, $mode) {
          Pulled::Value(value) => Some(Ok(value)),
          Pulled::Failed(err) => {
            self.done = true;
            Some(Err(err))
          }
          Pulled::Exhausted => {
            self.done = true;
            None
          }
        }
      }
    }

    impl<Item, Err, U: Subscription> Drop for $name<Item, Err, U> {
      fn drop(&mut self) {
        if let Some(unsub) = self.unsub.take() {
          unsub.unsubscribe();
        }
      }
    }
  };
}

impl_pull_iter!(
  LatestIter,
  PullMode::Latest,
  "Blocking freshest-value pull over a push subscription."
);
impl_pull_iter!(
  NextIter,
  PullMode::Next,
  "Blocking next-value pull over a push subscription."
);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{sync::mpsc, thread, time::Duration};

  #[test]
  fn latest_pull_takes_freshest_value() {
    let subject: SubjectThreads<i32, ()> = SubjectThreads::default();
    let mut iter = subject.clone().latest_iter();

    let mut emitter = subject.clone();
    let producer = thread::spawn(move || {
      // all three land before the consumer wakes up; only the freshest
      // survives the overwriting slot
      emitter.next(1);
      emitter.next(2);
      emitter.next(3);
      thread::sleep(Duration::from_millis(50));
      Observer::<i32, ()>::complete(emitter);
    });

    thread::sleep(Duration::from_millis(10));
    assert_eq!(iter.next(), Some(Ok(3)));
    assert_eq!(iter.next(), None);
    producer.join().unwrap();
  }

  #[test]
  fn next_pull_drops_unobserved_values() {
    let subject: SubjectThreads<i32, ()> = SubjectThreads::default();
    let mut iter = subject.clone().next_iter();

    // nobody is waiting: dropped by design
    let mut emitter = subject.clone();
    emitter.next(1);

    let (started, wait_started) = mpsc::channel();
    let mut emitter = subject.clone();
    let producer = thread::spawn(move || {
      wait_started.recv().unwrap();
      thread::sleep(Duration::from_millis(20));
      emitter.next(2);
      Observer::<i32, ()>::complete(emitter);
    });

    started.send(()).unwrap();
    assert_eq!(iter.next(), Some(Ok(2)));
    assert_eq!(iter.next(), None);
    producer.join().unwrap();
  }

  #[test]
  fn error_surfaces_at_the_pull_site_once() {
    let subject: SubjectThreads<i32, &str> = SubjectThreads::default();
    let mut iter = subject.clone().latest_iter();

    let emitter = subject.clone();
    let producer = thread::spawn(move || {
      Observer::<i32, &str>::error(emitter, "boom");
    });
    producer.join().unwrap();

    assert_eq!(iter.next(), Some(Err("boom")));
    assert_eq!(iter.next(), None);
  }

  #[test]
  fn buffered_value_drains_before_completion() {
    let subject: SubjectThreads<i32, ()> = SubjectThreads::default();
    let mut iter = subject.clone().latest_iter();

    let mut emitter = subject.clone();
    emitter.next(7);
    Observer::<i32, ()>::complete(emitter);

    assert_eq!(iter.next(), Some(Ok(7)));
    assert_eq!(iter.next(), None);
  }
}
