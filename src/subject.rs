use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxObserver, BoxObserverThreads, Observer},
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::Subscription,
};
use smallvec::SmallVec;

/// Terminal state of a subject. A settled subject replays its terminal to
/// late subscribers instead of registering them.
enum SubjectState<Err> {
  Open,
  Completed,
  Errored(Err),
}

struct SubjectCore<Slot, Err> {
  observers: Vec<Slot>,
  state: SubjectState<Err>,
}

impl<Slot, Err> Default for SubjectCore<Slot, Err> {
  fn default() -> Self {
    SubjectCore { observers: vec![], state: SubjectState::Open }
  }
}

type LocalSlot<'a, Item, Err> = MutRc<Option<BoxObserver<'a, Item, Err>>>;
type ThreadsSlot<Item, Err> = MutArc<Option<BoxObserverThreads<Item, Err>>>;

/// A hot multicast stream for single-thread pipelines.
///
/// Every clone pushes into the same set of subscribers. Emission walks a
/// snapshot of the current subscribers, so subscribing or unsubscribing
/// *other* subscriptions from inside a `next` callback is fine; a fresh
/// subscriber starts receiving with the following emission. There is no
/// replay of past values — late subscribers only observe a settled
/// subject's terminal signal.
pub struct Subject<'a, Item, Err> {
  core: MutRc<SubjectCore<LocalSlot<'a, Item, Err>, Err>>,
}

/// The thread-safe flavor of [`Subject`].
pub struct SubjectThreads<Item, Err> {
  core: MutArc<SubjectCore<ThreadsSlot<Item, Err>, Err>>,
}

/// Handle for one subject subscriber; unsubscribing empties its slot.
pub struct SubjectSubscription<Slot> {
  slot: Slot,
}

macro_rules! impl_subject_subscription {
  ($slot: ty $(,$lf: lifetime)?) => {
    impl<$($lf,)? Item, Err> Subscription for SubjectSubscription<$slot> {
      fn unsubscribe(self) { self.slot.rc_deref_mut().take(); }

      fn is_closed(&self) -> bool { self.slot.rc_deref().is_none() }
    }
  };
}

impl_subject_subscription!(LocalSlot<'a, Item, Err>, 'a);
impl_subject_subscription!(ThreadsSlot<Item, Err>);

macro_rules! impl_subject {
  ($subject: ident, $rc: ident, $slot: ident, $boxed: ident
    $(,$lf: lifetime)? $(; $send: ident)?) => {
    impl<$($lf,)? Item, Err> $subject<$($lf,)? Item, Err> {
      pub fn new() -> Self { Self::default() }

      /// Number of live subscribers.
      pub fn subscribed_size(&self) -> usize {
        self
          .core
          .rc_deref()
          .observers
          .iter()
          .filter(|slot| slot.rc_deref().is_some())
          .count()
      }
    }

    impl<$($lf,)? Item, Err> Default for $subject<$($lf,)? Item, Err> {
      fn default() -> Self { Self { core: $rc::own(SubjectCore::default()) } }
    }

    impl<$($lf,)? Item, Err> Clone for $subject<$($lf,)? Item, Err> {
      fn clone(&self) -> Self { Self { core: self.core.clone() } }
    }

    impl<$($lf,)? Item, Err, O> Observable<Item, Err, O>
      for $subject<$($lf,)? Item, Err>
    where
      O: Observer<Item, Err> $(+ $lf)? $(+ $send + 'static)?,
      Err: Clone,
    {
      type Unsub = SubjectSubscription<$slot<$($lf,)? Item, Err>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let replay = {
          let core = self.core.rc_deref();
          match &core.state {
            SubjectState::Open => None,
            SubjectState::Completed => Some(None),
            SubjectState::Errored(err) => Some(Some(err.clone())),
          }
        };
        match replay {
          None => {
            let boxed: $boxed<$($lf,)? Item, Err> = Box::new(observer);
            let slot = $rc::own(Some(boxed));
            self.core.rc_deref_mut().observers.push(slot.clone());
            SubjectSubscription { slot }
          }
          Some(terminal) => {
            match terminal {
              Some(err) => observer.error(err),
              None => observer.complete(),
            }
            SubjectSubscription { slot: $rc::own(None) }
          }
        }
      }
    }

    impl<$($lf,)? Item, Err> ObservableExt<Item, Err>
      for $subject<$($lf,)? Item, Err>
    {
    }

    impl<$($lf,)? Item, Err> Observer<Item, Err>
      for $subject<$($lf,)? Item, Err>
    where
      Item: Clone,
      Err: Clone,
    {
      fn next(&mut self, value: Item) {
        {
          let core = self.core.rc_deref();
          if !matches!(core.state, SubjectState::Open) {
            return;
          }
        }
        let snapshot: SmallVec<[$slot<$($lf,)? Item, Err>; 2]> = self
          .core
          .rc_deref()
          .observers
          .iter()
          .cloned()
          .collect();
        for slot in snapshot {
          let mut guard = slot.rc_deref_mut();
          let settled =
            guard.as_ref().map_or(false, |observer| observer.is_closed());
          if settled {
            guard.take();
          } else if let Some(observer) = guard.as_mut() {
            observer.next(value.clone());
          }
        }
        self
          .core
          .rc_deref_mut()
          .observers
          .retain(|slot| slot.rc_deref().is_some());
      }

      fn error(self, err: Err) {
        let slots = {
          let mut core = self.core.rc_deref_mut();
          if !matches!(core.state, SubjectState::Open) {
            return;
          }
          core.state = SubjectState::Errored(err.clone());
          std::mem::take(&mut core.observers)
        };
        for slot in slots {
          let observer = slot.rc_deref_mut().take();
          if let Some(observer) = observer {
            observer.error(err.clone());
          }
        }
      }

      fn complete(self) {
        let slots = {
          let mut core = self.core.rc_deref_mut();
          if !matches!(core.state, SubjectState::Open) {
            return;
          }
          core.state = SubjectState::Completed;
          std::mem::take(&mut core.observers)
        };
        for slot in slots {
          let observer = slot.rc_deref_mut().take();
          if let Some(observer) = observer {
            observer.complete();
          }
        }
      }

      fn is_closed(&self) -> bool {
        !matches!(self.core.rc_deref().state, SubjectState::Open)
      }
    }
  };
}

impl_subject!(Subject, MutRc, LocalSlot, BoxObserver, 'a);
impl_subject!(SubjectThreads, MutArc, ThreadsSlot, BoxObserverThreads; Send);
