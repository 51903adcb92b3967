use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{CounterArc, CounterRc, MutArc, MutRc, RcDeref, RcDerefMut, SharedCounter},
  subscription::{
    DeferredSubscription, DeferredSubscriptionThreads, Subscription,
    TupleSubscription,
  },
};

/// Sentinel index meaning "no candidate has claimed the race yet".
const NO_WINNER: usize = usize::MAX;

/// Races two sources; the first to signal anything (value, error or
/// completion) becomes the output and the other is disposed, having
/// contributed nothing.
///
/// The winner is decided by a first-write-wins swap on a shared index.
/// Loser subscriptions are pre-registered in single-assignment slots, so a
/// candidate that wins while its rival is still inside `actual_subscribe`
/// disposes the rival the moment its subscription lands in the slot.
#[derive(Clone)]
pub struct AmbOp<A, B> {
  a: A,
  b: B,
}

#[derive(Clone)]
pub struct AmbOpThreads<A, B> {
  a: A,
  b: B,
}

pub struct AmbObserver<Sh, C, U> {
  index: usize,
  observer: Sh,
  winner: C,
  rival_sub: U,
}

macro_rules! impl_amb_op {
  ($name: ident, $rc: ident, $counter: ident, $deferred: ident) => {
    impl<A, B> $name<A, B> {
      #[inline]
      pub(crate) fn new(a: A, b: B) -> Self { Self { a, b } }
    }

    impl<Item, Err, O, A, B, AU, BU> Observable<Item, Err, O> for $name<A, B>
    where
      O: Observer<Item, Err>,
      A: Observable<
        Item,
        Err,
        AmbObserver<$rc<Option<O>>, $counter, $deferred<BU>>,
        Unsub = AU,
      >,
      B: Observable<
        Item,
        Err,
        AmbObserver<$rc<Option<O>>, $counter, $deferred<AU>>,
        Unsub = BU,
      >,
      AU: Subscription,
      BU: Subscription,
    {
      type Unsub = TupleSubscription<$deferred<AU>, $deferred<BU>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let observer = $rc::own(Some(observer));
        let winner = $counter::counter(NO_WINNER);
        let a_slot = $deferred::<AU>::default();
        let b_slot = $deferred::<BU>::default();

        let a_unsub = self.a.actual_subscribe(AmbObserver {
          index: 0,
          observer: observer.clone(),
          winner: winner.clone(),
          rival_sub: b_slot.clone(),
        });
        a_slot.set(a_unsub);

        let b_unsub = self.b.actual_subscribe(AmbObserver {
          index: 1,
          observer,
          winner,
          rival_sub: a_slot.clone(),
        });
        b_slot.set(b_unsub);

        TupleSubscription::new(a_slot, b_slot)
      }
    }

    impl<Item, Err, A, B> ObservableExt<Item, Err> for $name<A, B>
    where
      A: ObservableExt<Item, Err>,
      B: ObservableExt<Item, Err>,
    {
    }

    impl<Item, Err, O, U> Observer<Item, Err>
      for AmbObserver<$rc<Option<O>>, $counter, U>
    where
      O: Observer<Item, Err>,
      U: Subscription + Clone,
    {
      fn next(&mut self, value: Item) {
        if amb_claim(&self.winner, self.index, || {
          self.rival_sub.clone().unsubscribe()
        }) {
          if let Some(observer) = self.observer.rc_deref_mut().as_mut() {
            observer.next(value);
          }
        }
      }

      fn error(self, err: Err) {
        if amb_claim(&self.winner, self.index, || {
          self.rival_sub.clone().unsubscribe()
        }) {
          let observer = self.observer.rc_deref_mut().take();
          if let Some(observer) = observer {
            observer.error(err);
          }
        }
      }

      fn complete(self) {
        if amb_claim(&self.winner, self.index, || {
          self.rival_sub.clone().unsubscribe()
        }) {
          let observer = self.observer.rc_deref_mut().take();
          if let Some(observer) = observer {
            observer.complete();
          }
        }
      }

      fn is_closed(&self) -> bool {
        let winner = self.winner.get();
        if winner != NO_WINNER && winner != self.index {
          return true;
        }
        self.observer.rc_deref().as_ref().map_or(true, Observer::is_closed)
      }
    }
  };
}

impl_amb_op!(AmbOp, MutRc, CounterRc, DeferredSubscription);
impl_amb_op!(AmbOpThreads, MutArc, CounterArc, DeferredSubscriptionThreads);

/// First signal wins: returns whether `index` is the winning candidate,
/// running `silence_rivals` exactly once on the claiming transition.
fn amb_claim<C: SharedCounter>(
  winner: &C, index: usize, silence_rivals: impl FnOnce(),
) -> bool {
  if winner.compare_swap(NO_WINNER, index) {
    silence_rivals();
    true
  } else {
    winner.get() == index
  }
}

/// Races a homogeneous collection of sources.
///
/// No candidates completes immediately; one candidate still runs through
/// the coordinator, which settles on its first signal with nothing to
/// silence.
pub fn amb_iter<S, I>(sources: I) -> AmbManyOp<S>
where
  I: IntoIterator<Item = S>,
{
  AmbManyOp { sources: sources.into_iter().collect() }
}

pub fn amb_iter_threads<S, I>(sources: I) -> AmbManyOpThreads<S>
where
  I: IntoIterator<Item = S>,
{
  AmbManyOpThreads { sources: sources.into_iter().collect() }
}

pub struct AmbManyOp<S> {
  sources: Vec<S>,
}

pub struct AmbManyOpThreads<S> {
  sources: Vec<S>,
}

pub struct AmbManyObserver<Sh, C, U> {
  index: usize,
  observer: Sh,
  winner: C,
  slots: Vec<U>,
}

/// Composite over every candidate's pre-registered subscription slot.
pub struct AmbManySubscription<D> {
  slots: Vec<D>,
}

impl<D: Subscription> Subscription for AmbManySubscription<D> {
  fn unsubscribe(self) {
    for slot in self.slots {
      slot.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool {
    self.slots.iter().all(Subscription::is_closed)
  }
}

macro_rules! impl_amb_many_op {
  ($name: ident, $rc: ident, $counter: ident, $deferred: ident) => {
    impl<Item, Err, O, S, SU> Observable<Item, Err, O> for $name<S>
    where
      O: Observer<Item, Err>,
      S: Observable<
        Item,
        Err,
        AmbManyObserver<$rc<Option<O>>, $counter, $deferred<SU>>,
        Unsub = SU,
      >,
      SU: Subscription,
    {
      type Unsub = AmbManySubscription<$deferred<SU>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        if self.sources.is_empty() {
          observer.complete();
          return AmbManySubscription { slots: vec![] };
        }
        let observer = $rc::own(Some(observer));
        let winner = $counter::counter(NO_WINNER);
        let slots: Vec<$deferred<SU>> =
          self.sources.iter().map(|_| $deferred::default()).collect();
        for (index, source) in self.sources.into_iter().enumerate() {
          let unsub = source.actual_subscribe(AmbManyObserver {
            index,
            observer: observer.clone(),
            winner: winner.clone(),
            slots: slots.clone(),
          });
          slots[index].set(unsub);
        }
        AmbManySubscription { slots }
      }
    }

    impl<Item, Err, S> ObservableExt<Item, Err> for $name<S> where
      S: ObservableExt<Item, Err>
    {
    }

    impl<Item, Err, O, U> Observer<Item, Err>
      for AmbManyObserver<$rc<Option<O>>, $counter, U>
    where
      O: Observer<Item, Err>,
      U: Subscription + Clone,
    {
      fn next(&mut self, value: Item) {
        let index = self.index;
        let slots = &self.slots;
        if amb_claim(&self.winner, index, || silence_all(slots, index)) {
          if let Some(observer) = self.observer.rc_deref_mut().as_mut() {
            observer.next(value);
          }
        }
      }

      fn error(self, err: Err) {
        if amb_claim(&self.winner, self.index, || {
          silence_all(&self.slots, self.index)
        }) {
          let observer = self.observer.rc_deref_mut().take();
          if let Some(observer) = observer {
            observer.error(err);
          }
        }
      }

      fn complete(self) {
        if amb_claim(&self.winner, self.index, || {
          silence_all(&self.slots, self.index)
        }) {
          let observer = self.observer.rc_deref_mut().take();
          if let Some(observer) = observer {
            observer.complete();
          }
        }
      }

      fn is_closed(&self) -> bool {
        let winner = self.winner.get();
        if winner != NO_WINNER && winner != self.index {
          return true;
        }
        self.observer.rc_deref().as_ref().map_or(true, Observer::is_closed)
      }
    }
  };
}

fn silence_all<U: Subscription + Clone>(slots: &[U], keep: usize) {
  for (i, slot) in slots.iter().enumerate() {
    if i != keep {
      slot.clone().unsubscribe();
    }
  }
}

impl_amb_many_op!(AmbManyOp, MutRc, CounterRc, DeferredSubscription);
impl_amb_many_op!(
  AmbManyOpThreads,
  MutArc,
  CounterArc,
  DeferredSubscriptionThreads
);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn first_emitter_wins() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut fast: Subject<i32, ()> = Subject::default();
    let mut slow = Subject::default();
    {
      let out = out.clone();
      fast
        .clone()
        .amb(slow.clone())
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    fast.next(1);
    slow.next(100);
    fast.next(2);
    assert_eq!(*out.borrow(), vec![1, 2]);
  }

  #[test]
  fn empty_completion_beats_later_values() {
    // the empty source settles the race with its completion; the value
    // source is silenced entirely
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let mut late: Subject<i32, std::convert::Infallible> = Subject::default();
    {
      let out = out.clone();
      let completed = completed.clone();
      observable::empty()
        .amb(late.clone())
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(move |v: i32| out.borrow_mut().push(v));
    }
    late.next(1);
    assert!(*completed.borrow());
    assert!(out.borrow().is_empty());
  }

  #[test]
  fn loser_subscription_is_disposed() {
    let mut fast: Subject<i32, ()> = Subject::default();
    let slow = Subject::default();
    fast.clone().amb(slow.clone()).subscribe(|_: i32| {});
    assert_eq!(slow.subscribed_size(), 1);
    fast.next(1);
    assert_eq!(slow.subscribed_size(), 0);
  }

  #[test]
  fn amb_iter_races_a_collection() {
    let out = Rc::new(RefCell::new(vec![]));
    let subjects: Vec<Subject<i32, ()>> =
      (0..5).map(|_| Subject::default()).collect();
    {
      let out = out.clone();
      observable::amb_iter(subjects.clone())
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    let mut third = subjects[2].clone();
    third.next(30);
    let mut first = subjects[0].clone();
    first.next(10);
    third.next(31);
    assert_eq!(*out.borrow(), vec![30, 31]);
    assert_eq!(subjects[0].subscribed_size(), 0);
    assert_eq!(subjects[2].subscribed_size(), 1);
  }

  #[test]
  fn amb_iter_of_nothing_completes() {
    let completed = Rc::new(RefCell::new(false));
    {
      let completed = completed.clone();
      observable::amb_iter(Vec::<Subject<i32, ()>>::new())
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(|_| {});
    }
    assert!(*completed.borrow());
  }
}
