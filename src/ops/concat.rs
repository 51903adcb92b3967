use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{
    CounterArc, CounterRc, MutArc, MutRc, RcDeref, RcDerefMut, SharedCounter,
  },
  subscription::{
    DeferredSubscription, DeferredSubscriptionThreads, Subscription,
    TupleSubscription,
  },
  type_hint::TypeHint,
};
use std::collections::VecDeque;

/// Emits everything the first source produces, then everything the second
/// does. The second source is not subscribed before the first completes.
#[derive(Clone)]
pub struct ConcatOp<A, B> {
  first: A,
  second: B,
}

#[derive(Clone)]
pub struct ConcatOpThreads<A, B> {
  first: A,
  second: B,
}

pub struct ConcatFirstObserver<O, B, D> {
  observer: Option<O>,
  second: Option<B>,
  second_slot: D,
}

macro_rules! impl_concat_op {
  ($name: ident, $deferred: ident) => {
    impl<A, B> $name<A, B> {
      #[inline]
      pub(crate) fn new(first: A, second: B) -> Self {
        Self { first, second }
      }
    }

    impl<Item, Err, O, A, B, AU, BU> Observable<Item, Err, O> for $name<A, B>
    where
      O: Observer<Item, Err>,
      A: Observable<
        Item,
        Err,
        ConcatFirstObserver<O, B, $deferred<BU>>,
        Unsub = AU,
      >,
      B: Observable<Item, Err, O, Unsub = BU>,
      AU: Subscription,
      BU: Subscription,
    {
      type Unsub = TupleSubscription<$deferred<AU>, $deferred<BU>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let first_slot = $deferred::<AU>::default();
        let second_slot = $deferred::<BU>::default();
        let first_unsub = self.first.actual_subscribe(ConcatFirstObserver {
          observer: Some(observer),
          second: Some(self.second),
          second_slot: second_slot.clone(),
        });
        first_slot.set(first_unsub);
        TupleSubscription::new(first_slot, second_slot)
      }
    }

    impl<Item, Err, A, B> ObservableExt<Item, Err> for $name<A, B>
    where
      A: ObservableExt<Item, Err>,
      B: ObservableExt<Item, Err>,
    {
    }

    impl<Item, Err, O, B, BU> Observer<Item, Err>
      for ConcatFirstObserver<O, B, $deferred<BU>>
    where
      O: Observer<Item, Err>,
      B: Observable<Item, Err, O, Unsub = BU>,
      BU: Subscription,
    {
      fn next(&mut self, value: Item) {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(value);
        }
      }

      fn error(self, err: Err) {
        if let Some(observer) = self.observer {
          observer.error(err);
        }
      }

      /// The handoff: the first source is done, the downstream observer
      /// moves on to the second source unchanged.
      fn complete(mut self) {
        if let (Some(observer), Some(second)) =
          (self.observer.take(), self.second.take())
        {
          let unsub = second.actual_subscribe(observer);
          self.second_slot.set(unsub);
        }
      }

      fn is_closed(&self) -> bool {
        self.observer.as_ref().map_or(true, Observer::is_closed)
      }
    }
  };
}

impl_concat_op!(ConcatOp, DeferredSubscription);
impl_concat_op!(ConcatOpThreads, DeferredSubscriptionThreads);

// ---------------------------------------------------------------------------
// Sequential flattening with a trampoline
// ---------------------------------------------------------------------------

/// Shared state of `concat_all` / `concat_iter`: the pending-source queue,
/// the single-active-inner flag, and the current inner subscription.
struct ConcatState<Src, O, IU, OS> {
  observer: Option<O>,
  queue: VecDeque<Src>,
  active: bool,
  outer_done: bool,
  inner_sub: Option<IU>,
  outer_sub: Option<OS>,
}

/// Sink for one inner source of a sequential flatten.
pub struct ConcatInnerObserver<St, C> {
  state: St,
  wip: C,
}

/// Sink for the outer observable of `concat_all`.
///
/// Draining and error delivery need the inner element and subscription
/// types, which this impl never names, so both go through pointers minted
/// inside `actual_subscribe`.
pub struct ConcatAllOuterObserver<St, C, Err> {
  state: St,
  wip: C,
  drain: fn(&St, &C),
  fail: fn(&St, Err),
}

/// Disposes the downstream half of a sequential flatten.
pub struct ConcatHandle<St> {
  state: St,
}

macro_rules! impl_concat_drain {
  ($drain: ident, $rc: ident, $counter: ident) => {
    /// The trampoline: exactly one caller drains at a time. Anyone
    /// arriving while a drain pass runs bumps the counter and leaves; the
    /// active drainer keeps looping until the counter comes back down.
    /// Inner completions re-enter through here, so arbitrarily long
    /// source chains run in a loop instead of growing the call stack.
    fn $drain<Item, Err, Src, O, IU, OS>(
      state: &$rc<ConcatState<Src, O, IU, OS>>, wip: &$counter,
    ) where
      O: Observer<Item, Err>,
      Src: Observable<
        Item,
        Err,
        ConcatInnerObserver<$rc<ConcatState<Src, O, IU, OS>>, $counter>,
        Unsub = IU,
      >,
      IU: Subscription,
      OS: Subscription,
    {
      enum Step<Src, O> {
        Subscribe(Src),
        Complete(O),
        Idle,
      }

      if wip.incr() != 0 {
        return;
      }
      loop {
        let step = {
          let mut s = state.rc_deref_mut();
          if s.observer.is_none() {
            s.queue.clear();
            Step::Idle
          } else if !s.active {
            if let Some(src) = s.queue.pop_front() {
              s.active = true;
              Step::Subscribe(src)
            } else if s.outer_done {
              match s.observer.take() {
                Some(observer) => Step::Complete(observer),
                None => Step::Idle,
              }
            } else {
              Step::Idle
            }
          } else {
            Step::Idle
          }
        };
        match step {
          Step::Subscribe(src) => {
            let unsub = src.actual_subscribe(ConcatInnerObserver {
              state: state.clone(),
              wip: wip.clone(),
            });
            // store-then-check: the inner may have settled synchronously
            // during its own subscribe
            let stale = {
              let mut s = state.rc_deref_mut();
              if s.active && s.observer.is_some() {
                s.inner_sub = Some(unsub);
                None
              } else {
                Some(unsub)
              }
            };
            if let Some(stale) = stale {
              stale.unsubscribe();
            }
          }
          Step::Complete(observer) => observer.complete(),
          Step::Idle => {}
        }
        if wip.decr() == 1 {
          break;
        }
      }
    }

    impl<Item, Err, O, Src, IU, OS> Observer<Item, Err>
      for ConcatInnerObserver<$rc<ConcatState<Src, O, IU, OS>>, $counter>
    where
      O: Observer<Item, Err>,
      Src: Observable<
        Item,
        Err,
        ConcatInnerObserver<$rc<ConcatState<Src, O, IU, OS>>, $counter>,
        Unsub = IU,
      >,
      IU: Subscription,
      OS: Subscription,
    {
      fn next(&mut self, value: Item) {
        if let Some(observer) = self.state.rc_deref_mut().observer.as_mut() {
          observer.next(value);
        }
      }

      fn error(self, err: Err) {
        let (observer, outer_sub) = {
          let mut s = self.state.rc_deref_mut();
          s.queue.clear();
          s.inner_sub = None;
          (s.observer.take(), s.outer_sub.take())
        };
        if let Some(outer_sub) = outer_sub {
          outer_sub.unsubscribe();
        }
        if let Some(observer) = observer {
          observer.error(err);
        }
      }

      fn complete(self) {
        {
          let mut s = self.state.rc_deref_mut();
          s.active = false;
          s.inner_sub = None;
        }
        $drain::<Item, Err, Src, O, IU, OS>(&self.state, &self.wip);
      }

      fn is_closed(&self) -> bool {
        self
          .state
          .rc_deref()
          .observer
          .as_ref()
          .map_or(true, Observer::is_closed)
      }
    }

    impl<Err, Src, O, IU, OS> Observer<Src, Err>
      for ConcatAllOuterObserver<$rc<ConcatState<Src, O, IU, OS>>, $counter, Err>
    {
      fn next(&mut self, inner: Src) {
        {
          let mut s = self.state.rc_deref_mut();
          if s.observer.is_none() {
            return;
          }
          s.queue.push_back(inner);
        }
        (self.drain)(&self.state, &self.wip);
      }

      fn error(self, err: Err) { (self.fail)(&self.state, err) }

      fn complete(self) {
        self.state.rc_deref_mut().outer_done = true;
        (self.drain)(&self.state, &self.wip);
      }

      fn is_closed(&self) -> bool {
        self.state.rc_deref().observer.is_none()
      }
    }

    impl<Src, O, IU, OS> Subscription
      for ConcatHandle<$rc<ConcatState<Src, O, IU, OS>>>
    where
      IU: Subscription,
      OS: Subscription,
    {
      fn unsubscribe(self) {
        let (inner_sub, outer_sub) = {
          let mut s = self.state.rc_deref_mut();
          s.observer.take();
          s.queue.clear();
          (s.inner_sub.take(), s.outer_sub.take())
        };
        if let Some(inner_sub) = inner_sub {
          inner_sub.unsubscribe();
        }
        if let Some(outer_sub) = outer_sub {
          outer_sub.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool {
        self.state.rc_deref().observer.is_none()
      }
    }
  };
}

impl_concat_drain!(concat_drain_local, MutRc, CounterRc);
impl_concat_drain!(concat_drain_threads, MutArc, CounterArc);

/// Subscribes the inner observables one at a time, in arrival order.
#[derive(Clone)]
pub struct ConcatAllOp<S, Inner> {
  source: S,
  _hint: TypeHint<Inner>,
}

#[derive(Clone)]
pub struct ConcatAllOpThreads<S, Inner> {
  source: S,
  _hint: TypeHint<Inner>,
}

macro_rules! impl_concat_all_op {
  ($name: ident, $rc: ident, $counter: ident, $deferred: ident,
   $drain: ident) => {
    impl<S, Inner> $name<S, Inner> {
      #[inline]
      pub(crate) fn new(source: S) -> Self {
        Self { source, _hint: TypeHint::new() }
      }
    }

    impl<Item, Err, O, S, Inner, IU, SU> Observable<Item, Err, O>
      for $name<S, Inner>
    where
      O: Observer<Item, Err>,
      Inner: Observable<
        Item,
        Err,
        ConcatInnerObserver<
          $rc<ConcatState<Inner, O, IU, $deferred<SU>>>,
          $counter,
        >,
        Unsub = IU,
      >,
      S: Observable<
        Inner,
        Err,
        ConcatAllOuterObserver<
          $rc<ConcatState<Inner, O, IU, $deferred<SU>>>,
          $counter,
          Err,
        >,
        Unsub = SU,
      >,
      IU: Subscription,
      SU: Subscription,
    {
      type Unsub = TupleSubscription<
        $deferred<SU>,
        ConcatHandle<$rc<ConcatState<Inner, O, IU, $deferred<SU>>>>,
      >;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let outer_slot = $deferred::<SU>::default();
        let state = $rc::own(ConcatState {
          observer: Some(observer),
          queue: VecDeque::new(),
          active: false,
          outer_done: false,
          inner_sub: None,
          outer_sub: Some(outer_slot.clone()),
        });
        let wip = $counter::counter(0);
        let outer_unsub =
          self.source.actual_subscribe(ConcatAllOuterObserver {
            state: state.clone(),
            wip,
            drain: $drain::<Item, Err, Inner, O, IU, $deferred<SU>>,
            fail: |state, err: Err| {
              let (observer, inner_sub) = {
                let mut s = state.rc_deref_mut();
                s.queue.clear();
                (s.observer.take(), s.inner_sub.take())
              };
              if let Some(inner_sub) = inner_sub {
                inner_sub.unsubscribe();
              }
              if let Some(observer) = observer {
                observer.error(err);
              }
            },
          });
        outer_slot.set(outer_unsub);
        TupleSubscription::new(outer_slot, ConcatHandle { state })
      }
    }

    impl<Item, Err, S, Inner> ObservableExt<Item, Err> for $name<S, Inner>
    where
      S: ObservableExt<Inner, Err>,
      Inner: ObservableExt<Item, Err>,
    {
    }
  };
}

impl_concat_all_op!(
  ConcatAllOp,
  MutRc,
  CounterRc,
  DeferredSubscription,
  concat_drain_local
);
impl_concat_all_op!(
  ConcatAllOpThreads,
  MutArc,
  CounterArc,
  DeferredSubscriptionThreads,
  concat_drain_threads
);

/// Concatenates a collection of same-typed sources known up front.
///
/// The whole collection is queued at subscribe time and drained through
/// the trampoline, so chains of tens of thousands of sources run without
/// stack growth.
pub fn concat_iter<S, I>(sources: I) -> ConcatIterOp<S>
where
  I: IntoIterator<Item = S>,
{
  ConcatIterOp { sources: sources.into_iter().collect() }
}

pub fn concat_iter_threads<S, I>(sources: I) -> ConcatIterOpThreads<S>
where
  I: IntoIterator<Item = S>,
{
  ConcatIterOpThreads { sources: sources.into_iter().collect() }
}

#[derive(Clone)]
pub struct ConcatIterOp<S> {
  sources: VecDeque<S>,
}

#[derive(Clone)]
pub struct ConcatIterOpThreads<S> {
  sources: VecDeque<S>,
}

macro_rules! impl_concat_iter_op {
  ($name: ident, $rc: ident, $counter: ident, $drain: ident) => {
    impl<S> $name<S> {
      /// Appends another source to the plan instead of nesting a second
      /// concat around this one.
      pub fn concat(mut self, source: S) -> Self {
        self.sources.push_back(source);
        self
      }
    }

    impl<Item, Err, O, Src, IU> Observable<Item, Err, O> for $name<Src>
    where
      O: Observer<Item, Err>,
      Src: Observable<
        Item,
        Err,
        ConcatInnerObserver<$rc<ConcatState<Src, O, IU, ()>>, $counter>,
        Unsub = IU,
      >,
      IU: Subscription,
    {
      type Unsub = ConcatHandle<$rc<ConcatState<Src, O, IU, ()>>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let state = $rc::own(ConcatState {
          observer: Some(observer),
          queue: self.sources,
          active: false,
          outer_done: true,
          inner_sub: None,
          outer_sub: Some(()),
        });
        let wip = $counter::counter(0);
        $drain::<Item, Err, Src, O, IU, ()>(&state, &wip);
        ConcatHandle { state }
      }
    }

    impl<Item, Err, Src> ObservableExt<Item, Err> for $name<Src> where
      Src: ObservableExt<Item, Err>
    {
    }
  };
}

impl_concat_iter_op!(ConcatIterOp, MutRc, CounterRc, concat_drain_local);
impl_concat_iter_op!(
  ConcatIterOpThreads,
  MutArc,
  CounterArc,
  concat_drain_threads
);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn binary_concat_orders_sources() {
    let mut values = vec![];
    let mut completed = 0;
    observable::from_iter(0..3)
      .concat(observable::from_iter(3..6))
      .on_complete(|| completed += 1)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(completed, 1);
  }

  #[test]
  fn second_source_waits_for_first_completion() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut first = Subject::default();
    let mut second = Subject::default();
    {
      let out = out.clone();
      first
        .clone()
        .concat(second.clone())
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    first.next(1);
    second.next(100); // not subscribed yet: dropped
    assert_eq!(second.subscribed_size(), 0);
    Observer::<i32, ()>::complete(first);
    assert_eq!(second.subscribed_size(), 1);
    second.next(2);
    assert_eq!(*out.borrow(), vec![1, 2]);
  }

  #[test]
  fn concat_iter_is_stack_safe_for_huge_chains() {
    let mut count = 0usize;
    let mut completed = 0;
    observable::concat_iter((0..20_000).map(observable::of))
      .on_complete(|| completed += 1)
      .subscribe(|_| count += 1);
    assert_eq!(count, 20_000);
    assert_eq!(completed, 1);
  }

  #[test]
  fn concat_iter_extraction_appends_instead_of_nesting() {
    let mut values = vec![];
    observable::concat_iter(vec![observable::of(1), observable::of(2)])
      .concat(observable::of(3))
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![1, 2, 3]);
  }

  #[test]
  fn concat_all_runs_inners_strictly_in_arrival_order() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut outer: Subject<Subject<i32, ()>, ()> = Subject::default();
    let mut inner1: Subject<i32, ()> = Subject::default();
    let mut inner2: Subject<i32, ()> = Subject::default();
    {
      let out = out.clone();
      outer
        .clone()
        .concat_all()
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    outer.next(inner1.clone());
    outer.next(inner2.clone());
    // only the first inner is live
    assert_eq!(inner1.subscribed_size(), 1);
    assert_eq!(inner2.subscribed_size(), 0);
    inner1.next(1);
    inner2.next(100); // buffered source, not subscribed: dropped
    Observer::<i32, ()>::complete(inner1);
    assert_eq!(inner2.subscribed_size(), 1);
    inner2.next(2);
    assert_eq!(*out.borrow(), vec![1, 2]);
  }

  #[test]
  fn concat_all_completes_after_outer_and_queue_drain() {
    let completed = Rc::new(RefCell::new(false));
    let mut outer: Subject<Subject<i32, ()>, ()> = Subject::default();
    let mut inner: Subject<i32, ()> = Subject::default();
    {
      let completed = completed.clone();
      outer
        .clone()
        .concat_all()
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(|_| {});
    }
    outer.next(inner.clone());
    Observer::<Subject<i32, ()>, ()>::complete(outer);
    assert!(!*completed.borrow());
    inner.next(1);
    Observer::<i32, ()>::complete(inner);
    assert!(*completed.borrow());
  }

  #[test]
  fn inner_error_skips_the_rest() {
    let errors = Rc::new(RefCell::new(0));
    let mut outer: Subject<Subject<i32, &str>, &str> = Subject::default();
    let inner1: Subject<i32, &str> = Subject::default();
    let inner2: Subject<i32, &str> = Subject::default();
    {
      let errors = errors.clone();
      outer
        .clone()
        .concat_all()
        .on_error(move |_| *errors.borrow_mut() += 1)
        .subscribe(|_| {});
    }
    outer.next(inner1.clone());
    outer.next(inner2.clone());
    Observer::<i32, &str>::error(inner1, "boom");
    assert_eq!(*errors.borrow(), 1);
    assert_eq!(inner2.subscribed_size(), 0);
    assert_eq!(outer.subscribed_size(), 0);
  }
}
