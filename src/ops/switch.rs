use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::{
    DeferredSubscription, DeferredSubscriptionThreads, Subscription,
    TupleSubscription,
  },
  type_hint::TypeHint,
};

/// Flattens an observable of observables by always forwarding from the
/// most recently arrived inner observable.
///
/// Every shared field lives under one lock. Each arriving inner bumps the
/// epoch counter and replaces the current inner subscription; an inner
/// sink only forwards while its remembered epoch is still current, so
/// signals of a superseded inner are dropped even if they are already in
/// flight. Outer completion is deferred while an inner is active and
/// delivered by whichever inner finishes last.
#[derive(Clone)]
pub struct SwitchOp<S, Inner> {
  source: S,
  _hint: TypeHint<Inner>,
}

#[derive(Clone)]
pub struct SwitchOpThreads<S, Inner> {
  source: S,
  _hint: TypeHint<Inner>,
}

struct SwitchState<O, IU> {
  observer: Option<O>,
  epoch: usize,
  has_inner: bool,
  outer_done: bool,
  inner_sub: Option<IU>,
}

/// Sink for the outer observable.
///
/// Its `Observer` impl never names the element type of the inner
/// observables, so subscribing an inner and terminal delivery go through
/// function pointers minted inside `actual_subscribe`, where every type is
/// pinned down.
pub struct SwitchOuterObserver<St, OS, Inner, IU, O, Err> {
  state: St,
  outer_sub: OS,
  subscribe_inner: fn(Inner, St, usize, OS) -> IU,
  complete_fn: fn(O),
  error_fn: fn(O, Err),
}

/// Sink for one inner observable; `epoch` is the generation it belongs to.
pub struct SwitchInnerObserver<St, OS> {
  state: St,
  epoch: usize,
  outer_sub: OS,
}

/// Disposes the downstream half of a switch: the sink slot and whatever
/// inner subscription is current.
pub struct SwitchHandle<St> {
  state: St,
}

macro_rules! impl_switch_op {
  ($name: ident, $rc: ident, $deferred: ident) => {
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
        SwitchInnerObserver<$rc<SwitchState<O, IU>>, $deferred<SU>>,
        Unsub = IU,
      >,
      S: Observable<
        Inner,
        Err,
        SwitchOuterObserver<
          $rc<SwitchState<O, IU>>,
          $deferred<SU>,
          Inner,
          IU,
          O,
          Err,
        >,
        Unsub = SU,
      >,
      IU: Subscription,
      SU: Subscription,
    {
      type Unsub =
        TupleSubscription<$deferred<SU>, SwitchHandle<$rc<SwitchState<O, IU>>>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let state = $rc::own(SwitchState {
          observer: Some(observer),
          epoch: 0,
          has_inner: false,
          outer_done: false,
          inner_sub: None,
        });
        let outer_slot = $deferred::<SU>::default();
        let outer_unsub = self.source.actual_subscribe(SwitchOuterObserver {
          state: state.clone(),
          outer_sub: outer_slot.clone(),
          subscribe_inner: |inner: Inner, state, epoch, outer_sub| {
            inner.actual_subscribe(SwitchInnerObserver {
              state,
              epoch,
              outer_sub,
            })
          },
          complete_fn: |observer: O| observer.complete(),
          error_fn: |observer: O, err: Err| observer.error(err),
        });
        outer_slot.set(outer_unsub);
        TupleSubscription::new(outer_slot, SwitchHandle { state })
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

impl_switch_op!(SwitchOp, MutRc, DeferredSubscription);
impl_switch_op!(SwitchOpThreads, MutArc, DeferredSubscriptionThreads);

macro_rules! impl_switch_observers {
  ($rc: ident) => {
    impl<Inner, Err, O, OS, IU> Observer<Inner, Err>
      for SwitchOuterObserver<$rc<SwitchState<O, IU>>, OS, Inner, IU, O, Err>
    where
      OS: Subscription + Clone,
      IU: Subscription,
    {
      fn next(&mut self, inner: Inner) {
        let my_epoch;
        let displaced;
        {
          let mut state = self.state.rc_deref_mut();
          if state.observer.is_none() {
            return;
          }
          state.epoch += 1;
          my_epoch = state.epoch;
          state.has_inner = true;
          displaced = state.inner_sub.take();
        }
        if let Some(displaced) = displaced {
          displaced.unsubscribe();
        }
        let unsub = (self.subscribe_inner)(
          inner,
          self.state.clone(),
          my_epoch,
          self.outer_sub.clone(),
        );
        // store-then-check: this inner may have been superseded (or the whole
        // switch disposed) while it was subscribing
        let stale = {
          let mut state = self.state.rc_deref_mut();
          if state.epoch == my_epoch && state.observer.is_some() {
            state.inner_sub = Some(unsub);
            None
          } else {
            Some(unsub)
          }
        };
        if let Some(stale) = stale {
          stale.unsubscribe();
        }
      }

      fn error(self, err: Err) {
        let (observer, displaced) = {
          let mut state = self.state.rc_deref_mut();
          (state.observer.take(), state.inner_sub.take())
        };
        if let Some(displaced) = displaced {
          displaced.unsubscribe();
        }
        if let Some(observer) = observer {
          (self.error_fn)(observer, err);
        }
      }

      fn complete(self) {
        let observer = {
          let mut state = self.state.rc_deref_mut();
          state.outer_done = true;
          if !state.has_inner { state.observer.take() } else { None }
        };
        if let Some(observer) = observer {
          (self.complete_fn)(observer);
        }
      }

      fn is_closed(&self) -> bool { self.state.rc_deref().observer.is_none() }
    }

    impl<Item, Err, O, OS, IU> Observer<Item, Err>
      for SwitchInnerObserver<$rc<SwitchState<O, IU>>, OS>
    where
      O: Observer<Item, Err>,
      OS: Subscription,
    {
      fn next(&mut self, value: Item) {
        let mut state = self.state.rc_deref_mut();
        if state.epoch == self.epoch {
          if let Some(observer) = state.observer.as_mut() {
            observer.next(value);
          }
        }
      }

      fn error(self, err: Err) {
        let observer = {
          let mut state = self.state.rc_deref_mut();
          if state.epoch != self.epoch {
            None
          } else {
            state.inner_sub = None;
            state.observer.take()
          }
        };
        if let Some(observer) = observer {
          self.outer_sub.unsubscribe();
          observer.error(err);
        }
      }

      fn complete(self) {
        let observer = {
          let mut state = self.state.rc_deref_mut();
          if state.epoch != self.epoch {
            None
          } else {
            state.has_inner = false;
            state.inner_sub = None;
            if state.outer_done { state.observer.take() } else { None }
          }
        };
        if let Some(observer) = observer {
          observer.complete();
        }
      }

      fn is_closed(&self) -> bool {
        let state = self.state.rc_deref();
        state.epoch != self.epoch || state.observer.is_none()
      }
    }

    impl<O, IU> Subscription for SwitchHandle<$rc<SwitchState<O, IU>>>
    where
      IU: Subscription,
    {
      fn unsubscribe(self) {
        let displaced = {
          let mut state = self.state.rc_deref_mut();
          state.observer.take();
          // bump the epoch so an inner mid-subscribe sees itself superseded
          state.epoch += 1;
          state.inner_sub.take()
        };
        if let Some(displaced) = displaced {
          displaced.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool { self.state.rc_deref().observer.is_none() }
    }
  };
}

impl_switch_observers!(MutRc);
impl_switch_observers!(MutArc);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn forwards_only_the_latest_inner() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut outer: Subject<Subject<char, ()>, ()> = Subject::default();
    let mut inner1: Subject<char, ()> = Subject::default();
    let mut inner2: Subject<char, ()> = Subject::default();
    {
      let out = out.clone();
      outer
        .clone()
        .switch()
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    outer.next(inner1.clone());
    inner1.next('a');
    outer.next(inner2.clone());
    inner1.next('b'); // stale: inner1 was superseded
    inner2.next('c');
    assert_eq!(*out.borrow(), vec!['a', 'c']);
  }

  #[test]
  fn outer_completion_waits_for_active_inner() {
    let completed = Rc::new(RefCell::new(false));
    let mut outer: Subject<Subject<i32, ()>, ()> = Subject::default();
    let inner: Subject<i32, ()> = Subject::default();
    {
      let completed = completed.clone();
      outer
        .clone()
        .switch()
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(|_| {});
    }
    outer.next(inner.clone());
    Observer::<Subject<i32, ()>, ()>::complete(outer);
    assert!(!*completed.borrow());
    Observer::<i32, ()>::complete(inner);
    assert!(*completed.borrow());
  }

  #[test]
  fn outer_completion_with_no_inner_is_immediate() {
    let completed = Rc::new(RefCell::new(false));
    let outer: Subject<Subject<i32, ()>, ()> = Subject::default();
    {
      let completed = completed.clone();
      outer
        .clone()
        .switch()
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(|_| {});
    }
    Observer::<Subject<i32, ()>, ()>::complete(outer);
    assert!(*completed.borrow());
  }

  #[test]
  fn stale_inner_completion_changes_nothing() {
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let mut outer: Subject<Subject<i32, ()>, ()> = Subject::default();
    let inner1: Subject<i32, ()> = Subject::default();
    let mut inner2: Subject<i32, ()> = Subject::default();
    {
      let out = out.clone();
      let completed = completed.clone();
      outer
        .clone()
        .switch()
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    outer.next(inner1.clone());
    outer.next(inner2.clone());
    Observer::<Subject<i32, ()>, ()>::complete(outer);
    Observer::<i32, ()>::complete(inner1); // stale
    assert!(!*completed.borrow());
    inner2.next(9);
    Observer::<i32, ()>::complete(inner2);
    assert_eq!(*out.borrow(), vec![9]);
    assert!(*completed.borrow());
  }

  #[test]
  fn inner_error_terminates_everything() {
    let errors = Rc::new(RefCell::new(0));
    let mut outer: Subject<Subject<i32, &str>, &str> = Subject::default();
    let inner: Subject<i32, &str> = Subject::default();
    {
      let errors = errors.clone();
      outer
        .clone()
        .switch()
        .on_error(move |_| *errors.borrow_mut() += 1)
        .subscribe(|_| {});
    }
    outer.next(inner.clone());
    Observer::<i32, &str>::error(inner, "boom");
    assert_eq!(*errors.borrow(), 1);
    assert_eq!(outer.subscribed_size(), 0);
  }

  #[test]
  fn switch_map_composes_map_and_switch() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut triggers: Subject<i32, std::convert::Infallible> =
      Subject::default();
    {
      let out = out.clone();
      triggers
        .clone()
        .switch_map(|v| observable::from_iter(v..v + 2))
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    triggers.next(10);
    triggers.next(20);
    assert_eq!(*out.borrow(), vec![10, 11, 20, 21]);
  }
}
