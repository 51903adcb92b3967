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

/// Drops source values until the notifier emits, then mirrors the source.
///
/// The first notifier value opens the gate permanently and retires the
/// notifier subscription; a notifier error propagates; notifier completion
/// without a value leaves the gate closed for good.
#[derive(Clone)]
pub struct SkipUntilOp<S, N, NotifyItem> {
  source: S,
  notifier: N,
  _hint: TypeHint<NotifyItem>,
}

#[derive(Clone)]
pub struct SkipUntilOpThreads<S, N, NotifyItem> {
  source: S,
  notifier: N,
  _hint: TypeHint<NotifyItem>,
}

struct SkipUntilState<O> {
  observer: Option<O>,
  open: bool,
}

pub struct SkipUntilSourceObserver<St> {
  state: St,
}

/// The notifier side never names the data item type; terminal delivery to
/// the downstream observer goes through a function pointer minted where
/// that type was known.
pub struct SkipUntilNotifierObserver<St, U, O, Err> {
  state: St,
  own_sub: U,
  error_fn: fn(O, Err),
}

macro_rules! impl_skip_until_op {
  ($name: ident, $rc: ident, $deferred: ident) => {
    impl<S, N, NotifyItem> $name<S, N, NotifyItem> {
      #[inline]
      pub(crate) fn new(source: S, notifier: N) -> Self {
        Self { source, notifier, _hint: TypeHint::new() }
      }
    }

    impl<Item, NotifyItem, Err, O, S, N, NU> Observable<Item, Err, O>
      for $name<S, N, NotifyItem>
    where
      O: Observer<Item, Err>,
      S: Observable<
        Item,
        Err,
        SkipUntilSourceObserver<$rc<SkipUntilState<O>>>,
      >,
      N: Observable<
        NotifyItem,
        Err,
        SkipUntilNotifierObserver<
          $rc<SkipUntilState<O>>,
          $deferred<NU>,
          O,
          Err,
        >,
        Unsub = NU,
      >,
      NU: Subscription,
    {
      type Unsub = TupleSubscription<S::Unsub, $deferred<NU>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let state =
          $rc::own(SkipUntilState { observer: Some(observer), open: false });
        let notifier_slot = $deferred::<NU>::default();

        // notifier first so a synchronous notifier opens the gate before
        // any data is pushed
        let notifier_unsub =
          self.notifier.actual_subscribe(SkipUntilNotifierObserver {
            state: state.clone(),
            own_sub: notifier_slot.clone(),
            error_fn: |observer: O, err: Err| observer.error(err),
          });
        notifier_slot.set(notifier_unsub);

        let source_unsub = self
          .source
          .actual_subscribe(SkipUntilSourceObserver { state });
        TupleSubscription::new(source_unsub, notifier_slot)
      }
    }

    impl<Item, NotifyItem, Err, S, N> ObservableExt<Item, Err>
      for $name<S, N, NotifyItem>
    where
      S: ObservableExt<Item, Err>,
    {
    }
  };
}

impl_skip_until_op!(SkipUntilOp, MutRc, DeferredSubscription);
impl_skip_until_op!(SkipUntilOpThreads, MutArc, DeferredSubscriptionThreads);

macro_rules! impl_skip_until_observers {
  ($rc: ident) => {
    impl<Item, Err, O> Observer<Item, Err>
      for SkipUntilSourceObserver<$rc<SkipUntilState<O>>>
    where
      O: Observer<Item, Err>,
    {
      fn next(&mut self, value: Item) {
        let mut state = self.state.rc_deref_mut();
        if state.open {
          if let Some(observer) = state.observer.as_mut() {
            observer.next(value);
          }
        }
      }

      fn error(self, err: Err) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          observer.error(err);
        }
      }

      fn complete(self) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          observer.complete();
        }
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

    impl<NotifyItem, Err, O, U> Observer<NotifyItem, Err>
      for SkipUntilNotifierObserver<$rc<SkipUntilState<O>>, U, O, Err>
    where
      U: Subscription + Clone,
    {
      fn next(&mut self, _value: NotifyItem) {
        let first = {
          let mut state = self.state.rc_deref_mut();
          let first = !state.open;
          state.open = true;
          first
        };
        if first {
          self.own_sub.clone().unsubscribe();
        }
      }

      fn error(self, err: Err) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          (self.error_fn)(observer, err);
        }
      }

      fn complete(self) {
        // the gate stays closed forever; only this subscription retires
        self.own_sub.unsubscribe();
      }

      fn is_closed(&self) -> bool {
        let state = self.state.rc_deref();
        state.open || state.observer.is_none()
      }
    }
  };
}

impl_skip_until_observers!(MutRc);
impl_skip_until_observers!(MutArc);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn gate_opens_on_first_notifier_value() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut source: Subject<i32, ()> = Subject::default();
    let mut notifier = Subject::default();
    {
      let out = out.clone();
      source
        .clone()
        .skip_until(notifier.clone())
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    source.next(1);
    source.next(2);
    notifier.next(());
    source.next(3);
    source.next(4);
    assert_eq!(*out.borrow(), vec![3, 4]);
  }

  #[test]
  fn synchronous_notifier_passes_everything() {
    let mut out = vec![];
    observable::from_iter(0..3)
      .skip_until(observable::of(()))
      .subscribe(|v| out.push(v));
    assert_eq!(out, vec![0, 1, 2]);
  }

  #[test]
  fn notifier_that_completes_empty_keeps_gate_closed() {
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let mut source = Subject::default();
    let notifier: Subject<(), ()> = Subject::default();
    {
      let out = out.clone();
      let completed = completed.clone();
      source
        .clone()
        .skip_until(notifier.clone())
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    Observer::<(), ()>::complete(notifier);
    source.next(1);
    Observer::<i32, ()>::complete(source);
    assert!(out.borrow().is_empty());
    assert!(*completed.borrow());
  }

  #[test]
  fn notifier_error_propagates() {
    let errors = Rc::new(RefCell::new(0));
    let source = Subject::default();
    let notifier = Subject::default();
    {
      let errors = errors.clone();
      source
        .clone()
        .skip_until(notifier.clone())
        .on_error(move |_: &&str| *errors.borrow_mut() += 1)
        .subscribe(|_: i32| {});
    }
    Observer::<(), &str>::error(notifier, "boom");
    assert_eq!(*errors.borrow(), 1);
  }
}
