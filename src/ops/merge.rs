use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::TupleSubscription,
};

/// Interleaves two sources into one stream.
///
/// Serialization to the downstream observer goes through the shared sink
/// slot: its lock orders concurrent arrivals, the first error wins, and
/// completion waits for both sides.
#[derive(Clone)]
pub struct MergeOp<A, B> {
  a: A,
  b: B,
}

#[derive(Clone)]
pub struct MergeOpThreads<A, B> {
  a: A,
  b: B,
}

struct MergeState<O> {
  observer: Option<O>,
  live_sources: usize,
}

macro_rules! impl_merge_op {
  ($name: ident, $rc: ident) => {
    impl<A, B> $name<A, B> {
      #[inline]
      pub(crate) fn new(a: A, b: B) -> Self { Self { a, b } }
    }

    impl<Item, Err, O, A, B> Observable<Item, Err, O> for $name<A, B>
    where
      O: Observer<Item, Err>,
      A: Observable<Item, Err, MergeObserver<$rc<MergeState<O>>>>,
      B: Observable<Item, Err, MergeObserver<$rc<MergeState<O>>>>,
    {
      type Unsub = TupleSubscription<A::Unsub, B::Unsub>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let state =
          $rc::own(MergeState { observer: Some(observer), live_sources: 2 });
        let a_unsub =
          self.a.actual_subscribe(MergeObserver { state: state.clone() });
        let b_unsub = self.b.actual_subscribe(MergeObserver { state });
        TupleSubscription::new(a_unsub, b_unsub)
      }
    }

    impl<Item, Err, A, B> ObservableExt<Item, Err> for $name<A, B>
    where
      A: ObservableExt<Item, Err>,
      B: ObservableExt<Item, Err>,
    {
    }
  };
}

impl_merge_op!(MergeOp, MutRc);
impl_merge_op!(MergeOpThreads, MutArc);

pub struct MergeObserver<S> {
  state: S,
}

macro_rules! impl_merge_observer {
  ($rc: ident) => {
    impl<Item, Err, O> Observer<Item, Err>
      for MergeObserver<$rc<MergeState<O>>>
    where
      O: Observer<Item, Err>,
    {
      fn next(&mut self, value: Item) {
        if let Some(observer) = self.state.rc_deref_mut().observer.as_mut() {
          observer.next(value);
        }
      }

      fn error(self, err: Err) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          observer.error(err);
        }
      }

      fn complete(self) {
        let observer = {
          let mut state = self.state.rc_deref_mut();
          state.live_sources -= 1;
          if state.live_sources == 0 { state.observer.take() } else { None }
        };
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
  };
}

impl_merge_observer!(MutRc);
impl_merge_observer!(MutArc);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn interleaves_two_subjects() {
    let values = Rc::new(RefCell::new(vec![]));
    let mut odd: Subject<i32, ()> = Subject::default();
    let mut even = Subject::default();
    {
      let values = values.clone();
      odd
        .clone()
        .merge(even.clone())
        .subscribe(move |v| values.borrow_mut().push(v));
    }
    odd.next(1);
    even.next(2);
    odd.next(3);
    assert_eq!(*values.borrow(), vec![1, 2, 3]);
  }

  #[test]
  fn completes_only_after_both_sides() {
    let completed = Rc::new(RefCell::new(0));
    let a = Subject::default();
    let b = Subject::default();
    {
      let completed = completed.clone();
      a.clone()
        .merge(b.clone())
        .on_complete(move || *completed.borrow_mut() += 1)
        .subscribe(|_: i32| {});
    }
    Observer::<i32, ()>::complete(a);
    assert_eq!(*completed.borrow(), 0);
    Observer::<i32, ()>::complete(b);
    assert_eq!(*completed.borrow(), 1);
  }

  #[test]
  fn first_error_terminates_everything() {
    let errors = Rc::new(RefCell::new(0));
    let values = Rc::new(RefCell::new(vec![]));
    let a = Subject::default();
    let mut b = Subject::default();
    {
      let errors = errors.clone();
      let values = values.clone();
      a.clone()
        .merge(b.clone())
        .on_error(move |_: &&str| *errors.borrow_mut() += 1)
        .subscribe(move |v| values.borrow_mut().push(v));
    }
    Observer::<i32, &str>::error(a, "boom");
    b.next(1);
    assert_eq!(*errors.borrow(), 1);
    assert!(values.borrow().is_empty());
  }

  #[test]
  fn merge_from_iter_sources() {
    let mut values = vec![];
    observable::from_iter(0..3)
      .merge(observable::from_iter(3..6))
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
  }
}
