use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::TupleSubscription,
};
use std::collections::VecDeque;

/// Pairs the n-th value of one source with the n-th value of the other.
///
/// Values wait in per-side buffers until their counterpart arrives. The
/// stream completes once no further pair can ever be formed: a side that
/// completed with an empty buffer, or both sides completed.
#[derive(Clone)]
pub struct ZipOp<A, B> {
  a: A,
  b: B,
}

#[derive(Clone)]
pub struct ZipOpThreads<A, B> {
  a: A,
  b: B,
}

struct ZipState<O, ItemA, ItemB> {
  observer: Option<O>,
  buffer_a: VecDeque<ItemA>,
  buffer_b: VecDeque<ItemB>,
  done_a: bool,
  done_b: bool,
}

impl<O, ItemA, ItemB> ZipState<O, ItemA, ItemB> {
  fn new(observer: O) -> Self {
    ZipState {
      observer: Some(observer),
      buffer_a: VecDeque::new(),
      buffer_b: VecDeque::new(),
      done_a: false,
      done_b: false,
    }
  }

  /// A settled side with an empty buffer starves its counterpart; nothing
  /// can pair up anymore.
  fn exhausted(&self) -> bool {
    (self.done_a && self.buffer_a.is_empty())
      || (self.done_b && self.buffer_b.is_empty())
  }
}

macro_rules! impl_zip_op {
  ($name: ident, $rc: ident) => {
    impl<A, B> $name<A, B> {
      #[inline]
      pub(crate) fn new(a: A, b: B) -> Self { Self { a, b } }
    }

    impl<ItemA, ItemB, Err, O, A, B> Observable<(ItemA, ItemB), Err, O>
      for $name<A, B>
    where
      O: Observer<(ItemA, ItemB), Err>,
      A: Observable<ItemA, Err, ZipAObserver<$rc<ZipState<O, ItemA, ItemB>>>>,
      B: Observable<ItemB, Err, ZipBObserver<$rc<ZipState<O, ItemA, ItemB>>>>,
    {
      type Unsub = TupleSubscription<A::Unsub, B::Unsub>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let state = $rc::own(ZipState::new(observer));
        let a_unsub =
          self.a.actual_subscribe(ZipAObserver { state: state.clone() });
        let b_unsub = self.b.actual_subscribe(ZipBObserver { state });
        TupleSubscription::new(a_unsub, b_unsub)
      }
    }

    impl<ItemA, ItemB, Err, A, B> ObservableExt<(ItemA, ItemB), Err>
      for $name<A, B>
    where
      A: ObservableExt<ItemA, Err>,
      B: ObservableExt<ItemB, Err>,
    {
    }
  };
}

impl_zip_op!(ZipOp, MutRc);
impl_zip_op!(ZipOpThreads, MutArc);

pub struct ZipAObserver<S> {
  state: S,
}

pub struct ZipBObserver<S> {
  state: S,
}

macro_rules! impl_zip_side_observer {
  ($name: ident, $rc: ident, $side_item: ident, $other_item: ident,
   $my_buffer: ident, $other_buffer: ident, $my_done: ident,
   $pair: expr) => {
    impl<ItemA, ItemB, Err, O> Observer<$side_item, Err>
      for $name<$rc<ZipState<O, ItemA, ItemB>>>
    where
      O: Observer<(ItemA, ItemB), Err>,
    {
      fn next(&mut self, value: $side_item) {
        let mut state = self.state.rc_deref_mut();
        if state.observer.is_none() {
          return;
        }
        if let Some(other) = state.$other_buffer.pop_front() {
          let pair = $pair(value, other);
          if let Some(observer) = state.observer.as_mut() {
            observer.next(pair);
          }
          let observer =
            if state.exhausted() { state.observer.take() } else { None };
          drop(state);
          if let Some(observer) = observer {
            observer.complete();
          }
        } else {
          state.$my_buffer.push_back(value);
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
          state.$my_done = true;
          if state.exhausted() { state.observer.take() } else { None }
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

impl_zip_side_observer!(
  ZipAObserver,
  MutRc,
  ItemA,
  ItemB,
  buffer_a,
  buffer_b,
  done_a,
  |mine, other| (mine, other)
);
impl_zip_side_observer!(
  ZipAObserver,
  MutArc,
  ItemA,
  ItemB,
  buffer_a,
  buffer_b,
  done_a,
  |mine, other| (mine, other)
);
impl_zip_side_observer!(
  ZipBObserver,
  MutRc,
  ItemB,
  ItemA,
  buffer_b,
  buffer_a,
  done_b,
  |mine, other| (other, mine)
);
impl_zip_side_observer!(
  ZipBObserver,
  MutArc,
  ItemB,
  ItemA,
  buffer_b,
  buffer_a,
  done_b,
  |mine, other| (other, mine)
);
