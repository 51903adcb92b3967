use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::TupleSubscription,
  type_hint::TypeHint,
};

/// Pairs every source value with the latest value of a second stream.
///
/// The latest-value cell is deliberately separate from the shared sink, so
/// recording a second-stream value never contends with a delivery in
/// progress. Source values that arrive before the second stream has
/// emitted anything are dropped; completion of the second stream is
/// ignored, its error propagates.
#[derive(Clone)]
pub struct WithLatestFromOp<S, FS> {
  source: S,
  from: FS,
}

#[derive(Clone)]
pub struct WithLatestFromOpThreads<S, FS> {
  source: S,
  from: FS,
}

macro_rules! impl_with_latest_from_op {
  ($name: ident, $rc: ident) => {
    impl<S, FS> $name<S, FS> {
      #[inline]
      pub(crate) fn new(source: S, from: FS) -> Self { Self { source, from } }
    }

    impl<ItemA, ItemB, Err, O, S, FS> Observable<(ItemA, ItemB), Err, O>
      for $name<S, FS>
    where
      O: Observer<(ItemA, ItemB), Err>,
      S: Observable<ItemA, Err, SourceObserver<$rc<Option<O>>, $rc<Option<ItemB>>>>,
      FS: Observable<
        ItemB,
        Err,
        LatestObserver<$rc<Option<O>>, $rc<Option<ItemB>>, ItemA>,
      >,
      ItemB: Clone,
    {
      type Unsub = TupleSubscription<FS::Unsub, S::Unsub>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let latest = $rc::own(None);
        let shared = $rc::own(Some(observer));
        let from_unsub = self.from.actual_subscribe(LatestObserver {
          observer: shared.clone(),
          latest: latest.clone(),
          _hint: TypeHint::new(),
        });
        let source_unsub = self
          .source
          .actual_subscribe(SourceObserver { observer: shared, latest });
        TupleSubscription::new(from_unsub, source_unsub)
      }
    }

    impl<ItemA, ItemB, Err, S, FS> ObservableExt<(ItemA, ItemB), Err>
      for $name<S, FS>
    where
      S: ObservableExt<ItemA, Err>,
      FS: ObservableExt<ItemB, Err>,
    {
    }
  };
}

impl_with_latest_from_op!(WithLatestFromOp, MutRc);
impl_with_latest_from_op!(WithLatestFromOpThreads, MutArc);

/// Sink for the main source: combines with the recorded latest value.
pub struct SourceObserver<O, V> {
  observer: O,
  latest: V,
}

/// Sink for the second stream: only records, never delivers.
pub struct LatestObserver<O, V, ItemA> {
  observer: O,
  latest: V,
  _hint: TypeHint<ItemA>,
}

macro_rules! impl_with_latest_from_observers {
  ($rc: ident) => {
    impl<ItemA, ItemB, Err, O> Observer<ItemA, Err>
      for SourceObserver<O, $rc<Option<ItemB>>>
    where
      O: Observer<(ItemA, ItemB), Err>,
      ItemB: Clone,
    {
      fn next(&mut self, value: ItemA) {
        let latest = self.latest.rc_deref().clone();
        if let Some(latest) = latest {
          self.observer.next((value, latest));
        }
      }

      #[inline]
      fn error(self, err: Err) { self.observer.error(err) }

      #[inline]
      fn complete(self) { self.observer.complete() }

      #[inline]
      fn is_closed(&self) -> bool { self.observer.is_closed() }
    }

    impl<ItemA, ItemB, Err, O> Observer<ItemB, Err>
      for LatestObserver<O, $rc<Option<ItemB>>, ItemA>
    where
      O: Observer<(ItemA, ItemB), Err>,
    {
      fn next(&mut self, value: ItemB) {
        *self.latest.rc_deref_mut() = Some(value);
      }

      #[inline]
      fn error(self, err: Err) { self.observer.error(err) }

      // the second stream running dry does not end the combination
      #[inline]
      fn complete(self) {}

      #[inline]
      fn is_closed(&self) -> bool { self.observer.is_closed() }
    }
  };
}

impl_with_latest_from_observers!(MutRc);
impl_with_latest_from_observers!(MutArc);
