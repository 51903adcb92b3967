use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Runs a callback when the error terminal passes through, then forwards
/// it.
#[derive(Clone)]
pub struct OnErrorOp<S, F> {
  pub(crate) source: S,
  pub(crate) f: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for OnErrorOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, OnErrorObserver<O, F>>,
  F: FnOnce(&Err),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(OnErrorObserver { observer, f: self.f })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for OnErrorOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct OnErrorObserver<O, F> {
  observer: O,
  f: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for OnErrorObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(&Err),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    (self.f)(&err);
    self.observer.error(err);
  }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
