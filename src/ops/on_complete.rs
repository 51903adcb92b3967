use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Runs a callback when the completion terminal passes through, then
/// forwards it.
#[derive(Clone)]
pub struct OnCompleteOp<S, F> {
  pub(crate) source: S,
  pub(crate) f: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for OnCompleteOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, OnCompleteObserver<O, F>>,
  F: FnOnce(),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(OnCompleteObserver { observer, f: self.f })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for OnCompleteOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct OnCompleteObserver<O, F> {
  observer: O,
  f: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for OnCompleteObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    (self.f)();
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
