use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

#[derive(Clone)]
pub struct SkipWhileOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for SkipWhileOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, SkipWhileObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(SkipWhileObserver {
      observer,
      predicate: self.predicate,
      skipping: true,
    })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for SkipWhileOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct SkipWhileObserver<O, F> {
  observer: O,
  predicate: F,
  skipping: bool,
}

impl<Item, Err, O, F> Observer<Item, Err> for SkipWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.skipping {
      if (self.predicate)(&value) {
        return;
      }
      self.skipping = false;
    }
    self.observer.next(value);
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
