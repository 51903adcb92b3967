use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Observes values in passing without affecting the stream.
#[derive(Clone)]
pub struct TapOp<S, F> {
  pub(crate) source: S,
  pub(crate) f: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for TapOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TapObserver<O, F>>,
  F: FnMut(&Item),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(TapObserver { observer, f: self.f })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for TapOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct TapObserver<O, F> {
  observer: O,
  f: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TapObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item),
{
  fn next(&mut self, value: Item) {
    (self.f)(&value);
    self.observer.next(value);
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn observes_without_changing() {
    let mut seen = vec![];
    let mut values = vec![];
    observable::from_iter(0..3)
      .tap(|v| seen.push(*v))
      .subscribe(|v| values.push(v));
    assert_eq!(seen, values);
  }
}
