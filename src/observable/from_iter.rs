use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};
use std::{
  convert::Infallible,
  iter::{Repeat, Take},
};

/// Creates an observable that emits every value of an iterator, then
/// completes. Never errors.
///
/// Emission happens synchronously inside the subscribe call and honors the
/// observer's `is_closed`, so a downstream `take` stops the iteration
/// early.
///
/// ```
/// use rill::prelude::*;
///
/// let mut sum = 0;
/// observable::from_iter(0..10).subscribe(|v| sum += v);
/// assert_eq!(sum, 45);
/// ```
pub fn from_iter<Iter>(iter: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  ObservableIter(iter)
}

#[derive(Clone)]
pub struct ObservableIter<Iter>(Iter);

impl<Iter, O> Observable<Iter::Item, Infallible, O> for ObservableIter<Iter>
where
  Iter: IntoIterator,
  O: Observer<Iter::Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    for value in self.0.into_iter() {
      if observer.is_closed() {
        return;
      }
      observer.next(value);
    }
    if !observer.is_closed() {
      observer.complete();
    }
  }
}

impl<Iter> ObservableExt<Iter::Item, Infallible> for ObservableIter<Iter> where
  Iter: IntoIterator
{
}

/// Creates an observable repeating one value `n` times.
pub fn repeat<Item>(value: Item, n: usize) -> ObservableIter<Take<Repeat<Item>>>
where
  Item: Clone,
{
  from_iter(std::iter::repeat(value).take(n))
}
