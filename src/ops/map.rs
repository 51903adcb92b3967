use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct MapOp<S, F, ItemIn> {
  pub(crate) source: S,
  pub(crate) f: F,
  pub(crate) _hint: TypeHint<ItemIn>,
}

impl<ItemIn, ItemOut, Err, O, S, F> Observable<ItemOut, Err, O>
  for MapOp<S, F, ItemIn>
where
  O: Observer<ItemOut, Err>,
  S: Observable<ItemIn, Err, MapObserver<O, F>>,
  F: FnMut(ItemIn) -> ItemOut,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(MapObserver { observer, f: self.f })
  }
}

impl<ItemIn, ItemOut, Err, S, F> ObservableExt<ItemOut, Err>
  for MapOp<S, F, ItemIn>
where
  S: ObservableExt<ItemIn, Err>,
  F: FnMut(ItemIn) -> ItemOut,
{
}

pub struct MapObserver<O, F> {
  observer: O,
  f: F,
}

impl<ItemIn, ItemOut, Err, O, F> Observer<ItemIn, Err> for MapObserver<O, F>
where
  O: Observer<ItemOut, Err>,
  F: FnMut(ItemIn) -> ItemOut,
{
  #[inline]
  fn next(&mut self, value: ItemIn) { self.observer.next((self.f)(value)) }

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
  fn transforms_values() {
    let mut sum = 0;
    observable::from_iter(100..101).map(|v| v * 2).subscribe(|v| sum += v);
    assert_eq!(sum, 200);
  }

  #[test]
  fn changes_item_type() {
    let mut count = 0;
    observable::from_iter(vec!['a', 'b', 'c'])
      .map(|_| 1)
      .subscribe(|v| count += v);
    assert_eq!(count, 3);
  }
}
