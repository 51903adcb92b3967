use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct FilterMapOp<S, F, ItemIn> {
  pub(crate) source: S,
  pub(crate) f: F,
  pub(crate) _hint: TypeHint<ItemIn>,
}

impl<ItemIn, ItemOut, Err, O, S, F> Observable<ItemOut, Err, O>
  for FilterMapOp<S, F, ItemIn>
where
  O: Observer<ItemOut, Err>,
  S: Observable<ItemIn, Err, FilterMapObserver<O, F>>,
  F: FnMut(ItemIn) -> Option<ItemOut>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(FilterMapObserver { observer, f: self.f })
  }
}

impl<ItemIn, ItemOut, Err, S, F> ObservableExt<ItemOut, Err>
  for FilterMapOp<S, F, ItemIn>
where
  S: ObservableExt<ItemIn, Err>,
  F: FnMut(ItemIn) -> Option<ItemOut>,
{
}

pub struct FilterMapObserver<O, F> {
  observer: O,
  f: F,
}

impl<ItemIn, ItemOut, Err, O, F> Observer<ItemIn, Err>
  for FilterMapObserver<O, F>
where
  O: Observer<ItemOut, Err>,
  F: FnMut(ItemIn) -> Option<ItemOut>,
{
  fn next(&mut self, value: ItemIn) {
    if let Some(mapped) = (self.f)(value) {
      self.observer.next(mapped);
    }
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
  fn maps_and_drops() {
    let mut halves = vec![];
    observable::from_iter(0..10)
      .filter_map(|v| if v % 2 == 0 { Some(v / 2) } else { None })
      .subscribe(|v| halves.push(v));
    assert_eq!(halves, vec![0, 1, 2, 3, 4]);
  }
}
