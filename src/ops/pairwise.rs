use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

#[derive(Clone)]
pub struct PairwiseOp<S> {
  pub(crate) source: S,
}

impl<Item, Err, O, S> Observable<(Item, Item), Err, O> for PairwiseOp<S>
where
  O: Observer<(Item, Item), Err>,
  S: Observable<Item, Err, PairwiseObserver<O, Item>>,
  Item: Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(PairwiseObserver { observer, prev: None })
  }
}

impl<Item, Err, S> ObservableExt<(Item, Item), Err> for PairwiseOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct PairwiseObserver<O, Item> {
  observer: O,
  prev: Option<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for PairwiseObserver<O, Item>
where
  O: Observer<(Item, Item), Err>,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(prev) = self.prev.replace(value.clone()) {
      self.observer.next((prev, value));
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
  fn pairs_with_predecessor() {
    let mut pairs = vec![];
    observable::from_iter(1..=4).pairwise().subscribe(|p| pairs.push(p));
    assert_eq!(pairs, vec![(1, 2), (2, 3), (3, 4)]);
  }

  #[test]
  fn single_value_emits_nothing() {
    let mut count = 0;
    observable::of(1).pairwise().subscribe(|_| count += 1);
    assert_eq!(count, 0);
  }
}
