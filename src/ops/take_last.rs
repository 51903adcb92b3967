use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};
use std::collections::VecDeque;

#[derive(Clone)]
pub struct TakeLastOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for TakeLastOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeLastObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(TakeLastObserver {
      observer,
      count: self.count,
      buffer: VecDeque::new(),
    })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for TakeLastOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct TakeLastObserver<O, Item> {
  observer: O,
  count: usize,
  buffer: VecDeque<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for TakeLastObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.count == 0 {
      return;
    }
    if self.buffer.len() == self.count {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    for value in self.buffer.drain(..) {
      self.observer.next(value);
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn keeps_the_tail() {
    let mut values = vec![];
    observable::from_iter(0..10)
      .take_last(3)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![7, 8, 9]);
  }

  #[test]
  fn zero_count_emits_nothing() {
    let mut count = 0;
    let mut completed = 0;
    observable::from_iter(0..10)
      .take_last(0)
      .on_complete(|| completed += 1)
      .subscribe(|_| count += 1);
    assert_eq!(count, 0);
    assert_eq!(completed, 1);
  }
}
