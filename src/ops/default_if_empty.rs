use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

#[derive(Clone)]
pub struct DefaultIfEmptyOp<S, Item> {
  pub(crate) source: S,
  pub(crate) default: Item,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for DefaultIfEmptyOp<S, Item>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, DefaultIfEmptyObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(DefaultIfEmptyObserver {
      observer,
      default: Some(self.default),
    })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for DefaultIfEmptyOp<S, Item> where
  S: ObservableExt<Item, Err>
{
}

pub struct DefaultIfEmptyObserver<O, Item> {
  observer: O,
  default: Option<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for DefaultIfEmptyObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    self.default = None;
    self.observer.next(value);
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if let Some(default) = self.default.take() {
      self.observer.next(default);
    }
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn default_only_for_empty_sources() {
    let mut values = vec![];
    observable::empty()
      .default_if_empty(9)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![9]);

    let mut values = vec![];
    observable::from_iter(0..2)
      .default_if_empty(9)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 1]);
  }
}
