use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Emits one value ahead of everything the source produces.
#[derive(Clone)]
pub struct StartWithOp<S, Item> {
  pub(crate) source: S,
  pub(crate) value: Item,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for StartWithOp<S, Item>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, O>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.next(self.value);
    }
    self.source.actual_subscribe(observer)
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for StartWithOp<S, Item> where
  S: ObservableExt<Item, Err>
{
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn leads_the_sequence() {
    let mut values = vec![];
    observable::from_iter(1..4)
      .start_with(0)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 1, 2, 3]);
  }
}
