use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};
use std::convert::Infallible;

/// Creates an observable emitting exactly one value, then completing.
///
/// ```
/// use rill::prelude::*;
///
/// observable::of(123).subscribe(|v| assert_eq!(v, 123));
/// ```
pub fn of<Item>(value: Item) -> OfObservable<Item> { OfObservable(value) }

#[derive(Clone)]
pub struct OfObservable<Item>(pub(crate) Item);

impl<Item, O> Observable<Item, Infallible, O> for OfObservable<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.next(self.0);
      observer.complete();
    }
  }
}

impl<Item> ObservableExt<Item, Infallible> for OfObservable<Item> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn one_value_then_complete() {
    let mut values = vec![];
    let mut completed = false;
    observable::of(1)
      .on_complete(|| completed = true)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![1]);
    assert!(completed);
  }
}
