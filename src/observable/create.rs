use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscriber::Subscriber,
  type_hint::TypeHint,
};

/// Creates an observable from an emission closure.
///
/// The closure runs once per subscription and drives the handed
/// [`Subscriber`]; signals after the first terminal are silently dropped.
///
/// ```
/// use rill::prelude::*;
///
/// let mut values = vec![];
/// observable::create(|mut subscriber: Subscriber<_, i32, &str>| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
/// })
/// .subscribe(|v| values.push(v));
/// assert_eq!(values, vec![1, 2]);
/// ```
pub fn create<F, Item, Err>(subscribe: F) -> Create<F, Item, Err> {
  Create { subscribe, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct Create<F, Item, Err> {
  subscribe: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F, Item, Err, O> Observable<Item, Err, O> for Create<F, Item, Err>
where
  O: Observer<Item, Err>,
  F: FnOnce(Subscriber<O, Item, Err>),
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    (self.subscribe)(Subscriber::new(observer));
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for Create<F, Item, Err> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn nothing_delivered_after_terminal() {
    let mut values = vec![];
    let mut completed = 0;
    let mut errors = 0;
    observable::create(|mut subscriber: Subscriber<_, i32, &str>| {
      subscriber.next(1);
      subscriber.complete();
      subscriber.next(2);
      subscriber.error("late");
    })
    .on_error(|_| errors += 1)
    .on_complete(|| completed += 1)
    .subscribe(|v| values.push(v));

    assert_eq!(values, vec![1]);
    assert_eq!(completed, 1);
    assert_eq!(errors, 0);
  }

  #[test]
  fn error_path() {
    let mut err = None;
    observable::create(|mut subscriber: Subscriber<_, i32, &str>| {
      subscriber.error("boom");
    })
    .on_error(|e| err = Some(*e))
    .subscribe(|_| {});
    assert_eq!(err, Some("boom"));
  }
}
