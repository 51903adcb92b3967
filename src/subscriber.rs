use crate::{observer::Observer, type_hint::TypeHint};

/// The emission facade handed to [`create`] closures.
///
/// Unlike [`Observer`], whose terminal methods consume the receiver, all
/// methods here take `&mut self` so a closure can drive the whole lifecycle
/// of one subscription. The first terminal call takes the wrapped observer;
/// every signal after that is a silent no-op.
///
/// [`create`]: crate::observable::create
pub struct Subscriber<O, Item, Err> {
  observer: Option<O>,
  _hint: TypeHint<(Item, Err)>,
}

impl<O, Item, Err> Subscriber<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  pub(crate) fn new(observer: O) -> Self {
    Self { observer: Some(observer), _hint: TypeHint::new() }
  }

  pub fn next(&mut self, value: Item) {
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
  }

  pub fn error(&mut self, err: Err) {
    if let Some(observer) = self.observer.take() {
      observer.error(err);
    }
  }

  pub fn complete(&mut self) {
    if let Some(observer) = self.observer.take() {
      observer.complete();
    }
  }

  pub fn is_closed(&self) -> bool {
    self.observer.as_ref().map_or(true, Observer::is_closed)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observer::NextObserver;

  #[test]
  fn signals_after_terminal_are_dropped() {
    let mut count = 0;
    {
      let mut subscriber: Subscriber<_, i32, ()> =
        Subscriber::new(NextObserver(|v: i32| count += v));
      subscriber.next(1);
      subscriber.complete();
      subscriber.next(10);
      subscriber.error(());
      assert!(subscriber.is_closed());
    }
    assert_eq!(count, 1);
  }
}
