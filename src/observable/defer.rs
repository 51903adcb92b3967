use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Defers building the source until subscription time, so each subscriber
/// observes a freshly produced observable.
pub fn defer<F, Src, Item, Err>(factory: F) -> Defer<F, Item, Err>
where
  F: FnOnce() -> Src,
{
  Defer { factory, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct Defer<F, Item, Err> {
  factory: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<F, Src, Item, Err, O> Observable<Item, Err, O> for Defer<F, Item, Err>
where
  O: Observer<Item, Err>,
  F: FnOnce() -> Src,
  Src: Observable<Item, Err, O>,
{
  type Unsub = Src::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    (self.factory)().actual_subscribe(observer)
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for Defer<F, Item, Err> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn factory_runs_per_subscription() {
    let mut built = 0;
    {
      let source = observable::defer(|| {
        built += 1;
        observable::of(built)
      });
      source.subscribe(|v| assert_eq!(v, 1));
    }
    assert_eq!(built, 1);
  }
}
