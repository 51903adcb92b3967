use crate::{
  notification::Notification,
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Reifies every signal into a [`Notification`] value; the materialized
/// stream itself always terminates with a plain completion.
#[derive(Clone)]
pub struct MaterializeOp<S> {
  pub(crate) source: S,
}

impl<Item, Err, O, S> Observable<Notification<Item, Err>, Err, O>
  for MaterializeOp<S>
where
  O: Observer<Notification<Item, Err>, Err>,
  S: Observable<Item, Err, MaterializeObserver<O>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(MaterializeObserver { observer })
  }
}

impl<Item, Err, S> ObservableExt<Notification<Item, Err>, Err>
  for MaterializeOp<S>
where
  S: ObservableExt<Item, Err>,
{
}

pub struct MaterializeObserver<O> {
  observer: O,
}

impl<Item, Err, O> Observer<Item, Err> for MaterializeObserver<O>
where
  O: Observer<Notification<Item, Err>, Err>,
{
  fn next(&mut self, value: Item) {
    self.observer.next(Notification::Next(value))
  }

  fn error(mut self, err: Err) {
    self.observer.next(Notification::Error(err));
    self.observer.complete();
  }

  fn complete(mut self) {
    self.observer.next(Notification::Complete);
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
