use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

#[derive(Clone)]
pub struct TakeWhileOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for TakeWhileOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeWhileObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(TakeWhileObserver {
      observer: Some(observer),
      predicate: self.predicate,
    })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for TakeWhileOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct TakeWhileObserver<O, F> {
  observer: Option<O>,
  predicate: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TakeWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.observer.as_mut() {
      if (self.predicate)(&value) {
        observer.next(value);
      } else if let Some(observer) = self.observer.take() {
        observer.complete();
      }
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.observer.as_ref().map_or(true, Observer::is_closed)
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn stops_at_first_failure() {
    let mut values = vec![];
    let mut completed = 0;
    observable::from_iter(0..100)
      .take_while(|v| *v < 3)
      .on_complete(|| completed += 1)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 1, 2]);
    assert_eq!(completed, 1);
  }
}
