use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Emits only the final value of the source, if there was one.
#[derive(Clone)]
pub struct LastOp<S, Item> {
  pub(crate) source: S,
  pub(crate) _hint: TypeHint<Item>,
}

/// Emits the final value of the source, or `default` when the source
/// completed empty.
#[derive(Clone)]
pub struct LastOrOp<S, Item> {
  pub(crate) source: S,
  pub(crate) default: Item,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for LastOp<S, Item>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, LastObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(LastObserver { observer: Some(observer), last: None })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for LastOp<S, Item> where
  S: ObservableExt<Item, Err>
{
}

impl<Item, Err, O, S> Observable<Item, Err, O> for LastOrOp<S, Item>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, LastObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(LastObserver {
      observer: Some(observer),
      last: Some(self.default),
    })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for LastOrOp<S, Item> where
  S: ObservableExt<Item, Err>
{
}

pub struct LastObserver<O, Item> {
  observer: Option<O>,
  last: Option<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for LastObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.last = Some(value) }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err);
    }
  }

  fn complete(mut self) {
    if let Some(mut observer) = self.observer.take() {
      if let Some(last) = self.last.take() {
        observer.next(last);
      }
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
  fn last_of_many() {
    let mut completed = 0;
    let mut last = None;
    observable::from_iter(0..100)
      .last()
      .on_complete(|| completed += 1)
      .subscribe(|v| last = Some(v));
    assert_eq!(last, Some(99));
    assert_eq!(completed, 1);
  }

  #[test]
  fn last_of_empty_emits_nothing() {
    let mut last = None;
    let mut completed = 0;
    observable::empty::<i32>()
      .last()
      .on_complete(|| completed += 1)
      .subscribe(|v| last = Some(v));
    assert_eq!(last, None);
    assert_eq!(completed, 1);
  }

  #[test]
  fn last_or_defaults_when_empty() {
    let mut last = None;
    observable::empty()
      .last_or(100)
      .subscribe(|v| last = Some(v));
    assert_eq!(last, Some(100));
  }

  #[test]
  fn last_or_prefers_real_value() {
    let mut last = None;
    observable::from_iter(0..3)
      .last_or(100)
      .subscribe(|v| last = Some(v));
    assert_eq!(last, Some(2));
  }
}
