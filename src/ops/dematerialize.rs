use crate::{
  notification::Notification,
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Collapses a stream of [`Notification`] values back into plain signals.
#[derive(Clone)]
pub struct DematerializeOp<S> {
  pub(crate) source: S,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for DematerializeOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Notification<Item, Err>, Err, DematerializeObserver<O>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(DematerializeObserver { observer: Some(observer) })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for DematerializeOp<S> where
  S: ObservableExt<Notification<Item, Err>, Err>
{
}

pub struct DematerializeObserver<O> {
  observer: Option<O>,
}

impl<Item, Err, O> Observer<Notification<Item, Err>, Err>
  for DematerializeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Notification<Item, Err>) {
    match value {
      Notification::Next(v) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(v);
        }
      }
      Notification::Error(err) => {
        if let Some(observer) = self.observer.take() {
          observer.error(err);
        }
      }
      Notification::Complete => {
        if let Some(observer) = self.observer.take() {
          observer.complete();
        }
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
  use crate::{notification::Notification, prelude::*};

  #[test]
  fn round_trips_signals() {
    let mut values = vec![];
    let mut completed = 0;
    observable::from_iter(0..3)
      .materialize()
      .dematerialize()
      .on_complete(|| completed += 1)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 1, 2]);
    assert_eq!(completed, 1);
  }

  #[test]
  fn reified_error_is_raised() {
    let mut err = None;
    let notifications = vec![
      Notification::Next(1),
      Notification::Error("boom"),
      Notification::Next(2),
    ];
    observable::from_iter(notifications)
      .map_err(|e: std::convert::Infallible| match e {})
      .dematerialize()
      .on_error(|e| err = Some(*e))
      .subscribe(|_: i32| {});
    assert_eq!(err, Some("boom"));
  }
}
