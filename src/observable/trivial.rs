use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};
use std::convert::Infallible;

/// Completes immediately without emitting.
pub fn empty<Item>() -> Empty<Item> { Empty(TypeHint::new()) }

/// Never signals at all.
pub fn never<Item>() -> Never<Item> { Never(TypeHint::new()) }

/// Errors immediately with `err`.
pub fn throw<Item, Err>(err: Err) -> Throw<Item, Err> {
  Throw { err, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct Empty<Item>(TypeHint<Item>);

#[derive(Clone)]
pub struct Never<Item>(TypeHint<Item>);

#[derive(Clone)]
pub struct Throw<Item, Err> {
  err: Err,
  _hint: TypeHint<Item>,
}

impl<Item, O> Observable<Item, Infallible, O> for Empty<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.complete();
    }
  }
}

impl<Item> ObservableExt<Item, Infallible> for Empty<Item> {}

impl<Item, O> Observable<Item, Infallible, O> for Never<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, _observer: O) -> Self::Unsub {}
}

impl<Item> ObservableExt<Item, Infallible> for Never<Item> {}

impl<Item, Err, O> Observable<Item, Err, O> for Throw<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.error(self.err);
    }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for Throw<Item, Err> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn empty_only_completes() {
    let mut completed = false;
    let mut count = 0;
    observable::empty::<i32>()
      .on_complete(|| completed = true)
      .subscribe(|_| count += 1);
    assert!(completed);
    assert_eq!(count, 0);
  }

  #[test]
  fn throw_delivers_the_error() {
    let mut err = None;
    observable::throw::<i32, _>("boom")
      .on_error(|e| err = Some(*e))
      .subscribe(|_| {});
    assert_eq!(err, Some("boom"));
  }

  #[test]
  fn never_stays_silent() {
    let touched = std::cell::Cell::new(false);
    observable::never::<i32>()
      .on_complete(|| touched.set(true))
      .subscribe(|_| touched.set(true));
    assert!(!touched.get());
  }
}
