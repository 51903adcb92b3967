use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Transforms the error type of the chain. The usual way to lift an
/// infallible source into an error-typed combination:
/// `map_err(|e: Infallible| match e {})`.
#[derive(Clone)]
pub struct MapErrOp<S, F, ErrIn> {
  pub(crate) source: S,
  pub(crate) f: F,
  pub(crate) _hint: TypeHint<ErrIn>,
}

impl<Item, ErrIn, ErrOut, O, S, F> Observable<Item, ErrOut, O>
  for MapErrOp<S, F, ErrIn>
where
  O: Observer<Item, ErrOut>,
  S: Observable<Item, ErrIn, MapErrObserver<O, F>>,
  F: FnMut(ErrIn) -> ErrOut,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(MapErrObserver { observer, f: self.f })
  }
}

impl<Item, ErrIn, ErrOut, S, F> ObservableExt<Item, ErrOut>
  for MapErrOp<S, F, ErrIn>
where
  S: ObservableExt<Item, ErrIn>,
  F: FnMut(ErrIn) -> ErrOut,
{
}

pub struct MapErrObserver<O, F> {
  observer: O,
  f: F,
}

impl<Item, ErrIn, ErrOut, O, F> Observer<Item, ErrIn> for MapErrObserver<O, F>
where
  O: Observer<Item, ErrOut>,
  F: FnMut(ErrIn) -> ErrOut,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(mut self, err: ErrIn) { self.observer.error((self.f)(err)) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
