use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct ScanOp<S, F, B, ItemIn> {
  pub(crate) source: S,
  pub(crate) f: F,
  pub(crate) initial: B,
  pub(crate) _hint: TypeHint<ItemIn>,
}

impl<ItemIn, Err, O, S, F, B> Observable<B, Err, O> for ScanOp<S, F, B, ItemIn>
where
  O: Observer<B, Err>,
  S: Observable<ItemIn, Err, ScanObserver<O, F, B>>,
  F: FnMut(B, ItemIn) -> B,
  B: Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(ScanObserver {
      observer,
      f: self.f,
      acc: self.initial,
    })
  }
}

impl<ItemIn, Err, S, F, B> ObservableExt<B, Err> for ScanOp<S, F, B, ItemIn> where
  S: ObservableExt<ItemIn, Err>
{
}

pub struct ScanObserver<O, F, B> {
  observer: O,
  f: F,
  acc: B,
}

impl<ItemIn, Err, O, F, B> Observer<ItemIn, Err> for ScanObserver<O, F, B>
where
  O: Observer<B, Err>,
  F: FnMut(B, ItemIn) -> B,
  B: Clone,
{
  fn next(&mut self, value: ItemIn) {
    let acc = (self.f)(self.acc.clone(), value);
    self.acc = acc.clone();
    self.observer.next(acc);
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
