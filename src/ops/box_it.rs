use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxObserver, BoxObserverThreads, Observer},
  subscription::{BoxSubscription, BoxSubscriptionThreads},
};

/// Object-safe subscribe capability backing [`BoxObservable`].
pub trait DynObservable<'a, Item, Err> {
  fn dyn_subscribe(
    self: Box<Self>, observer: BoxObserver<'a, Item, Err>,
  ) -> BoxSubscription<'a>;
}

impl<'a, Item, Err, S> DynObservable<'a, Item, Err> for S
where
  S: Observable<Item, Err, BoxObserver<'a, Item, Err>>,
  S::Unsub: 'a,
{
  fn dyn_subscribe(
    self: Box<Self>, observer: BoxObserver<'a, Item, Err>,
  ) -> BoxSubscription<'a> {
    BoxSubscription::new((*self).actual_subscribe(observer))
  }
}

/// Object-safe subscribe capability backing [`BoxObservableThreads`].
pub trait DynObservableThreads<Item, Err> {
  fn dyn_subscribe(
    self: Box<Self>, observer: BoxObserverThreads<Item, Err>,
  ) -> BoxSubscriptionThreads;
}

impl<Item, Err, S> DynObservableThreads<Item, Err> for S
where
  S: Observable<Item, Err, BoxObserverThreads<Item, Err>>,
  S::Unsub: Send + 'static,
{
  fn dyn_subscribe(
    self: Box<Self>, observer: BoxObserverThreads<Item, Err>,
  ) -> BoxSubscriptionThreads {
    BoxSubscriptionThreads::new((*self).actual_subscribe(observer))
  }
}

/// A type-erased observable chain.
///
/// Erasure pins the observer side to a boxed observer, which lets
/// differently-typed chains live in one collection (`concat_iter`,
/// `amb_iter`) at the cost of a vtable hop per signal.
pub struct BoxObservable<'a, Item, Err> {
  inner: Box<dyn DynObservable<'a, Item, Err> + 'a>,
}

pub struct BoxObservableThreads<Item, Err> {
  inner: Box<dyn DynObservableThreads<Item, Err> + Send>,
}

impl<'a, Item, Err> BoxObservable<'a, Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item, Err, BoxObserver<'a, Item, Err>> + 'a,
    S::Unsub: 'a,
  {
    Self { inner: Box::new(source) }
  }
}

impl<Item, Err> BoxObservableThreads<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item, Err, BoxObserverThreads<Item, Err>> + Send + 'static,
    S::Unsub: Send + 'static,
  {
    Self { inner: Box::new(source) }
  }
}

impl<'a, Item, Err, O> Observable<Item, Err, O> for BoxObservable<'a, Item, Err>
where
  O: Observer<Item, Err> + 'a,
{
  type Unsub = BoxSubscription<'a>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.inner.dyn_subscribe(Box::new(observer))
  }
}

impl<'a, Item, Err> ObservableExt<Item, Err> for BoxObservable<'a, Item, Err> {}

impl<Item, Err, O> Observable<Item, Err, O> for BoxObservableThreads<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
{
  type Unsub = BoxSubscriptionThreads;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.inner.dyn_subscribe(Box::new(observer))
  }
}

impl<Item, Err> ObservableExt<Item, Err> for BoxObservableThreads<Item, Err> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn erased_chains_share_a_type() {
    let sources = vec![
      observable::of(1).box_it(),
      observable::from_iter(2..4).box_it(),
      observable::empty().box_it(),
    ];
    let mut values = vec![];
    for source in sources {
      source.subscribe(|v| values.push(v));
    }
    assert_eq!(values, vec![1, 2, 3]);
  }

  #[test]
  fn boxed_chain_keeps_composing() {
    let mut values = vec![];
    observable::from_iter(0..5)
      .box_it()
      .filter(|v| v % 2 == 0)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![0, 2, 4]);
  }
}
