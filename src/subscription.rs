mod multi;
mod ref_count;
mod slot;
mod tuple;

pub use multi::{MultiSubscription, MultiSubscriptionThreads};
pub use ref_count::{
  RefCountSubscription, RefCountSubscriptionThreads, RefHandle,
  RefHandleThreads,
};
pub use slot::{
  DeferredSubscription, DeferredSubscriptionThreads, SerialSubscription,
  SerialSubscriptionThreads,
};
pub use tuple::TupleSubscription;

/// A handle to an active subscription.
///
/// `unsubscribe` releases the upstream resources and guarantees no further
/// signal reaches the observer the subscription was created with. Handles
/// over shared state are `Clone`; unsubscribing any clone settles all of
/// them, and settling twice is always a silent no-op.
pub trait Subscription {
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// Synchronous sources finish their whole emission inside
/// `actual_subscribe`, so their subscription is the already-settled unit.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

/// Object-safe mirror of [`Subscription`], for type-erased storage.
pub trait DynSubscription {
  fn dyn_unsubscribe(self: Box<Self>);
  fn dyn_is_closed(&self) -> bool;
}

impl<T: Subscription> DynSubscription for T {
  #[inline]
  fn dyn_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn dyn_is_closed(&self) -> bool { self.is_closed() }
}

/// Type-erased subscription for single-thread pipelines.
pub struct BoxSubscription<'a>(Box<dyn DynSubscription + 'a>);

/// Type-erased subscription that may cross threads.
pub struct BoxSubscriptionThreads(Box<dyn DynSubscription + Send>);

impl<'a> BoxSubscription<'a> {
  pub fn new<U: Subscription + 'a>(subscription: U) -> Self {
    Self(Box::new(subscription))
  }
}

impl BoxSubscriptionThreads {
  pub fn new<U: Subscription + Send + 'static>(subscription: U) -> Self {
    Self(Box::new(subscription))
  }
}

impl<'a> Subscription for BoxSubscription<'a> {
  #[inline]
  fn unsubscribe(self) { self.0.dyn_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.dyn_is_closed() }
}

impl Subscription for BoxSubscriptionThreads {
  #[inline]
  fn unsubscribe(self) { self.0.dyn_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.dyn_is_closed() }
}
