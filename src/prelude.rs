//! Convenient re-exports for working with the crate.

pub use crate::observable;
pub use crate::observable::{Observable, ObservableExt};
pub use crate::observer::Observer;

pub use crate::notification::Notification;
pub use crate::serializer::{HalfSerializer, HalfSerializerThreads};
pub use crate::subject::{Subject, SubjectThreads};
pub use crate::subscriber::Subscriber;
pub use crate::subscription::{
  BoxSubscription, BoxSubscriptionThreads, DeferredSubscription,
  DeferredSubscriptionThreads, MultiSubscription, MultiSubscriptionThreads,
  RefCountSubscription, RefCountSubscriptionThreads, RefHandle,
  RefHandleThreads, SerialSubscription, SerialSubscriptionThreads,
  Subscription, TupleSubscription,
};

pub use crate::rc::{MutArc, MutRc, RcDeref, RcDerefMut, SharedCounter};
