use super::{BoxSubscription, BoxSubscriptionThreads, Subscription};
use crate::rc::{MutArc, MutRc, RcDeref, RcDerefMut};
use smallvec::SmallVec;

struct MultiInner<U> {
  closed: bool,
  teardown: SmallVec<[U; 2]>,
}

impl<U> Default for MultiInner<U> {
  fn default() -> Self { MultiInner { closed: false, teardown: SmallVec::new() } }
}

macro_rules! impl_multi_subscription {
  ($name: ident, $rc: ident, $box: ty $(,$lf: lifetime)?) => {
    /// A growable composite subscription: disposing it disposes every
    /// appended subscription. Appending to an already-disposed composite
    /// disposes the newcomer immediately.
    pub struct $name<$($lf)?> {
      inner: $rc<MultiInner<$box>>,
    }

    impl<$($lf)?> Clone for $name<$($lf)?> {
      #[inline]
      fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
    }

    impl<$($lf)?> Default for $name<$($lf)?> {
      fn default() -> Self { Self { inner: $rc::own(MultiInner::default()) } }
    }

    impl<$($lf)?> $name<$($lf)?> {
      pub fn append(&self, subscription: $box) {
        let rejected;
        {
          let mut inner = self.inner.rc_deref_mut();
          if inner.closed {
            rejected = subscription;
          } else {
            inner.teardown.retain(|u| !u.is_closed());
            inner.teardown.push(subscription);
            return;
          }
        }
        rejected.unsubscribe();
      }

      pub fn teardown_size(&self) -> usize {
        self.inner.rc_deref().teardown.len()
      }
    }

    impl<$($lf)?> Subscription for $name<$($lf)?> {
      fn unsubscribe(self) {
        let teardown = {
          let mut inner = self.inner.rc_deref_mut();
          if inner.closed {
            return;
          }
          inner.closed = true;
          std::mem::take(&mut inner.teardown)
        };
        for u in teardown {
          u.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool { self.inner.rc_deref().closed }
    }
  };
}

impl_multi_subscription!(MultiSubscription, MutRc, BoxSubscription<'a>, 'a);
impl_multi_subscription!(MultiSubscriptionThreads, MutArc, BoxSubscriptionThreads);
