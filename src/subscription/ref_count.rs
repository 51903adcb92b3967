use super::Subscription;
use crate::rc::{MutArc, MutRc, RcDeref, RcDerefMut};

struct RefCountState<U> {
  source: Option<U>,
  handles: usize,
  primary_closed: bool,
}

macro_rules! impl_ref_count_subscription {
  ($name: ident, $handle: ident, $rc: ident) => {
    /// Shares the lifetime of one wrapped subscription between a primary
    /// owner and any number of issued child handles.
    ///
    /// The wrapped subscription is released exactly once, and only when the
    /// primary has been unsubscribed **and** every issued handle has been
    /// unsubscribed, in whatever order that happens.
    ///
    /// `group_by` keeps its single upstream subscription alive this way: the
    /// outer subscription is the primary and every group subscription holds
    /// a child handle.
    pub struct $name<U> {
      state: $rc<RefCountState<U>>,
    }

    /// A child handle issued by the ref-counted wrapper.
    pub struct $handle<U> {
      state: $rc<RefCountState<U>>,
      released: bool,
    }

    impl<U> Clone for $name<U> {
      #[inline]
      fn clone(&self) -> Self { Self { state: self.state.clone() } }
    }

    impl<U: Subscription> $name<U> {
      pub fn new(source: U) -> Self {
        Self {
          state: $rc::own(RefCountState {
            source: Some(source),
            handles: 0,
            primary_closed: false,
          }),
        }
      }

      /// Issues a new child handle. A handle issued after the wrapped
      /// subscription was already released is settled from the start.
      pub fn handle(&self) -> $handle<U> {
        let mut state = self.state.rc_deref_mut();
        if state.source.is_none() {
          return $handle { state: self.state.clone(), released: true };
        }
        state.handles += 1;
        $handle { state: self.state.clone(), released: false }
      }
    }

    impl<U: Subscription> Subscription for $name<U> {
      /// Releases the primary lifetime. Clones of the primary share one
      /// release: the first call counts, the rest are no-ops.
      fn unsubscribe(self) {
        let release = {
          let mut state = self.state.rc_deref_mut();
          state.primary_closed = true;
          if state.handles == 0 { state.source.take() } else { None }
        };
        if let Some(u) = release {
          u.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool { self.state.rc_deref().source.is_none() }
    }

    impl<U: Subscription> Subscription for $handle<U> {
      fn unsubscribe(self) {
        if self.released {
          return;
        }
        let release = {
          let mut state = self.state.rc_deref_mut();
          state.handles -= 1;
          if state.primary_closed && state.handles == 0 {
            state.source.take()
          } else {
            None
          }
        };
        if let Some(u) = release {
          u.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool {
        self.released || self.state.rc_deref().source.is_none()
      }
    }
  };
}

impl_ref_count_subscription!(RefCountSubscription, RefHandle, MutRc);
impl_ref_count_subscription!(
  RefCountSubscriptionThreads,
  RefHandleThreads,
  MutArc
);

#[cfg(test)]
mod test {
  use super::{super::test_helper::Probe, *};

  #[test]
  fn releases_only_after_primary_and_all_handles() {
    let (probe, flag) = Probe::pair();
    let shared = RefCountSubscription::new(probe);
    let h1 = shared.handle();
    let h2 = shared.handle();

    shared.clone().unsubscribe();
    assert!(!flag.get());
    h1.unsubscribe();
    assert!(!flag.get());
    h2.unsubscribe();
    assert!(flag.get());
  }

  #[test]
  fn handles_before_primary_never_release_early() {
    let (probe, flag) = Probe::pair();
    let shared = RefCountSubscription::new(probe);
    let h1 = shared.handle();
    let h2 = shared.handle();

    h2.unsubscribe();
    h1.unsubscribe();
    assert!(!flag.get());
    shared.unsubscribe();
    assert!(flag.get());
  }

  #[test]
  fn primary_alone_releases_when_no_handles() {
    let (probe, flag) = Probe::pair();
    let shared = RefCountSubscription::new(probe);
    shared.unsubscribe();
    assert!(flag.get());
  }

  #[test]
  fn late_handle_is_settled() {
    let (probe, _flag) = Probe::pair();
    let shared = RefCountSubscription::new(probe);
    shared.clone().unsubscribe();
    let late = shared.handle();
    assert!(late.is_closed());
    late.unsubscribe();
  }

  #[test]
  fn double_primary_release_is_single_release() {
    let (probe, flag) = Probe::pair();
    let shared = RefCountSubscription::new(probe);
    let h = shared.handle();
    shared.clone().unsubscribe();
    shared.clone().unsubscribe();
    assert!(!flag.get());
    h.unsubscribe();
    assert!(flag.get());
  }
}
