use super::Subscription;
use crate::rc::{MutArc, MutRc, RcDeref, RcDerefMut};

enum SlotState<U> {
  Vacant,
  Active(U),
  Closed,
}

macro_rules! impl_deferred_subscription {
  ($name: ident, $rc: ident) => {
    /// A single-assignment subscription slot.
    ///
    /// Racing operators register the slot first and assign the real
    /// subscription once `actual_subscribe` returns; if the slot was
    /// unsubscribed in between (a loser disposed mid-subscribe), the
    /// assignee is disposed on the spot instead of leaking.
    pub struct $name<U> {
      slot: $rc<SlotState<U>>,
    }

    impl<U> Clone for $name<U> {
      #[inline]
      fn clone(&self) -> Self { Self { slot: self.slot.clone() } }
    }

    impl<U> Default for $name<U> {
      fn default() -> Self { Self { slot: $rc::own(SlotState::Vacant) } }
    }

    impl<U: Subscription> $name<U> {
      /// Assigns the subscription. At most one assignment is legal;
      /// assigning a second time is a protocol violation.
      pub fn set(&self, subscription: U) {
        let disposed_on_arrival;
        {
          let mut slot = self.slot.rc_deref_mut();
          match std::mem::replace(&mut *slot, SlotState::Closed) {
            SlotState::Vacant => {
              *slot = SlotState::Active(subscription);
              return;
            }
            SlotState::Closed => disposed_on_arrival = subscription,
            SlotState::Active(_) => {
              panic!("single-assignment subscription assigned twice")
            }
          }
        }
        disposed_on_arrival.unsubscribe();
      }
    }

    impl<U: Subscription> Subscription for $name<U> {
      fn unsubscribe(self) {
        let prev = std::mem::replace(
          &mut *self.slot.rc_deref_mut(),
          SlotState::Closed,
        );
        if let SlotState::Active(u) = prev {
          u.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool {
        matches!(*self.slot.rc_deref(), SlotState::Closed)
      }
    }
  };
}

impl_deferred_subscription!(DeferredSubscription, MutRc);
impl_deferred_subscription!(DeferredSubscriptionThreads, MutArc);

macro_rules! impl_serial_subscription {
  ($name: ident, $rc: ident) => {
    /// A serial subscription slot: assigning a replacement disposes the
    /// previous occupant. Sequential operators (`concat`, `switch`) keep
    /// their current inner subscription here.
    pub struct $name<U> {
      slot: $rc<SlotState<U>>,
    }

    impl<U> Clone for $name<U> {
      #[inline]
      fn clone(&self) -> Self { Self { slot: self.slot.clone() } }
    }

    impl<U> Default for $name<U> {
      fn default() -> Self { Self { slot: $rc::own(SlotState::Vacant) } }
    }

    impl<U: Subscription> $name<U> {
      /// Installs `subscription`, disposing whatever occupied the slot.
      /// After `unsubscribe`, replacements are disposed immediately.
      ///
      /// The displaced subscription is disposed after the slot lock is
      /// released, since its teardown may re-enter this slot.
      pub fn replace(&self, subscription: U) {
        let displaced;
        {
          let mut slot = self.slot.rc_deref_mut();
          match std::mem::replace(&mut *slot, SlotState::Vacant) {
            SlotState::Closed => {
              *slot = SlotState::Closed;
              displaced = Some(subscription);
            }
            SlotState::Active(prev) => {
              *slot = SlotState::Active(subscription);
              displaced = Some(prev);
            }
            SlotState::Vacant => {
              *slot = SlotState::Active(subscription);
              displaced = None;
            }
          }
        }
        if let Some(u) = displaced {
          u.unsubscribe();
        }
      }

      /// Disposes the current occupant and leaves the slot open for a
      /// successor.
      pub fn clear(&self) {
        let prev = std::mem::replace(
          &mut *self.slot.rc_deref_mut(),
          SlotState::Vacant,
        );
        if let SlotState::Active(u) = prev {
          u.unsubscribe();
        }
      }
    }

    impl<U: Subscription> Subscription for $name<U> {
      fn unsubscribe(self) {
        let prev = std::mem::replace(
          &mut *self.slot.rc_deref_mut(),
          SlotState::Closed,
        );
        if let SlotState::Active(u) = prev {
          u.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool {
        matches!(*self.slot.rc_deref(), SlotState::Closed)
      }
    }
  };
}

impl_serial_subscription!(SerialSubscription, MutRc);
impl_serial_subscription!(SerialSubscriptionThreads, MutArc);

#[cfg(test)]
mod test {
  use super::{super::test_helper::Probe, *};

  #[test]
  fn deferred_assign_then_unsubscribe() {
    let (probe, flag) = Probe::pair();
    let slot = DeferredSubscription::default();
    slot.set(probe);
    assert!(!slot.is_closed());
    slot.unsubscribe();
    assert!(flag.get());
  }

  #[test]
  fn deferred_assign_after_unsubscribe_disposes_assignee() {
    let (probe, flag) = Probe::pair();
    let slot = DeferredSubscription::default();
    slot.clone().unsubscribe();
    slot.set(probe);
    assert!(flag.get());
  }

  #[test]
  #[should_panic(expected = "assigned twice")]
  fn deferred_double_assign_panics() {
    let slot = DeferredSubscription::default();
    slot.set(Probe::pair().0);
    slot.set(Probe::pair().0);
  }

  #[test]
  fn serial_replace_disposes_previous() {
    let (first, first_flag) = Probe::pair();
    let (second, second_flag) = Probe::pair();
    let slot = SerialSubscription::default();
    slot.replace(first);
    slot.replace(second);
    assert!(first_flag.get());
    assert!(!second_flag.get());
    slot.unsubscribe();
    assert!(second_flag.get());
  }

  #[test]
  fn serial_replace_after_unsubscribe_disposes_immediately() {
    let slot = SerialSubscription::default();
    slot.clone().unsubscribe();
    let (probe, flag) = Probe::pair();
    slot.replace(probe);
    assert!(flag.get());
  }

  #[test]
  fn unsubscribe_is_idempotent() {
    let (probe, flag) = Probe::pair();
    let slot = SerialSubscription::default();
    slot.replace(probe);
    slot.clone().unsubscribe();
    slot.clone().unsubscribe();
    assert!(flag.get());
    assert!(slot.is_closed());
  }
}
