use super::Subscription;

/// Composes the two upstream subscriptions of a dual-source operator into
/// the single handle returned to the subscriber.
pub struct TupleSubscription<U1, U2>(U1, U2);

impl<U1, U2> TupleSubscription<U1, U2> {
  #[inline]
  pub fn new(first: U1, second: U2) -> Self { Self(first, second) }
}

impl<U1, U2> Subscription for TupleSubscription<U1, U2>
where
  U1: Subscription,
  U2: Subscription,
{
  fn unsubscribe(self) {
    self.0.unsubscribe();
    self.1.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.0.is_closed() && self.1.is_closed() }
}

#[cfg(test)]
mod test {
  use super::{super::test_helper::Probe, *};

  #[test]
  fn settles_both_sides() {
    let (p1, f1) = Probe::pair();
    let (p2, f2) = Probe::pair();
    let tuple = TupleSubscription::new(p1, p2);
    assert!(!tuple.is_closed());
    tuple.unsubscribe();
    assert!(f1.get() && f2.get());
  }
}
