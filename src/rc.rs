use std::{
  cell::{Cell, Ref, RefCell, RefMut},
  rc::Rc,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard,
  },
};

/// Immutable access to shared per-sink state.
pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  fn rc_deref(&self) -> Self::Target<'_>;
}

/// Mutable access to shared per-sink state.
pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  fn rc_deref_mut(&self) -> Self::Target<'_>;
}

/// Single-thread shared state: `Rc<RefCell<T>>`.
pub struct MutRc<T>(Rc<RefCell<T>>);

/// Thread-safe shared state: `Arc<Mutex<T>>`.
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }
}

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }
}

impl<T> RcDeref for MutRc<T> {
  type Target<'a>
    = Ref<'a, T>
  where
    Self: 'a;
  #[inline]
  fn rc_deref(&self) -> Self::Target<'_> { self.0.borrow() }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;
  #[inline]
  fn rc_deref(&self) -> Self::Target<'_> { self.0.lock().unwrap() }
}

impl<T> RcDerefMut for MutRc<T> {
  type Target<'a>
    = RefMut<'a, T>
  where
    Self: 'a;
  #[inline]
  fn rc_deref_mut(&self) -> Self::Target<'_> { self.0.borrow_mut() }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;
  #[inline]
  fn rc_deref_mut(&self) -> Self::Target<'_> { self.0.lock().unwrap() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for MutRc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

impl<T: Default> Default for MutArc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

/// A shared `usize` cell, the backing store of the wip/winner/epoch
/// protocols.
///
/// `CounterRc` is a plain `Cell` for single-thread pipelines, where the
/// protocols only have to resolve same-thread reentrancy. `CounterArc` is an
/// `AtomicUsize`, so the same protocol code is safe against concurrent
/// upstream threads.
pub trait SharedCounter: Clone {
  fn counter(value: usize) -> Self;
  fn get(&self) -> usize;
  fn set(&self, value: usize);
  /// Adds one and returns the previous value.
  fn incr(&self) -> usize;
  /// Subtracts one and returns the previous value.
  fn decr(&self) -> usize;
  /// Stores `new` only if the current value is `expected`. Returns whether
  /// the store happened.
  fn compare_swap(&self, expected: usize, new: usize) -> bool;
}

pub struct CounterRc(Rc<Cell<usize>>);

pub struct CounterArc(Arc<AtomicUsize>);

impl Clone for CounterRc {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl Clone for CounterArc {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl SharedCounter for CounterRc {
  fn counter(value: usize) -> Self { Self(Rc::new(Cell::new(value))) }

  #[inline]
  fn get(&self) -> usize { self.0.get() }

  #[inline]
  fn set(&self, value: usize) { self.0.set(value) }

  fn incr(&self) -> usize {
    let prev = self.0.get();
    self.0.set(prev + 1);
    prev
  }

  fn decr(&self) -> usize {
    let prev = self.0.get();
    self.0.set(prev - 1);
    prev
  }

  fn compare_swap(&self, expected: usize, new: usize) -> bool {
    if self.0.get() == expected {
      self.0.set(new);
      true
    } else {
      false
    }
  }
}

impl SharedCounter for CounterArc {
  fn counter(value: usize) -> Self { Self(Arc::new(AtomicUsize::new(value))) }

  #[inline]
  fn get(&self) -> usize { self.0.load(Ordering::SeqCst) }

  #[inline]
  fn set(&self, value: usize) { self.0.store(value, Ordering::SeqCst) }

  #[inline]
  fn incr(&self) -> usize { self.0.fetch_add(1, Ordering::SeqCst) }

  #[inline]
  fn decr(&self) -> usize { self.0.fetch_sub(1, Ordering::SeqCst) }

  fn compare_swap(&self, expected: usize, new: usize) -> bool {
    self
      .0
      .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
      .is_ok()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn rc_deref_pair() {
    let local = MutRc::own(1);
    *local.rc_deref_mut() += 1;
    assert_eq!(*local.rc_deref(), 2);

    let shared = MutArc::own(1);
    *shared.rc_deref_mut() += 1;
    assert_eq!(*shared.rc_deref(), 2);
  }

  #[test]
  fn counter_protocol_ops() {
    fn check<C: SharedCounter>() {
      let c = C::counter(0);
      assert!(c.compare_swap(0, 1));
      assert!(!c.compare_swap(0, 2));
      assert_eq!(c.incr(), 1);
      assert_eq!(c.decr(), 2);
      assert_eq!(c.get(), 1);
      c.set(0);
      assert_eq!(c.get(), 0);
    }
    check::<CounterRc>();
    check::<CounterArc>();
  }

  #[test]
  fn counter_clone_shares_state() {
    let a = CounterArc::counter(5);
    let b = a.clone();
    b.incr();
    assert_eq!(a.get(), 6);
  }
}
