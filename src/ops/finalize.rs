use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDerefMut},
  subscription::Subscription,
};

#[derive(Clone)]
pub struct FinalizeOp<S, F> {
  source: S,
  f: F,
}

#[derive(Clone)]
pub struct FinalizeOpThreads<S, F> {
  source: S,
  f: F,
}

macro_rules! impl_finalize_op {
  ($name: ident, $rc: ident) => {
    impl<S, F> $name<S, F> {
      #[inline]
      pub(crate) fn new(source: S, f: F) -> Self { Self { source, f } }
    }

    impl<Item, Err, O, S, F> Observable<Item, Err, O> for $name<S, F>
    where
      O: Observer<Item, Err>,
      S: Observable<Item, Err, FinalizeObserver<O, $rc<Option<F>>>>,
      F: FnOnce(),
    {
      type Unsub = FinalizeSubscription<S::Unsub, $rc<Option<F>>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let f = $rc::own(Some(self.f));
        let subscription = self
          .source
          .actual_subscribe(FinalizeObserver { observer, f: f.clone() });
        FinalizeSubscription { subscription, f }
      }
    }

    impl<Item, Err, S, F> ObservableExt<Item, Err> for $name<S, F> where
      S: ObservableExt<Item, Err>
    {
    }
  };
}

impl_finalize_op!(FinalizeOp, MutRc);
impl_finalize_op!(FinalizeOpThreads, MutArc);

pub struct FinalizeObserver<O, F> {
  observer: O,
  f: F,
}

pub struct FinalizeSubscription<U, C> {
  subscription: U,
  f: C,
}

macro_rules! impl_finalize_parts {
  ($rc: ident) => {
    impl<Item, Err, O, F> Observer<Item, Err>
      for FinalizeObserver<O, $rc<Option<F>>>
    where
      O: Observer<Item, Err>,
      F: FnOnce(),
    {
      #[inline]
      fn next(&mut self, value: Item) { self.observer.next(value) }

      fn error(self, err: Err) {
        self.observer.error(err);
        let f = self.f.rc_deref_mut().take();
        if let Some(f) = f {
          f();
        }
      }

      fn complete(self) {
        self.observer.complete();
        let f = self.f.rc_deref_mut().take();
        if let Some(f) = f {
          f();
        }
      }

      #[inline]
      fn is_closed(&self) -> bool { self.observer.is_closed() }
    }

    impl<U, F> Subscription for FinalizeSubscription<U, $rc<Option<F>>>
    where
      U: Subscription,
      F: FnOnce(),
    {
      fn unsubscribe(self) {
        self.subscription.unsubscribe();
        let f = self.f.rc_deref_mut().take();
        if let Some(f) = f {
          f();
        }
      }

      fn is_closed(&self) -> bool { self.subscription.is_closed() }
    }
  };
}

impl_finalize_parts!(MutRc);
impl_finalize_parts!(MutArc);
