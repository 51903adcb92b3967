use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  serializer::{HalfSerializer, HalfSerializerThreads},
  subscription::{
    DeferredSubscription, DeferredSubscriptionThreads, Subscription,
    TupleSubscription,
  },
  type_hint::TypeHint,
};

/// Mirrors the source until the notifier signals.
///
/// Both sinks feed one half-serializer, so a notifier firing concurrently
/// with an in-flight value still yields a legal sequence: the terminal is
/// deposited and the emission owner forwards it on the way out, and
/// nothing follows it. The notifier is subscribed first — a notifier that
/// fires synchronously on subscribe produces an empty completed stream
/// without a single value slipping through.
///
/// A notifier value or completion completes the output; a notifier error
/// is forwarded as the output's error.
#[derive(Clone)]
pub struct TakeUntilOp<S, N, NotifyItem> {
  source: S,
  notifier: N,
  _hint: TypeHint<NotifyItem>,
}

#[derive(Clone)]
pub struct TakeUntilOpThreads<S, N, NotifyItem> {
  source: S,
  notifier: N,
  _hint: TypeHint<NotifyItem>,
}

pub struct TakeUntilSourceObserver<Ser, U1, U2> {
  serializer: Ser,
  source_sub: U1,
  notifier_sub: U2,
}

pub struct TakeUntilNotifierObserver<Ser, U1, U2> {
  serializer: Ser,
  source_sub: U1,
  notifier_sub: U2,
}

macro_rules! impl_take_until_op {
  ($name: ident, $serializer: ident, $deferred: ident) => {
    impl<S, N, NotifyItem> $name<S, N, NotifyItem> {
      #[inline]
      pub(crate) fn new(source: S, notifier: N) -> Self {
        Self { source, notifier, _hint: TypeHint::new() }
      }
    }

    impl<Item, NotifyItem, Err, O, S, N, SU, NU> Observable<Item, Err, O>
      for $name<S, N, NotifyItem>
    where
      O: Observer<Item, Err>,
      S: Observable<
        Item,
        Err,
        TakeUntilSourceObserver<
          $serializer<O, Item, Err>,
          $deferred<SU>,
          $deferred<NU>,
        >,
        Unsub = SU,
      >,
      N: Observable<
        NotifyItem,
        Err,
        TakeUntilNotifierObserver<
          $serializer<O, Item, Err>,
          $deferred<SU>,
          $deferred<NU>,
        >,
        Unsub = NU,
      >,
      SU: Subscription,
      NU: Subscription,
    {
      type Unsub = TupleSubscription<$deferred<SU>, $deferred<NU>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let serializer = $serializer::new(observer);
        let source_slot = $deferred::<SU>::default();
        let notifier_slot = $deferred::<NU>::default();

        // notifier first: its synchronous signals must win the race
        let notifier_unsub =
          self.notifier.actual_subscribe(TakeUntilNotifierObserver {
            serializer: serializer.clone(),
            source_sub: source_slot.clone(),
            notifier_sub: notifier_slot.clone(),
          });
        notifier_slot.set(notifier_unsub);

        let source_unsub =
          self.source.actual_subscribe(TakeUntilSourceObserver {
            serializer,
            source_sub: source_slot.clone(),
            notifier_sub: notifier_slot.clone(),
          });
        source_slot.set(source_unsub);

        TupleSubscription::new(source_slot, notifier_slot)
      }
    }

    impl<Item, NotifyItem, Err, S, N> ObservableExt<Item, Err>
      for $name<S, N, NotifyItem>
    where
      S: ObservableExt<Item, Err>,
    {
    }

    impl<Item, Err, O, U1, U2> Observer<Item, Err>
      for TakeUntilSourceObserver<$serializer<O, Item, Err>, U1, U2>
    where
      O: Observer<Item, Err>,
      U1: Subscription,
      U2: Subscription,
    {
      fn next(&mut self, value: Item) {
        self.serializer.forward_next(value);
      }

      fn error(self, err: Err) {
        self.serializer.forward_error(err);
        self.notifier_sub.unsubscribe();
        self.source_sub.unsubscribe();
      }

      fn complete(self) {
        self.serializer.forward_complete();
        self.notifier_sub.unsubscribe();
        self.source_sub.unsubscribe();
      }

      fn is_closed(&self) -> bool { self.serializer.is_closed() }
    }

    impl<Item, NotifyItem, Err, O, U1, U2> Observer<NotifyItem, Err>
      for TakeUntilNotifierObserver<$serializer<O, Item, Err>, U1, U2>
    where
      O: Observer<Item, Err>,
      U1: Subscription + Clone,
      U2: Subscription + Clone,
    {
      fn next(&mut self, _value: NotifyItem) {
        self.serializer.forward_complete();
        self.source_sub.clone().unsubscribe();
        self.notifier_sub.clone().unsubscribe();
      }

      fn error(self, err: Err) {
        self.serializer.forward_error(err);
        self.source_sub.unsubscribe();
        self.notifier_sub.unsubscribe();
      }

      fn complete(self) {
        self.serializer.forward_complete();
        self.source_sub.unsubscribe();
        self.notifier_sub.unsubscribe();
      }

      fn is_closed(&self) -> bool { self.serializer.is_closed() }
    }
  };
}

impl_take_until_op!(TakeUntilOp, HalfSerializer, DeferredSubscription);
impl_take_until_op!(
  TakeUntilOpThreads,
  HalfSerializerThreads,
  DeferredSubscriptionThreads
);
