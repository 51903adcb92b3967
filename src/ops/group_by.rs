use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subject::{Subject, SubjectThreads},
  subscription::{
    DeferredSubscription, DeferredSubscriptionThreads, RefCountSubscription,
    RefCountSubscriptionThreads, RefHandle, RefHandleThreads, Subscription,
    TupleSubscription,
  },
};
use std::{collections::HashMap, hash::Hash};

/// Splits a stream into per-key sub-streams.
///
/// Each first occurrence of a key materializes a hot subject for that key;
/// the [`GroupObservable`] announcing it is emitted downstream *before*
/// the element enters the group, so a subscriber attaching synchronously
/// inside its `next` handler observes the group from its first element.
/// Late subscribers miss whatever the subject already broadcast — the
/// group is a live window, not a replay.
///
/// Every group subscription takes a child handle on the one upstream
/// subscription; the upstream is released only when the outer subscription
/// and all group subscriptions are gone.
///
/// Keys are plain values: use an `Option<K>` key type when an absent key
/// must form its own group.
#[derive(Clone)]
pub struct GroupByOp<S, D> {
  source: S,
  discr: D,
}

#[derive(Clone)]
pub struct GroupByOpThreads<S, D> {
  source: S,
  discr: D,
}

/// One per-key sub-stream, tagged with its key.
pub struct GroupObservable<Key, Sub, RC> {
  pub key: Key,
  subject: Sub,
  lease: RC,
}

impl<Key: Clone, Sub: Clone, RC: Clone> Clone
  for GroupObservable<Key, Sub, RC>
{
  fn clone(&self) -> Self {
    Self {
      key: self.key.clone(),
      subject: self.subject.clone(),
      lease: self.lease.clone(),
    }
  }
}

pub struct GroupByObserver<O, D, Key, Sub, RC> {
  observer: O,
  discr: D,
  groups: HashMap<Key, Sub>,
  lease: RC,
}

impl<Item, Err, Key, O, D, Sub, RC> Observer<Item, Err>
  for GroupByObserver<O, D, Key, Sub, RC>
where
  O: Observer<GroupObservable<Key, Sub, RC>, Err>,
  D: FnMut(&Item) -> Key,
  Key: Hash + Eq + Clone,
  Sub: Default + Clone + Observer<Item, Err>,
  RC: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let key = (self.discr)(&value);
    let observer = &mut self.observer;
    let lease = &self.lease;
    let subject = self.groups.entry(key.clone()).or_insert_with(|| {
      let subject = Sub::default();
      // announce the group before its first element goes in
      observer.next(GroupObservable {
        key,
        subject: subject.clone(),
        lease: lease.clone(),
      });
      subject
    });
    subject.next(value);
  }

  fn error(mut self, err: Err) {
    for (_, subject) in self.groups.drain() {
      subject.error(err.clone());
    }
    self.observer.error(err);
  }

  fn complete(mut self) {
    for (_, subject) in self.groups.drain() {
      subject.complete();
    }
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

macro_rules! impl_group_by_op {
  ($name: ident, $subject: ty, $refcount: ident, $handle: ident,
   $deferred: ident $(,$lf: lifetime)?) => {
    impl<S, D> $name<S, D> {
      #[inline]
      pub(crate) fn new(source: S, discr: D) -> Self { Self { source, discr } }
    }

    impl<$($lf,)? Item, Err, Key, O, S, D, SU>
      Observable<
        GroupObservable<Key, $subject, $refcount<$deferred<SU>>>,
        Err,
        O,
      > for $name<S, D>
    where
      O: Observer<GroupObservable<Key, $subject, $refcount<$deferred<SU>>>, Err>,
      S: Observable<
        Item,
        Err,
        GroupByObserver<O, D, Key, $subject, $refcount<$deferred<SU>>>,
        Unsub = SU,
      >,
      D: FnMut(&Item) -> Key,
      Key: Hash + Eq + Clone,
      Item: Clone,
      Err: Clone,
      SU: Subscription,
    {
      type Unsub = $refcount<$deferred<SU>>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let upstream = $deferred::<SU>::default();
        let lease = $refcount::new(upstream.clone());
        let unsub = self.source.actual_subscribe(GroupByObserver {
          observer,
          discr: self.discr,
          groups: HashMap::new(),
          lease: lease.clone(),
        });
        upstream.set(unsub);
        lease
      }
    }

    impl<$($lf,)? Item, Err, Key, S, D, SU> ObservableExt<
      GroupObservable<Key, $subject, $refcount<$deferred<SU>>>,
      Err,
    > for $name<S, D>
    where
      S: ObservableExt<Item, Err>,
      D: FnMut(&Item) -> Key,
    {
    }

    /// Subscribing a group attaches to its subject and takes one child
    /// handle on the shared upstream subscription.
    impl<$($lf,)? Item, Err, Key, O, U>
      Observable<Item, Err, O>
      for GroupObservable<Key, $subject, $refcount<U>>
    where
      O: Observer<Item, Err> $(+ $lf)?,
      $subject: Observable<Item, Err, O>,
      U: Subscription,
    {
      type Unsub = TupleSubscription<
        <$subject as Observable<Item, Err, O>>::Unsub,
        $handle<U>,
      >;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let handle = self.lease.handle();
        TupleSubscription::new(
          self.subject.actual_subscribe(observer),
          handle,
        )
      }
    }

    impl<$($lf,)? Item, Err, Key, U> ObservableExt<Item, Err>
      for GroupObservable<Key, $subject, $refcount<U>>
    {
    }
  };
}

impl_group_by_op!(
  GroupByOp,
  Subject<'a, Item, Err>,
  RefCountSubscription,
  RefHandle,
  DeferredSubscription,
  'a
);
impl_group_by_op!(
  GroupByOpThreads,
  SubjectThreads<Item, Err>,
  RefCountSubscriptionThreads,
  RefHandleThreads,
  DeferredSubscriptionThreads
);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, collections::HashMap, rc::Rc};

  #[test]
  fn partitions_by_key() {
    let seen: Rc<RefCell<HashMap<bool, Vec<i32>>>> =
      Rc::new(RefCell::new(HashMap::new()));
    let groups_announced = Rc::new(std::cell::Cell::new(0));
    {
      let seen = seen.clone();
      let groups_announced = groups_announced.clone();
      observable::from_iter(0..10)
        .group_by(|v| v % 2 == 0)
        .subscribe(move |group| {
          groups_announced.set(groups_announced.get() + 1);
          let key = group.key;
          let seen = seen.clone();
          group.subscribe(move |v| {
            seen.borrow_mut().entry(key).or_default().push(v);
          });
        });
    }
    assert_eq!(groups_announced.get(), 2);
    let seen = seen.borrow();
    assert_eq!(seen[&true], vec![0, 2, 4, 6, 8]);
    assert_eq!(seen[&false], vec![1, 3, 5, 7, 9]);
  }

  #[test]
  fn group_subscriber_sees_the_announcing_element() {
    // subscribing synchronously inside the announcing `next` call must
    // not miss the element that created the group
    let firsts = Rc::new(RefCell::new(vec![]));
    {
      let firsts = firsts.clone();
      observable::from_iter(vec![3, 1, 4, 1, 5])
        .group_by(|v| *v)
        .subscribe(move |group| {
          let firsts = firsts.clone();
          group.first().subscribe(move |v| firsts.borrow_mut().push(v));
        });
    }
    assert_eq!(*firsts.borrow(), vec![3, 1, 4, 5]);
  }

  #[test]
  fn completion_reaches_every_open_group() {
    let completions = Rc::new(RefCell::new(0));
    {
      let completions = completions.clone();
      observable::from_iter(0..4)
        .group_by(|v| v % 2)
        .subscribe(move |group| {
          let completions = completions.clone();
          group
            .on_complete(move || *completions.borrow_mut() += 1)
            .subscribe(|_| {});
        });
    }
    assert_eq!(*completions.borrow(), 2);
  }

  #[test]
  fn upstream_error_reaches_groups_and_outer() {
    let group_errors = Rc::new(RefCell::new(0));
    let outer_errors = Rc::new(RefCell::new(0));
    let mut source: Subject<i32, &str> = Subject::default();
    {
      let group_errors = group_errors.clone();
      let outer_errors = outer_errors.clone();
      source
        .clone()
        .group_by(|v| *v % 2)
        .on_error(move |_| *outer_errors.borrow_mut() += 1)
        .subscribe(move |group| {
          let group_errors = group_errors.clone();
          group
            .on_error(move |_| *group_errors.borrow_mut() += 1)
            .subscribe(|_| {});
        });
    }
    source.next(1);
    source.next(2);
    Observer::<i32, &str>::error(source, "boom");
    assert_eq!(*group_errors.borrow(), 2);
    assert_eq!(*outer_errors.borrow(), 1);
  }

  #[test]
  fn option_keys_give_absent_its_own_group() {
    let mut keys = vec![];
    observable::from_iter(vec![Some(1), None, Some(2), None])
      .group_by(|v: &Option<i32>| v.is_some())
      .subscribe(|group| keys.push(group.key));
    assert_eq!(keys, vec![true, false]);
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_group_by);

  fn bench_group_by(b: &mut bencher::Bencher) { b.iter(partitions_by_key); }
}
