use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDerefMut},
  subject::{Subject, SubjectThreads},
  subscription::Subscription,
};

/// A multicast pairing of a cold source with a hot subject.
///
/// Subscribers attach to the subject; the source is not touched until
/// [`connect`](ConnectableObservable::connect) subscribes it through the
/// subject, at which point every attached subscriber observes the same
/// single upstream run.
pub struct ConnectableObservable<'a, S, Item, Err> {
  source: S,
  subject: Subject<'a, Item, Err>,
}

pub struct ConnectableObservableThreads<S, Item, Err> {
  source: S,
  subject: SubjectThreads<Item, Err>,
}

struct ShareInner<S, Subj, CU> {
  source: S,
  subject: Subj,
  connection: Option<CU>,
  subscribers: usize,
}

macro_rules! impl_connectable {
  ($name: ident, $share: ident, $subject: ty, $rc: ident
    $(,$lf: lifetime)? $(; $send: ident)?) => {
    impl<$($lf,)? S, Item, Err> $name<$($lf,)? S, Item, Err> {
      pub(crate) fn new(source: S) -> Self {
        Self { source, subject: <$subject>::default() }
      }

      /// Subscribes the source through the subject, starting the shared
      /// upstream run. The returned handle tears that run down.
      pub fn connect(self) -> S::Unsub
      where
        S: Observable<Item, Err, $subject>,
        Item: Clone,
        Err: Clone,
      {
        self.source.actual_subscribe(self.subject)
      }

      /// Connects on the first subscriber and tears the connection down
      /// when the last subscriber leaves.
      pub fn ref_count<CU>(self) -> $share<$($lf,)? S, Item, Err, CU>
      where
        S: Observable<Item, Err, $subject, Unsub = CU>,
        Item: Clone,
        Err: Clone,
      {
        $share {
          inner: $rc::own(ShareInner {
            source: self.source,
            subject: self.subject,
            connection: None,
            subscribers: 0,
          }),
        }
      }
    }

    impl<$($lf,)? S, Item, Err, O> Observable<Item, Err, O>
      for $name<$($lf,)? S, Item, Err>
    where
      O: Observer<Item, Err> $(+ $lf)? $(+ $send + 'static)?,
      Err: Clone,
    {
      type Unsub = <$subject as Observable<Item, Err, O>>::Unsub;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        self.subject.actual_subscribe(observer)
      }
    }

    impl<$($lf,)? S, Item, Err> ObservableExt<Item, Err>
      for $name<$($lf,)? S, Item, Err>
    {
    }
  };
}

impl_connectable!(ConnectableObservable, ShareOp, Subject<'a, Item, Err>, MutRc, 'a);
impl_connectable!(
  ConnectableObservableThreads,
  ShareOpThreads,
  SubjectThreads<Item, Err>,
  MutArc;
  Send
);

/// The auto-connecting wrapper returned by `ref_count`.
///
/// The connection is made with a clone of the source, so the source must
/// be cheaply cloneable (subjects and operator chains over them are). Once
/// the shared run terminates, the subject is settled and later
/// subscribers observe its terminal replay.
pub struct ShareOp<'a, S, Item, Err, CU> {
  inner: MutRc<ShareInner<S, Subject<'a, Item, Err>, CU>>,
}

pub struct ShareOpThreads<S, Item, Err, CU> {
  inner: MutArc<ShareInner<S, SubjectThreads<Item, Err>, CU>>,
}

/// Subscription handle for one `ref_count` subscriber.
pub struct ShareSubscription<St, SS> {
  inner: St,
  subject_sub: SS,
}

macro_rules! impl_share_op {
  ($name: ident, $subject: ty, $rc: ident $(,$lf: lifetime)? $(; $send: ident)?) => {
    impl<$($lf,)? S, Item, Err, CU> Clone for $name<$($lf,)? S, Item, Err, CU> {
      fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
    }

    impl<$($lf,)? S, Item, Err, CU, O> Observable<Item, Err, O>
      for $name<$($lf,)? S, Item, Err, CU>
    where
      O: Observer<Item, Err> $(+ $lf)? $(+ $send + 'static)?,
      S: Observable<Item, Err, $subject, Unsub = CU> + Clone,
      CU: Subscription,
      Item: Clone,
      Err: Clone,
    {
      type Unsub = ShareSubscription<
        $rc<ShareInner<S, $subject, CU>>,
        <$subject as Observable<Item, Err, O>>::Unsub,
      >;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let (subject_sub, connect_with) = {
          let mut inner = self.inner.rc_deref_mut();
          inner.subscribers += 1;
          let subject_sub =
            inner.subject.clone().actual_subscribe(observer);
          // only the subscriber that took the count from zero connects
          let connect_with =
            if inner.subscribers == 1 && inner.connection.is_none() {
              Some((inner.source.clone(), inner.subject.clone()))
            } else {
              None
            };
          (subject_sub, connect_with)
        };
        if let Some((source, subject)) = connect_with {
          let connection = source.actual_subscribe(subject);
          let displaced = {
            let mut inner = self.inner.rc_deref_mut();
            if inner.subscribers == 0 {
              // everyone left while the connection was being made
              Some(connection)
            } else {
              inner.connection = Some(connection);
              None
            }
          };
          if let Some(displaced) = displaced {
            displaced.unsubscribe();
          }
        }
        ShareSubscription { inner: self.inner.clone(), subject_sub }
      }
    }

    impl<$($lf,)? S, Item, Err, CU> ObservableExt<Item, Err>
      for $name<$($lf,)? S, Item, Err, CU>
    {
    }

    impl<$($lf,)? S, Item, Err, CU, SS> Subscription
      for ShareSubscription<$rc<ShareInner<S, $subject, CU>>, SS>
    where
      SS: Subscription,
      CU: Subscription,
    {
      fn unsubscribe(self) {
        self.subject_sub.unsubscribe();
        let connection = {
          let mut inner = self.inner.rc_deref_mut();
          inner.subscribers -= 1;
          if inner.subscribers == 0 { inner.connection.take() } else { None }
        };
        if let Some(connection) = connection {
          connection.unsubscribe();
        }
      }

      fn is_closed(&self) -> bool { self.subject_sub.is_closed() }
    }
  };
}

impl_share_op!(ShareOp, Subject<'a, Item, Err>, MutRc, 'a);
impl_share_op!(ShareOpThreads, SubjectThreads<Item, Err>, MutArc; Send);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn connect_drives_all_subscribers_once() {
    let first = Rc::new(RefCell::new(vec![]));
    let second = Rc::new(RefCell::new(vec![]));
    let connectable = observable::from_iter(0..3).publish();
    {
      let first = first.clone();
      connectable
        .subject
        .clone()
        .subscribe(move |v| first.borrow_mut().push(v));
    }
    {
      let second = second.clone();
      connectable
        .subject
        .clone()
        .subscribe(move |v| second.borrow_mut().push(v));
    }
    connectable.connect();
    assert_eq!(*first.borrow(), vec![0, 1, 2]);
    assert_eq!(*second.borrow(), vec![0, 1, 2]);
  }

  #[test]
  fn nothing_flows_before_connect() {
    let seen = Rc::new(RefCell::new(vec![]));
    let connectable = observable::from_iter(0..3).publish();
    {
      let seen = seen.clone();
      connectable
        .subject
        .clone()
        .subscribe(move |v| seen.borrow_mut().push(v));
    }
    assert!(seen.borrow().is_empty());
    connectable.connect();
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
  }

  #[test]
  fn ref_count_connects_on_first_subscriber() {
    let seen = Rc::new(RefCell::new(vec![]));
    let mut source: Subject<i32, ()> = Subject::default();
    let shared = source.clone().publish().ref_count();
    assert_eq!(source.subscribed_size(), 0);

    let sub = {
      let seen = seen.clone();
      shared
        .clone()
        .subscribe(move |v| seen.borrow_mut().push(v))
    };
    assert_eq!(source.subscribed_size(), 1);
    source.next(7);
    assert_eq!(*seen.borrow(), vec![7]);

    sub.unsubscribe();
    // last subscriber gone: the shared connection is torn down
    assert_eq!(source.subscribed_size(), 0);
  }

  #[test]
  fn ref_count_shares_one_upstream() {
    let mut source: Subject<i32, ()> = Subject::default();
    let shared = source.clone().publish().ref_count();
    let s1 = shared.clone().subscribe(|_| {});
    let _s2 = shared.clone().subscribe(|_| {});
    assert_eq!(source.subscribed_size(), 1);
    s1.unsubscribe();
    assert_eq!(source.subscribed_size(), 1);
  }
}
