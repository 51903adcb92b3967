use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::TupleSubscription,
  type_hint::TypeHint,
};

/// Emits, on every sampler signal, the freshest source value pushed since
/// the previous sampler signal.
///
/// The buffered value lives under one lock together with the sink; a tick
/// atomically takes-and-clears it. Once the source has completed, the next
/// sampler signal flushes whatever is buffered and completes; sampler
/// completion flushes and completes immediately.
#[derive(Clone)]
pub struct SampleOp<S, N, TickItem> {
  source: S,
  sampler: N,
  _hint: TypeHint<TickItem>,
}

#[derive(Clone)]
pub struct SampleOpThreads<S, N, TickItem> {
  source: S,
  sampler: N,
  _hint: TypeHint<TickItem>,
}

struct SampleState<O, Item> {
  observer: Option<O>,
  pending: Option<Item>,
  source_done: bool,
}

macro_rules! impl_sample_op {
  ($name: ident, $rc: ident) => {
    impl<S, N, TickItem> $name<S, N, TickItem> {
      #[inline]
      pub(crate) fn new(source: S, sampler: N) -> Self {
        Self { source, sampler, _hint: TypeHint::new() }
      }
    }

    impl<Item, TickItem, Err, O, S, N> Observable<Item, Err, O>
      for $name<S, N, TickItem>
    where
      O: Observer<Item, Err>,
      S: Observable<Item, Err, SampleSourceObserver<$rc<SampleState<O, Item>>>>,
      N: Observable<
        TickItem,
        Err,
        SampleTickObserver<$rc<SampleState<O, Item>>>,
      >,
    {
      type Unsub = TupleSubscription<S::Unsub, N::Unsub>;

      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        let state = $rc::own(SampleState {
          observer: Some(observer),
          pending: None,
          source_done: false,
        });
        let source_unsub = self
          .source
          .actual_subscribe(SampleSourceObserver { state: state.clone() });
        let sampler_unsub =
          self.sampler.actual_subscribe(SampleTickObserver { state });
        TupleSubscription::new(source_unsub, sampler_unsub)
      }
    }

    impl<Item, TickItem, Err, S, N> ObservableExt<Item, Err>
      for $name<S, N, TickItem>
    where
      S: ObservableExt<Item, Err>,
    {
    }
  };
}

impl_sample_op!(SampleOp, MutRc);
impl_sample_op!(SampleOpThreads, MutArc);

pub struct SampleSourceObserver<S> {
  state: S,
}

pub struct SampleTickObserver<S> {
  state: S,
}

macro_rules! impl_sample_observers {
  ($rc: ident) => {
    impl<Item, Err, O> Observer<Item, Err>
      for SampleSourceObserver<$rc<SampleState<O, Item>>>
    where
      O: Observer<Item, Err>,
    {
      fn next(&mut self, value: Item) {
        let mut state = self.state.rc_deref_mut();
        if state.observer.is_some() {
          state.pending = Some(value);
        }
      }

      fn error(self, err: Err) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          observer.error(err);
        }
      }

      fn complete(self) {
        // defer the terminal: the sampler flushes the final pending value
        self.state.rc_deref_mut().source_done = true;
      }

      fn is_closed(&self) -> bool {
        self
          .state
          .rc_deref()
          .observer
          .as_ref()
          .map_or(true, Observer::is_closed)
      }
    }

    impl<Item, TickItem, Err, O> Observer<TickItem, Err>
      for SampleTickObserver<$rc<SampleState<O, Item>>>
    where
      O: Observer<Item, Err>,
    {
      fn next(&mut self, _tick: TickItem) {
        let (value, settled) = {
          let mut state = self.state.rc_deref_mut();
          let value = state.pending.take();
          let settled =
            if state.source_done { state.observer.take() } else { None };
          (value, settled)
        };
        match settled {
          Some(mut observer) => {
            if let Some(value) = value {
              observer.next(value);
            }
            observer.complete();
          }
          None => {
            if let Some(value) = value {
              if let Some(observer) =
                self.state.rc_deref_mut().observer.as_mut()
              {
                observer.next(value);
              }
            }
          }
        }
      }

      fn error(self, err: Err) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          observer.error(err);
        }
      }

      fn complete(self) {
        let (value, observer) = {
          let mut state = self.state.rc_deref_mut();
          (state.pending.take(), state.observer.take())
        };
        if let Some(mut observer) = observer {
          if let Some(value) = value {
            observer.next(value);
          }
          observer.complete();
        }
      }

      fn is_closed(&self) -> bool {
        self
          .state
          .rc_deref()
          .observer
          .as_ref()
          .map_or(true, Observer::is_closed)
      }
    }
  };
}

impl_sample_observers!(MutRc);
impl_sample_observers!(MutArc);

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn emits_freshest_value_per_tick() {
    let out = Rc::new(RefCell::new(vec![]));
    let mut data: Subject<i32, ()> = Subject::default();
    let mut ticks = Subject::default();
    {
      let out = out.clone();
      data
        .clone()
        .sample(ticks.clone())
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    data.next(1);
    data.next(2);
    data.next(3);
    ticks.next(());
    assert_eq!(*out.borrow(), vec![3]);

    // no data since last tick: the tick emits nothing
    ticks.next(());
    assert_eq!(*out.borrow(), vec![3]);

    data.next(4);
    ticks.next(());
    assert_eq!(*out.borrow(), vec![3, 4]);
  }

  #[test]
  fn tick_after_source_end_flushes_then_completes() {
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let mut data = Subject::default();
    let mut ticks = Subject::default();
    {
      let out = out.clone();
      let completed = completed.clone();
      data
        .clone()
        .sample(ticks.clone())
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    data.next(7);
    Observer::<i32, ()>::complete(data);
    assert!(!*completed.borrow());
    ticks.next(());
    assert_eq!(*out.borrow(), vec![7]);
    assert!(*completed.borrow());
  }

  #[test]
  fn sampler_completion_flushes_final_value() {
    let out = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let mut data = Subject::default();
    let ticks = Subject::default();
    {
      let out = out.clone();
      let completed = completed.clone();
      data
        .clone()
        .sample(ticks.clone())
        .on_complete(move || *completed.borrow_mut() = true)
        .subscribe(move |v| out.borrow_mut().push(v));
    }
    data.next(4);
    Observer::<i32, ()>::complete(ticks);
    assert_eq!(*out.borrow(), vec![4]);
    assert!(*completed.borrow());
  }

  #[test]
  fn sampler_error_propagates() {
    let errors = Rc::new(RefCell::new(0));
    let data = Subject::default();
    let ticks = Subject::default();
    {
      let errors = errors.clone();
      data
        .clone()
        .sample(ticks.clone())
        .on_error(move |_: &&str| *errors.borrow_mut() += 1)
        .subscribe(|_: i32| {});
    }
    Observer::<(), &str>::error(ticks, "boom");
    assert_eq!(*errors.borrow(), 1);
  }
}
