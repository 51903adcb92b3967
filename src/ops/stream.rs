use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  rc::{MutArc, MutRc, RcDerefMut},
  subscription::Subscription,
};
use futures::{task::AtomicWaker, Stream};
use std::{
  collections::VecDeque,
  pin::Pin,
  task::{Context, Poll},
};

struct StreamState<Item, Err> {
  queue: VecDeque<Notification<Item, Err>>,
  waker: AtomicWaker,
}

impl<Item, Err> Default for StreamState<Item, Err> {
  fn default() -> Self {
    StreamState { queue: VecDeque::new(), waker: AtomicWaker::new() }
  }
}

/// Push-side sink of the stream bridge: signals queue up and the pending
/// poll, if any, is woken.
pub struct StreamObserver<Item, Err> {
  state: MutRc<StreamState<Item, Err>>,
}

pub struct StreamObserverThreads<Item, Err> {
  state: MutArc<StreamState<Item, Err>>,
}

macro_rules! impl_stream_observer {
  ($name: ident, $rc: ident) => {
    impl<Item, Err> Observer<Item, Err> for $name<Item, Err> {
      fn next(&mut self, value: Item) {
        let mut state = self.state.rc_deref_mut();
        state.queue.push_back(Notification::Next(value));
        state.waker.wake();
      }

      fn error(self, err: Err) {
        let mut state = self.state.rc_deref_mut();
        state.queue.push_back(Notification::Error(err));
        state.waker.wake();
      }

      fn complete(self) {
        let mut state = self.state.rc_deref_mut();
        state.queue.push_back(Notification::Complete);
        state.waker.wake();
      }

      fn is_closed(&self) -> bool { false }
    }
  };
}

impl_stream_observer!(StreamObserver, MutRc);
impl_stream_observer!(StreamObserverThreads, MutArc);

macro_rules! impl_observable_stream {
  ($name: ident, $observer: ident, $rc: ident) => {
    /// A `futures::Stream` view of a push subscription, yielding
    /// `Result<Item, Err>` and ending after an error or completion.
    /// Dropping the stream unsubscribes upstream.
    pub struct $name<Item, Err, U: Subscription> {
      state: $rc<StreamState<Item, Err>>,
      unsub: Option<U>,
      done: bool,
    }

    impl<Item, Err, U: Subscription> $name<Item, Err, U> {
      pub(crate) fn subscribe_on<S>(source: S) -> Self
      where
        S: Observable<Item, Err, $observer<Item, Err>, Unsub = U>,
      {
        let state = $rc::own(StreamState::default());
        let unsub = source
          .actual_subscribe($observer { state: state.clone() });
        Self { state, unsub: Some(unsub), done: false }
      }

      fn take_signal(&mut self) -> Option<Notification<Item, Err>> {
        self.state.rc_deref_mut().queue.pop_front()
      }
    }

    impl<Item, Err, U: Subscription + Unpin> Stream for $name<Item, Err, U>
    where
      Item: Unpin,
      Err: Unpin,
    {
      type Item = Result<Item, Err>;

      fn poll_next(
        self: Pin<&mut Self>, cx: &mut Context<'_>,
      ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
          return Poll::Ready(None);
        }
        let signal = match this.take_signal() {
          Some(signal) => Some(signal),
          None => {
            this.state.rc_deref_mut().waker.register(cx.waker());
            // a signal may have landed between the empty pop and the
            // waker registration
            this.take_signal()
          }
        };
        match signal {
          Some(Notification::Next(value)) => Poll::Ready(Some(Ok(value))),
          Some(Notification::Error(err)) => {
            this.done = true;
            Poll::Ready(Some(Err(err)))
          }
          Some(Notification::Complete) => {
            this.done = true;
            Poll::Ready(None)
          }
          None => Poll::Pending,
        }
      }
    }

    impl<Item, Err, U: Subscription> Drop for $name<Item, Err, U> {
      fn drop(&mut self) {
        if let Some(unsub) = self.unsub.take() {
          unsub.unsubscribe();
        }
      }
    }
  };
}

impl_observable_stream!(IntoStream, StreamObserver, MutRc);
impl_observable_stream!(IntoStreamThreads, StreamObserverThreads, MutArc);
