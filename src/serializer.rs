use crate::{
  observer::Observer,
  rc::{CounterArc, CounterRc, MutArc, MutRc, RcDeref, RcDerefMut, SharedCounter},
  type_hint::TypeHint,
};

/// The terminal slot of the serializer protocol.
///
/// `Handled` occupies the slot after a terminal has been forwarded, so a
/// later deposit attempt can never re-arm the slot.
enum TerminalSlot<Err> {
  Empty,
  Error(Err),
  Complete,
  Handled,
}

macro_rules! impl_half_serializer {
  ($name: ident, $rc: ident, $counter: ident) => {
    /// Merges signal emissions from two or more unsynchronized call sites
    /// into the single legal sequence the downstream observer requires.
    ///
    /// Protocol state is a work-in-progress counter plus a first-write-wins
    /// terminal slot:
    ///
    /// - `forward_next` claims the counter 0→1, forwards, then decrements.
    ///   A failed claim means another emission is in flight; the value is
    ///   dropped (a next/next race is already outside the observer
    ///   contract). A decrement that observes contention means a terminal
    ///   was deposited mid-emission, and the owner forwards it on the way
    ///   out.
    /// - `forward_error` / `forward_complete` deposit into the slot (first
    ///   deposit wins), then increment the counter; whoever increments from
    ///   zero owns the forwarding. The counter stays non-zero after a
    ///   forwarded terminal, so no later value can claim it.
    ///
    /// The downstream observer therefore sees a strictly serialized,
    /// legally terminated sequence no matter how many call sites push
    /// concurrently — and the same protocol resolves same-thread reentrancy
    /// in single-thread pipelines.
    pub struct $name<O, Item, Err> {
      observer: $rc<Option<O>>,
      wip: $counter,
      terminal: $rc<TerminalSlot<Err>>,
      _hint: TypeHint<Item>,
    }

    impl<O, Item, Err> Clone for $name<O, Item, Err> {
      fn clone(&self) -> Self {
        Self {
          observer: self.observer.clone(),
          wip: self.wip.clone(),
          terminal: self.terminal.clone(),
          _hint: TypeHint::new(),
        }
      }
    }

    impl<O, Item, Err> $name<O, Item, Err>
    where
      O: Observer<Item, Err>,
    {
      pub fn new(observer: O) -> Self {
        Self {
          observer: $rc::own(Some(observer)),
          wip: $counter::counter(0),
          terminal: $rc::own(TerminalSlot::Empty),
          _hint: TypeHint::new(),
        }
      }

      pub fn forward_next(&self, value: Item) {
        if !self.wip.compare_swap(0, 1) {
          // another emission is in flight; this value is not deliverable
          return;
        }
        if let Some(observer) = self.observer.rc_deref_mut().as_mut() {
          observer.next(value);
        }
        if self.wip.decr() != 1 {
          self.drain_terminal();
        }
      }

      pub fn forward_error(&self, err: Err) {
        {
          let mut slot = self.terminal.rc_deref_mut();
          if !matches!(*slot, TerminalSlot::Empty) {
            return;
          }
          *slot = TerminalSlot::Error(err);
        }
        if self.wip.incr() == 0 {
          self.drain_terminal();
        }
      }

      pub fn forward_complete(&self) {
        {
          let mut slot = self.terminal.rc_deref_mut();
          if !matches!(*slot, TerminalSlot::Empty) {
            return;
          }
          *slot = TerminalSlot::Complete;
        }
        if self.wip.incr() == 0 {
          self.drain_terminal();
        }
      }

      fn drain_terminal(&self) {
        let signal = std::mem::replace(
          &mut *self.terminal.rc_deref_mut(),
          TerminalSlot::Handled,
        );
        let observer = self.observer.rc_deref_mut().take();
        match (signal, observer) {
          (TerminalSlot::Error(err), Some(observer)) => observer.error(err),
          (TerminalSlot::Complete, Some(observer)) => observer.complete(),
          _ => {}
        }
      }

      /// A terminal has been deposited (it may still be in flight).
      pub fn is_terminated(&self) -> bool {
        !matches!(*self.terminal.rc_deref(), TerminalSlot::Empty)
      }

      pub fn is_closed(&self) -> bool {
        self.is_terminated()
          || self.observer.rc_deref().as_ref().map_or(true, Observer::is_closed)
      }
    }
  };
}

impl_half_serializer!(HalfSerializer, MutRc, CounterRc);
impl_half_serializer!(HalfSerializerThreads, MutArc, CounterArc);
