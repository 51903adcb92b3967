mod create;
mod defer;
mod from_iter;
mod of;
mod trivial;

pub use create::{create, Create};
pub use defer::{defer, Defer};
pub use from_iter::{from_iter, repeat, ObservableIter};
pub use of::{of, OfObservable};
pub use trivial::{empty, never, throw, Empty, Never, Throw};

pub use crate::ops::amb::{amb_iter, amb_iter_threads};
pub use crate::ops::concat::{concat_iter, concat_iter_threads};

use crate::{
  observer::{NextObserver, Observer},
  ops::{
    amb::{AmbOp, AmbOpThreads},
    box_it::{BoxObservable, BoxObservableThreads},
    concat::{ConcatAllOp, ConcatAllOpThreads, ConcatOp, ConcatOpThreads},
    default_if_empty::DefaultIfEmptyOp,
    dematerialize::DematerializeOp,
    distinct_until_changed::DistinctUntilChangedOp,
    filter::FilterOp,
    filter_map::FilterMapOp,
    finalize::{FinalizeOp, FinalizeOpThreads},
    group_by::{GroupByOp, GroupByOpThreads},
    last::{LastOp, LastOrOp},
    map::MapOp,
    map_err::MapErrOp,
    materialize::MaterializeOp,
    merge::{MergeOp, MergeOpThreads},
    on_complete::OnCompleteOp,
    on_error::OnErrorOp,
    pairwise::PairwiseOp,
    publish::{ConnectableObservable, ConnectableObservableThreads},
    pull::{LatestIter, NextIter, PullObserverThreads},
    sample::{SampleOp, SampleOpThreads},
    scan::ScanOp,
    skip::SkipOp,
    skip_until::{SkipUntilOp, SkipUntilOpThreads},
    skip_while::SkipWhileOp,
    start_with::StartWithOp,
    stream::{
      IntoStream, IntoStreamThreads, StreamObserver, StreamObserverThreads,
    },
    switch::{SwitchOp, SwitchOpThreads},
    take::TakeOp,
    take_last::TakeLastOp,
    take_until::{TakeUntilOp, TakeUntilOpThreads},
    take_while::TakeWhileOp,
    tap::TapOp,
    with_latest_from::{WithLatestFromOp, WithLatestFromOpThreads},
    zip::{ZipOp, ZipOpThreads},
    AverageOp, CountOp, FirstOrOp, MinMaxOp, ReduceOp, SumOp, SwitchMapOp,
    SwitchMapOpThreads,
  },
  subscription::Subscription,
  type_hint::TypeHint,
};

/// The capability at the heart of the engine: given an observer, start one
/// subscription and hand back its unsubscription handle.
///
/// An operator struct is the *producer* half of the pattern — it owns the
/// upstream source plus the operator configuration, and `actual_subscribe`
/// builds the per-subscription observer (the *sink*) that it runs against
/// the upstream. Producers are plain values; subscribing consumes one
/// producer instance, so re-subscription works by cloning the chain.
pub trait Observable<Item, Err, O: Observer<Item, Err>> {
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Operator methods, available on every observable chain.
///
/// The trait only names the element and error types; each method simply
/// wraps `self` into the next producer. Whether the result is subscribable
/// is decided where `subscribe` is called, which keeps operator composition
/// free of observer-type noise.
pub trait ObservableExt<Item, Err>: Sized {
  /// Subscribes with a value handler. Terminal signals are discarded here;
  /// chain [`on_error`](ObservableExt::on_error) /
  /// [`on_complete`](ObservableExt::on_complete) beforehand to observe
  /// them.
  fn subscribe<N>(
    self, next: N,
  ) -> <Self as Observable<Item, Err, NextObserver<N>>>::Unsub
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, NextObserver<N>>,
  {
    self.actual_subscribe(NextObserver(next))
  }

  // ---- single-source transformations -----------------------------------

  fn map<B, F>(self, f: F) -> MapOp<Self, F, Item>
  where
    F: FnMut(Item) -> B,
  {
    MapOp { source: self, f, _hint: TypeHint::new() }
  }

  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    FilterOp { source: self, predicate }
  }

  fn filter_map<B, F>(self, f: F) -> FilterMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Option<B>,
  {
    FilterMapOp { source: self, f, _hint: TypeHint::new() }
  }

  fn map_err<E, F>(self, f: F) -> MapErrOp<Self, F, Err>
  where
    F: FnMut(Err) -> E,
  {
    MapErrOp { source: self, f, _hint: TypeHint::new() }
  }

  /// Emits every intermediate accumulation, starting from `initial`.
  fn scan_initial<B, F>(self, initial: B, f: F) -> ScanOp<Self, F, B, Item>
  where
    B: Clone,
    F: FnMut(B, Item) -> B,
  {
    ScanOp { source: self, f, initial, _hint: TypeHint::new() }
  }

  /// Folds the sequence and emits only the final accumulation (or
  /// `initial` for an empty sequence).
  fn reduce_initial<B, F>(self, initial: B, f: F) -> ReduceOp<Self, F, B, Item>
  where
    B: Clone,
    F: FnMut(B, Item) -> B,
  {
    LastOrOp {
      source: ScanOp {
        source: self,
        f,
        initial: initial.clone(),
        _hint: TypeHint::new(),
      },
      default: initial,
    }
  }

  fn count(self) -> CountOp<Self, Item> {
    let tally: fn(usize, Item) -> usize = |acc, _| acc + 1;
    self.reduce_initial(0, tally)
  }

  fn sum(self) -> SumOp<Self, Item>
  where
    Item: Default + std::ops::Add<Output = Item> + Clone,
  {
    let add: fn(Item, Item) -> Item = |acc, v| acc + v;
    self.reduce_initial(Item::default(), add)
  }

  fn min(self) -> MinMaxOp<Self, Item>
  where
    Item: PartialOrd + Clone,
  {
    let keep: fn(Option<Item>, Item) -> Option<Item> = |acc, v| match acc {
      Some(best) if best <= v => Some(best),
      _ => Some(v),
    };
    let done: fn(Option<Item>) -> Option<Item> = |v| v;
    self.reduce_initial(None, keep).filter_map(done)
  }

  fn max(self) -> MinMaxOp<Self, Item>
  where
    Item: PartialOrd + Clone,
  {
    let keep: fn(Option<Item>, Item) -> Option<Item> = |acc, v| match acc {
      Some(best) if best >= v => Some(best),
      _ => Some(v),
    };
    let done: fn(Option<Item>) -> Option<Item> = |v| v;
    self.reduce_initial(None, keep).filter_map(done)
  }

  /// Arithmetic mean of the sequence; completes empty when the source
  /// emitted nothing.
  fn average(self) -> AverageOp<Self, Item>
  where
    Item: Into<f64>,
  {
    let accumulate: fn((f64, usize), Item) -> (f64, usize) =
      |(sum, n), v| (sum + v.into(), n + 1);
    let finish: fn((f64, usize)) -> Option<f64> =
      |(sum, n)| if n == 0 { None } else { Some(sum / n as f64) };
    self.reduce_initial((0.0, 0), accumulate).filter_map(finish)
  }

  // ---- slicing ---------------------------------------------------------

  fn take(self, count: usize) -> TakeOp<Self> {
    TakeOp { source: self, count }
  }

  fn take_while<F>(self, predicate: F) -> TakeWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    TakeWhileOp { source: self, predicate }
  }

  fn take_last(self, count: usize) -> TakeLastOp<Self> {
    TakeLastOp { source: self, count }
  }

  fn skip(self, count: usize) -> SkipOp<Self> {
    SkipOp { source: self, count }
  }

  fn skip_while<F>(self, predicate: F) -> SkipWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    SkipWhileOp { source: self, predicate }
  }

  fn first(self) -> TakeOp<Self> { self.take(1) }

  fn first_or(self, default: Item) -> FirstOrOp<Self, Item> {
    self.take(1).default_if_empty(default)
  }

  /// Emits `default` in place of completion when the source completed
  /// without a value.
  fn default_if_empty(self, default: Item) -> DefaultIfEmptyOp<Self, Item> {
    DefaultIfEmptyOp { source: self, default }
  }

  fn last(self) -> LastOp<Self, Item> {
    LastOp { source: self, _hint: TypeHint::new() }
  }

  fn last_or(self, default: Item) -> LastOrOp<Self, Item> {
    LastOrOp { source: self, default }
  }

  fn distinct_until_changed(self) -> DistinctUntilChangedOp<Self> {
    DistinctUntilChangedOp { source: self }
  }

  /// Emits each value paired with its predecessor.
  fn pairwise(self) -> PairwiseOp<Self> { PairwiseOp { source: self } }

  fn start_with(self, value: Item) -> StartWithOp<Self, Item> {
    StartWithOp { source: self, value }
  }

  // ---- lifecycle hooks -------------------------------------------------

  fn tap<F>(self, f: F) -> TapOp<Self, F>
  where
    F: FnMut(&Item),
  {
    TapOp { source: self, f }
  }

  fn on_error<F>(self, f: F) -> OnErrorOp<Self, F>
  where
    F: FnOnce(&Err),
  {
    OnErrorOp { source: self, f }
  }

  fn on_complete<F>(self, f: F) -> OnCompleteOp<Self, F>
  where
    F: FnOnce(),
  {
    OnCompleteOp { source: self, f }
  }

  /// Runs `f` exactly once when the subscription settles, whether by
  /// terminal signal or by unsubscription.
  fn finalize<F>(self, f: F) -> FinalizeOp<Self, F>
  where
    F: FnOnce(),
  {
    FinalizeOp::new(self, f)
  }

  fn finalize_threads<F>(self, f: F) -> FinalizeOpThreads<Self, F>
  where
    F: FnOnce(),
  {
    FinalizeOpThreads::new(self, f)
  }

  // ---- signal reification ----------------------------------------------

  fn materialize(self) -> MaterializeOp<Self> {
    MaterializeOp { source: self }
  }

  fn dematerialize(self) -> DematerializeOp<Self> {
    DematerializeOp { source: self }
  }

  // ---- combination -----------------------------------------------------

  fn merge<S>(self, other: S) -> MergeOp<Self, S> {
    MergeOp::new(self, other)
  }

  fn merge_threads<S>(self, other: S) -> MergeOpThreads<Self, S> {
    MergeOpThreads::new(self, other)
  }

  fn zip<S>(self, other: S) -> ZipOp<Self, S> { ZipOp::new(self, other) }

  fn zip_threads<S>(self, other: S) -> ZipOpThreads<Self, S> {
    ZipOpThreads::new(self, other)
  }

  /// Pairs each value with the latest value of `other`; values arriving
  /// before `other` has emitted are dropped.
  fn with_latest_from<S>(self, other: S) -> WithLatestFromOp<Self, S> {
    WithLatestFromOp::new(self, other)
  }

  fn with_latest_from_threads<S>(
    self, other: S,
  ) -> WithLatestFromOpThreads<Self, S> {
    WithLatestFromOpThreads::new(self, other)
  }

  /// Emits, on every `sampler` tick, the freshest value pushed since the
  /// previous tick.
  fn sample<S, TickItem>(self, sampler: S) -> SampleOp<Self, S, TickItem> {
    SampleOp::new(self, sampler)
  }

  fn sample_threads<S, TickItem>(
    self, sampler: S,
  ) -> SampleOpThreads<Self, S, TickItem> {
    SampleOpThreads::new(self, sampler)
  }

  /// Mirrors the source until `notifier` signals; any notifier signal ends
  /// the stream (a notifier error propagates as error).
  fn take_until<N, NotifyItem>(
    self, notifier: N,
  ) -> TakeUntilOp<Self, N, NotifyItem> {
    TakeUntilOp::new(self, notifier)
  }

  fn take_until_threads<N, NotifyItem>(
    self, notifier: N,
  ) -> TakeUntilOpThreads<Self, N, NotifyItem> {
    TakeUntilOpThreads::new(self, notifier)
  }

  /// Drops values until `notifier` emits its first value, then mirrors the
  /// source.
  fn skip_until<N, NotifyItem>(
    self, notifier: N,
  ) -> SkipUntilOp<Self, N, NotifyItem> {
    SkipUntilOp::new(self, notifier)
  }

  fn skip_until_threads<N, NotifyItem>(
    self, notifier: N,
  ) -> SkipUntilOpThreads<Self, N, NotifyItem> {
    SkipUntilOpThreads::new(self, notifier)
  }

  /// Races `self` against `other`: whichever signals first becomes the
  /// output, the loser is disposed and contributes nothing.
  fn amb<S>(self, other: S) -> AmbOp<Self, S> { AmbOp::new(self, other) }

  fn amb_threads<S>(self, other: S) -> AmbOpThreads<Self, S> {
    AmbOpThreads::new(self, other)
  }

  // ---- flattening ------------------------------------------------------

  /// Forwards from the most recently emitted inner observable, dropping
  /// signals of superseded inners.
  fn switch<Inner>(self) -> SwitchOp<Self, Inner> { SwitchOp::new(self) }

  fn switch_threads<Inner>(self) -> SwitchOpThreads<Self, Inner> {
    SwitchOpThreads::new(self)
  }

  fn switch_map<F, Inner>(self, f: F) -> SwitchMapOp<Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    self.map(f).switch()
  }

  fn switch_map_threads<F, Inner>(
    self, f: F,
  ) -> SwitchMapOpThreads<Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    self.map(f).switch_threads()
  }

  /// Emits all of `self`, then all of `other`.
  fn concat<S>(self, other: S) -> ConcatOp<Self, S> {
    ConcatOp::new(self, other)
  }

  fn concat_threads<S>(self, other: S) -> ConcatOpThreads<Self, S> {
    ConcatOpThreads::new(self, other)
  }

  /// Subscribes the emitted inner observables one at a time, in arrival
  /// order, buffering the rest.
  fn concat_all<Inner>(self) -> ConcatAllOp<Self, Inner> {
    ConcatAllOp::new(self)
  }

  fn concat_all_threads<Inner>(self) -> ConcatAllOpThreads<Self, Inner> {
    ConcatAllOpThreads::new(self)
  }

  // ---- demultiplexing & sharing ----------------------------------------

  /// Splits the sequence into per-key group observables.
  ///
  /// Group streams are hot: subscribe to a group inside the `next` handler
  /// that announced it, or its earliest elements are missed. All groups
  /// share the single upstream subscription; it is torn down once the
  /// outer subscription and every group subscription are gone.
  fn group_by<Key, Discr>(self, discr: Discr) -> GroupByOp<Self, Discr>
  where
    Discr: FnMut(&Item) -> Key,
  {
    GroupByOp::new(self, discr)
  }

  fn group_by_threads<Key, Discr>(
    self, discr: Discr,
  ) -> GroupByOpThreads<Self, Discr>
  where
    Discr: FnMut(&Item) -> Key,
  {
    GroupByOpThreads::new(self, discr)
  }

  /// Multicasts the source through a subject; the upstream is subscribed
  /// when [`connect`](ConnectableObservable::connect) is called.
  fn publish<'a>(self) -> ConnectableObservable<'a, Self, Item, Err> {
    ConnectableObservable::new(self)
  }

  fn publish_threads(self) -> ConnectableObservableThreads<Self, Item, Err> {
    ConnectableObservableThreads::new(self)
  }

  // ---- type erasure ----------------------------------------------------

  fn box_it<'a>(self) -> BoxObservable<'a, Item, Err>
  where
    Self: 'a,
    Self: Observable<Item, Err, crate::observer::BoxObserver<'a, Item, Err>>,
    <Self as Observable<
      Item,
      Err,
      crate::observer::BoxObserver<'a, Item, Err>,
    >>::Unsub: 'a,
  {
    BoxObservable::new(self)
  }

  fn box_it_threads(self) -> BoxObservableThreads<Item, Err>
  where
    Self: Send + 'static,
    Self: Observable<Item, Err, crate::observer::BoxObserverThreads<Item, Err>>,
    <Self as Observable<
      Item,
      Err,
      crate::observer::BoxObserverThreads<Item, Err>,
    >>::Unsub: Send + 'static,
  {
    BoxObservableThreads::new(self)
  }

  // ---- leaving the push world ------------------------------------------

  /// Subscribes and bridges the subscription into a `futures::Stream` of
  /// `Result<Item, Err>`.
  fn into_stream(
    self,
  ) -> IntoStream<
    Item,
    Err,
    <Self as Observable<Item, Err, StreamObserver<Item, Err>>>::Unsub,
  >
  where
    Self: Observable<Item, Err, StreamObserver<Item, Err>>,
  {
    IntoStream::subscribe_on(self)
  }

  fn into_stream_threads(
    self,
  ) -> IntoStreamThreads<
    Item,
    Err,
    <Self as Observable<Item, Err, StreamObserverThreads<Item, Err>>>::Unsub,
  >
  where
    Self: Observable<Item, Err, StreamObserverThreads<Item, Err>>,
  {
    IntoStreamThreads::subscribe_on(self)
  }

  /// Blocking pull: each call to `next` waits for a signal and yields the
  /// freshest value pushed since the previous pull (staler values are
  /// overwritten). Requires the source to be driven from other threads.
  fn latest_iter(
    self,
  ) -> LatestIter<
    Item,
    Err,
    <Self as Observable<Item, Err, PullObserverThreads<Item, Err>>>::Unsub,
  >
  where
    Self: Observable<Item, Err, PullObserverThreads<Item, Err>>,
    Item: Send + 'static,
    Err: Send + 'static,
  {
    LatestIter::subscribe_on(self)
  }

  /// Blocking pull: values pushed while no pull is waiting are dropped, so
  /// every pull observes a value that arrived after it started waiting.
  fn next_iter(
    self,
  ) -> NextIter<
    Item,
    Err,
    <Self as Observable<Item, Err, PullObserverThreads<Item, Err>>>::Unsub,
  >
  where
    Self: Observable<Item, Err, PullObserverThreads<Item, Err>>,
    Item: Send + 'static,
    Err: Send + 'static,
  {
    NextIter::subscribe_on(self)
  }
}
