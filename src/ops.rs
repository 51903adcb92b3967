pub mod amb;
pub mod box_it;
pub mod concat;
pub mod default_if_empty;
pub mod dematerialize;
pub mod distinct_until_changed;
pub mod filter;
pub mod filter_map;
pub mod finalize;
pub mod group_by;
pub mod last;
pub mod map;
pub mod map_err;
pub mod materialize;
pub mod merge;
pub mod on_complete;
pub mod on_error;
pub mod pairwise;
pub mod publish;
pub mod pull;
pub mod sample;
pub mod scan;
pub mod skip;
pub mod skip_until;
pub mod skip_while;
pub mod start_with;
pub mod stream;
pub mod switch;
pub mod take;
pub mod take_last;
pub mod take_until;
pub mod take_while;
pub mod tap;
pub mod with_latest_from;
pub mod zip;

use default_if_empty::DefaultIfEmptyOp;
use filter_map::FilterMapOp;
use last::LastOrOp;
use map::MapOp;
use scan::ScanOp;
use switch::{SwitchOp, SwitchOpThreads};
use take::TakeOp;

/// Folding is composed rather than hand-written: scan the accumulations,
/// keep the last one (or the seed for an empty source).
pub type ReduceOp<S, F, B, Item> = LastOrOp<ScanOp<S, F, B, Item>, B>;

pub type CountOp<S, Item> = ReduceOp<S, fn(usize, Item) -> usize, usize, Item>;

pub type SumOp<S, Item> = ReduceOp<S, fn(Item, Item) -> Item, Item, Item>;

/// `min`/`max` fold into an `Option` and strip the empty case on the way
/// out.
pub type MinMaxOp<S, Item> = FilterMapOp<
  ReduceOp<S, fn(Option<Item>, Item) -> Option<Item>, Option<Item>, Item>,
  fn(Option<Item>) -> Option<Item>,
  Option<Item>,
>;

/// Running (sum, count) accumulator resolved to a mean on completion.
pub type AverageOp<S, Item> = FilterMapOp<
  ReduceOp<S, fn((f64, usize), Item) -> (f64, usize), (f64, usize), Item>,
  fn((f64, usize)) -> Option<f64>,
  (f64, usize),
>;

pub type FirstOrOp<S, Item> = DefaultIfEmptyOp<TakeOp<S>, Item>;

pub type SwitchMapOp<S, F, Item, Inner> = SwitchOp<MapOp<S, F, Item>, Inner>;

pub type SwitchMapOpThreads<S, F, Item, Inner> =
  SwitchOpThreads<MapOp<S, F, Item>, Inner>;
