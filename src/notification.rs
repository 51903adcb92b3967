/// A reified signal.
///
/// Wherever a signal has to be buffered, compared or replayed instead of
/// delivered on the spot (`materialize`, the pull adapters, the stream
/// bridge), it travels as one of these three values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  #[inline]
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Notification::Next(_))
  }
}
