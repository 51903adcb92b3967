//! # rill: a push-based reactive-stream operator engine
//!
//! Sources push values into subscribed observers — zero or more `next`
//! calls followed by exactly one terminal signal — and operators compose
//! by wrapping one another's observers at subscribe time.
//!
//! ```rust
//! use rill::prelude::*;
//!
//! let mut sum = 0;
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| sum += v);
//! assert_eq!(sum, 40);
//! ```
//!
//! ## Key pieces
//!
//! | Type | Role |
//! |------|------|
//! | [`Observable`] | starts one subscription per observer |
//! | [`ObservableExt`] | the operator methods |
//! | [`Observer`] | consumes `next` / `error` / `complete` |
//! | [`Subscription`] | idempotent unsubscription handle |
//! | [`Subject`] / [`SubjectThreads`] | hot multicast |
//!
//! Stateful operators come in two flavors: the default single-thread form
//! and a `*_threads` form whose shared state is lock- and atomic-backed
//! for sources driven from other threads.
//!
//! [`Observable`]: observable::Observable
//! [`ObservableExt`]: observable::ObservableExt
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Subject`]: subject::Subject
//! [`SubjectThreads`]: subject::SubjectThreads

#[cfg(test)]
#[macro_use]
extern crate bencher;

pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod serializer;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod type_hint;

pub use prelude::*;
