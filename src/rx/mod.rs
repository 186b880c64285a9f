//! Push-based streams.
//!
//! - [`Observable`]: cold stream with a delivery-gated [`Subscriber`].
//! - [`Subscription`]: idempotent release handle.
//! - [`BehaviorSubject`]: single-slot replay broadcast.
//! - [`AsyncSource`] / [`into_observable`]: futures, async streams and
//!   observables normalized into one `Observable`.

pub mod convert;
pub mod observable;
pub mod subject;
pub mod subscription;

pub use convert::{into_observable, AsyncSource};
pub use observable::{Notification, Observable, Subscriber};
pub use subject::BehaviorSubject;
pub use subscription::Subscription;
