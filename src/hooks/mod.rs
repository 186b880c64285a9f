//! Hooks for binding push-based and async sources to component state.
//!
//! - [`use_subscription`]: run a setup returning a [`Subscription`](crate::rx::Subscription)
//!   and release it before every re-setup and on unmount.
//! - [`use_async`]: render the latest value of a future, async stream or
//!   observable.
//! - [`use_cell`]: a per-instance [`MutableCell`] read through a replaying
//!   observable and written without re-rendering.

mod async_value;
mod cell;
mod subscription;

pub use async_value::use_async;
pub use cell::{use_cell, CellGetter, CellSetter, MutableCell};
pub use subscription::use_subscription;
