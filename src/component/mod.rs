//! Host runtime: components, hook slots and the host primitives.
//!
//! - [`Component`]: mount, flush, wait for changes, unmount.
//! - [`use_state`]: state that survives renders and triggers re-renders.
//! - [`use_ref`]: instance-scoped reference that never triggers a render.
//! - [`use_effect`]: setup/cleanup keyed on a [`Deps`] list.
//! - [`use_error_reporter`]: report errors to the component from async code.

pub mod deps;
pub mod hooks;
pub mod host;
pub(crate) mod runtime;

pub use deps::{DepKey, Deps, DepsChange, Identity};
pub use hooks::{use_effect, use_error_reporter, use_ref, use_state, ErrorReporter, StateSetter};
pub use host::Component;
pub use runtime::{Cleanup, ComponentId};
