//! Error type shared by the host runtime, the stream layer and the hooks.
//!
//! Nothing in this crate recovers from an error locally. Errors raised while
//! an effect is set up, or reported later by an async source, are queued on
//! the owning component and surface as the `Err` of its next driving call
//! ([`Component::flush`](crate::component::Component::flush) and friends).

use std::error::Error as StdError;

/// Boxed source error carried by [`HookError`].
pub type BoxError = Box<dyn StdError + 'static>;

/// Errors produced by components, effects and async sources.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// An effect's setup function failed.
    #[error("effect setup failed: {0}")]
    Setup(#[source] BoxError),

    /// A deferred value or sequence source failed.
    #[error("async source failed: {0}")]
    Source(#[source] BoxError),

    /// An asynchronous cell update resolved to an error; the cell kept its value.
    #[error("cell update rejected: {0}")]
    UpdateRejected(#[source] BoxError),

    /// State kept changing while flushing; the render loop was cut off.
    #[error("render loop did not settle after {passes} passes")]
    RenderLoop {
        /// Number of render passes performed before giving up.
        passes: usize,
    },

    /// A dependency list changed length between renders under
    /// [`DepsLengthPolicy::Reject`](crate::config::DepsLengthPolicy::Reject).
    #[error("dependency list changed length from {previous} to {current}")]
    DepsLengthChanged {
        /// Length during the previous render.
        previous: usize,
        /// Length during the current render.
        current: usize,
    },

    /// `mount` was called on a component that is already mounted.
    #[error("component is already mounted")]
    AlreadyMounted,

    /// A render was requested for a component that is not mounted.
    #[error("component is not mounted")]
    NotMounted,
}

impl HookError {
    /// Wrap an effect setup failure.
    pub fn setup(err: impl Into<BoxError>) -> Self {
        HookError::Setup(err.into())
    }

    /// Wrap a source failure.
    pub fn source(err: impl Into<BoxError>) -> Self {
        HookError::Source(err.into())
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Setup(_) => "effect_setup_failed",
            HookError::Source(_) => "source_failed",
            HookError::UpdateRejected(_) => "cell_update_rejected",
            HookError::RenderLoop { .. } => "render_loop",
            HookError::DepsLengthChanged { .. } => "deps_length_changed",
            HookError::AlreadyMounted => "already_mounted",
            HookError::NotMounted => "not_mounted",
        }
    }
}
