//! Runtime configuration for mounted components.

// ---------------------------------------------------------------------------
// DepsLengthPolicy
// ---------------------------------------------------------------------------

/// What to do when an effect's dependency list changes length between renders.
///
/// Lists of different length always compare unequal, so the effect is torn
/// down and set up again either way. The policy only decides whether the
/// change is also reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepsLengthPolicy {
    /// Log a warning and resubscribe.
    #[default]
    Resubscribe,
    /// Resubscribe and report [`HookError::DepsLengthChanged`](crate::HookError::DepsLengthChanged)
    /// to the component's error boundary.
    Reject,
}

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`Component`](crate::component::Component).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Maximum number of renders a single flush may perform before it gives
    /// up with [`HookError::RenderLoop`](crate::HookError::RenderLoop).
    pub max_render_passes: usize,
    /// Policy for dependency lists that change length.
    pub deps_length_policy: DepsLengthPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_render_passes: 50,
            deps_length_policy: DepsLengthPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render pass limit (builder). Values below 1 are clamped to 1.
    pub fn with_max_render_passes(mut self, passes: usize) -> Self {
        self.max_render_passes = passes.max(1);
        self
    }

    /// Set the dependency-length policy (builder).
    pub fn with_deps_length_policy(mut self, policy: DepsLengthPolicy) -> Self {
        self.deps_length_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::new();
        assert_eq!(config.max_render_passes, 50);
        assert_eq!(config.deps_length_policy, DepsLengthPolicy::Resubscribe);
    }

    #[test]
    fn builder_chains() {
        let config = RuntimeConfig::new()
            .with_max_render_passes(3)
            .with_deps_length_policy(DepsLengthPolicy::Reject);
        assert_eq!(config.max_render_passes, 3);
        assert_eq!(config.deps_length_policy, DepsLengthPolicy::Reject);
    }

    #[test]
    fn zero_passes_clamped() {
        let config = RuntimeConfig::new().with_max_render_passes(0);
        assert_eq!(config.max_render_passes, 1);
    }
}
