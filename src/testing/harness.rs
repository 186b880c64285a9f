//! Harness: mount a component headlessly and record every render.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::Component;
use crate::config::RuntimeConfig;
use crate::error::HookError;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A mounted component whose rendered outputs are recorded in order.
///
/// # Examples
///
/// ```
/// use rx_hooks::component::use_state;
/// use rx_hooks::testing::Harness;
///
/// let h = Harness::mount(|| use_state(|| 1).0).unwrap();
/// assert_eq!(h.history(), vec![1]);
/// ```
pub struct Harness<V> {
    component: Component<V>,
    history: Rc<RefCell<Vec<V>>>,
}

impl<V: Clone + 'static> Harness<V> {
    /// Mount `render` with the default config.
    pub fn mount(render: impl FnMut() -> V + 'static) -> Result<Self, HookError> {
        Self::with_config(RuntimeConfig::default(), render)
    }

    /// Mount `render` with an explicit config.
    pub fn with_config(
        config: RuntimeConfig,
        mut render: impl FnMut() -> V + 'static,
    ) -> Result<Self, HookError> {
        let history: Rc<RefCell<Vec<V>>> = Rc::default();
        let recorder = Rc::clone(&history);
        let component = Component::with_config(config, move || {
            let output = render();
            recorder.borrow_mut().push(output.clone());
            output
        });
        let mut harness = Self { component, history };
        harness.component.mount()?;
        Ok(harness)
    }

    // ── Driving ──────────────────────────────────────────────────────

    /// Wait for the next state change, render, and return the new output.
    pub async fn next_render(&mut self) -> Result<V, HookError> {
        self.component.changed().await?;
        self.component.output().cloned().ok_or(HookError::NotMounted)
    }

    /// Render if dirty. Returns whether a render happened.
    pub fn flush(&mut self) -> Result<bool, HookError> {
        self.component.flush()
    }

    /// Render unconditionally.
    pub fn rerender(&mut self) -> Result<(), HookError> {
        self.component.rerender()
    }

    /// Unmount, running every effect cleanup.
    pub fn unmount(&mut self) {
        self.component.unmount();
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Every output rendered so far, oldest first.
    pub fn history(&self) -> Vec<V> {
        self.history.borrow().clone()
    }

    /// The most recent output.
    pub fn latest(&self) -> Option<V> {
        self.history.borrow().last().cloned()
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        self.component.render_count()
    }

    /// The driven component.
    pub fn component(&self) -> &Component<V> {
        &self.component
    }
}
