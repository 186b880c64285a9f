//! Component: drives a render function through mount, updates and unmount.
//!
//! A [`Component`] owns one render closure and the instance state its hooks
//! use. Rendering is synchronous; effects run right after each render
//! commits. State changes (from setters, effects or async tasks) mark the
//! component dirty, and the next [`flush`](Component::flush) or
//! [`changed`](Component::changed) renders again until nothing is dirty.

use std::fmt;
use std::rc::Rc;

use crate::component::runtime::{self, ComponentId, Instance};
use crate::config::RuntimeConfig;
use crate::error::HookError;

/// A mountable component.
pub struct Component<V> {
    instance: Rc<Instance>,
    render: Box<dyn FnMut() -> V>,
    output: Option<V>,
    renders: usize,
}

impl<V> fmt::Debug for Component<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.instance.id)
            .field("mounted", &self.instance.is_mounted())
            .field("dirty", &self.instance.is_dirty())
            .field("renders", &self.renders)
            .finish()
    }
}

impl<V: 'static> Component<V> {
    /// Create an unmounted component with the default config.
    pub fn new(render: impl FnMut() -> V + 'static) -> Self {
        Self::with_config(RuntimeConfig::default(), render)
    }

    /// Create an unmounted component with an explicit config.
    pub fn with_config(config: RuntimeConfig, render: impl FnMut() -> V + 'static) -> Self {
        Self {
            instance: Rc::new(Instance::new(config)),
            render: Box::new(render),
            output: None,
            renders: 0,
        }
    }

    /// Id used in log events.
    pub fn id(&self) -> ComponentId {
        self.instance.id
    }

    /// Whether the component is between `mount` and `unmount`.
    pub fn is_mounted(&self) -> bool {
        self.instance.is_mounted()
    }

    /// Whether state changed since the last render.
    pub fn is_dirty(&self) -> bool {
        self.instance.is_dirty()
    }

    /// Output of the most recent render.
    pub fn output(&self) -> Option<&V> {
        self.output.as_ref()
    }

    /// Total number of renders since creation.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// First render, effects, then renders until state settles.
    ///
    /// A component may be mounted again after [`unmount`](Self::unmount);
    /// it then starts over with fresh hook state.
    pub fn mount(&mut self) -> Result<(), HookError> {
        if self.instance.is_mounted() {
            return Err(HookError::AlreadyMounted);
        }
        tracing::debug!(component = %self.instance.id, "mounting");
        if self.renders > 0 {
            // Handles from the previous mount stay bound to the old instance.
            self.instance = Rc::new(self.instance.successor());
        }
        self.instance.begin_mount();
        self.render_pass(true);
        self.settle(1)
    }

    /// Render again if state changed. Returns whether a render happened.
    ///
    /// Errors queued on the error boundary are returned here, after any
    /// pending render.
    pub fn flush(&mut self) -> Result<bool, HookError> {
        if !self.instance.is_mounted() {
            return Err(HookError::NotMounted);
        }
        if !self.instance.is_dirty() {
            return match self.instance.take_error() {
                Some(err) => Err(err),
                None => Ok(false),
            };
        }
        self.render_pass(false);
        self.settle(1)?;
        Ok(true)
    }

    /// Render unconditionally, then settle.
    pub fn rerender(&mut self) -> Result<(), HookError> {
        if !self.instance.is_mounted() {
            return Err(HookError::NotMounted);
        }
        self.render_pass(false);
        self.settle(1)
    }

    /// Wait until state changes (or an error is reported), then flush.
    ///
    /// Async sources deliver on `spawn_local` tasks, so this has to be awaited
    /// inside the same [`tokio::task::LocalSet`].
    pub async fn changed(&mut self) -> Result<(), HookError> {
        if !self.instance.is_mounted() {
            return Err(HookError::NotMounted);
        }
        loop {
            if self.instance.is_dirty() || self.instance.has_errors() {
                self.flush()?;
                return Ok(());
            }
            self.instance.wake().notified().await;
        }
    }

    /// Run every effect cleanup. Setters become no-ops. Idempotent.
    pub fn unmount(&mut self) {
        if !self.instance.is_mounted() {
            return;
        }
        tracing::debug!(component = %self.instance.id, renders = self.renders, "unmounting");
        self.instance.unmount();
    }

    fn render_pass(&mut self, first: bool) {
        self.instance.clear_dirty();
        let guard = runtime::enter(Rc::clone(&self.instance), first);
        let output = (self.render)();
        let used = guard.finish();
        let expected = self.instance.slot_count();
        if used != expected {
            panic!(
                "hook order changed in component {}: {used} hooks called, {expected} expected",
                self.instance.id
            );
        }
        self.output = Some(output);
        self.renders += 1;
        tracing::trace!(component = %self.instance.id, render = self.renders, "rendered");
        self.instance.commit_effects();
    }

    fn settle(&mut self, mut passes: usize) -> Result<(), HookError> {
        let limit = self.instance.config.max_render_passes;
        while self.instance.is_mounted() && self.instance.is_dirty() {
            if passes >= limit {
                self.instance.clear_dirty();
                tracing::warn!(component = %self.instance.id, passes, "render loop cut off");
                return Err(HookError::RenderLoop { passes });
            }
            self.render_pass(false);
            passes += 1;
        }
        match self.instance.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<V> Drop for Component<V> {
    fn drop(&mut self) {
        if self.instance.is_mounted() {
            tracing::debug!(component = %self.instance.id, "unmounting on drop");
            self.instance.unmount();
        }
    }
}
