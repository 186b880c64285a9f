//! Per-instance hook storage and the render context.
//!
//! Hooks are plain functions. They find the component that is currently
//! rendering through a thread-local frame stack and address their storage by
//! call order: the n-th hook call of a render always gets the n-th slot.
//! Single-threaded by construction, like the async tasks that feed it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

use crate::component::deps::Deps;
use crate::config::RuntimeConfig;
use crate::error::HookError;

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

/// Identifies a component instance in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ComponentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Teardown returned by an effect setup.
pub type Cleanup = Box<dyn FnOnce()>;

pub(crate) type EffectSetup = Box<dyn FnOnce() -> Result<Option<Cleanup>, HookError>>;

/// Storage of one `use_effect` call site.
pub(crate) struct EffectSlot {
    pub(crate) deps: RefCell<Option<Deps>>,
    cleanup: RefCell<Option<Cleanup>>,
}

impl EffectSlot {
    pub(crate) fn new() -> Self {
        Self {
            deps: RefCell::new(None),
            cleanup: RefCell::new(None),
        }
    }

    fn run_cleanup(&self) -> bool {
        let cleanup = self.cleanup.borrow_mut().take();
        match cleanup {
            Some(cleanup) => {
                cleanup();
                true
            }
            None => false,
        }
    }
}

/// An effect whose dependencies changed during the last render.
pub(crate) struct PendingEffect {
    pub(crate) slot: Rc<EffectSlot>,
    pub(crate) index: usize,
    pub(crate) deps: Deps,
    pub(crate) setup: EffectSetup,
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// Everything a component keeps between renders.
pub(crate) struct Instance {
    pub(crate) id: ComponentId,
    pub(crate) config: RuntimeConfig,
    slots: RefCell<Vec<Rc<dyn Any>>>,
    effects: RefCell<Vec<Rc<EffectSlot>>>,
    pending: RefCell<Vec<PendingEffect>>,
    errors: RefCell<VecDeque<HookError>>,
    dirty: Cell<bool>,
    mounted: Cell<bool>,
    /// Wakes `Component::changed` when state changes or an error arrives.
    wake: Notify,
}

impl Instance {
    pub(crate) fn new(config: RuntimeConfig) -> Self {
        Self {
            id: ComponentId::next(),
            config,
            slots: RefCell::new(Vec::new()),
            effects: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            errors: RefCell::new(VecDeque::new()),
            dirty: Cell::new(false),
            mounted: Cell::new(false),
            wake: Notify::new(),
        }
    }

    /// A blank instance with the same id and config.
    ///
    /// Handles (setters, reporters) bound to `self` never reach the
    /// successor.
    pub(crate) fn successor(&self) -> Self {
        Self {
            id: self.id,
            ..Self::new(self.config.clone())
        }
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    pub(crate) fn wake(&self) -> &Notify {
        &self.wake
    }

    /// Request a re-render. Ignored once unmounted.
    pub(crate) fn mark_dirty(&self) {
        if !self.mounted.get() {
            tracing::trace!(component = %self.id, "state change after unmount ignored");
            return;
        }
        if !self.dirty.replace(true) {
            self.wake.notify_one();
        }
    }

    /// Queue an error for the next driving call of the component.
    pub(crate) fn report(&self, err: HookError) {
        if !self.mounted.get() {
            tracing::debug!(component = %self.id, error = %err, "error after unmount dropped");
            return;
        }
        tracing::debug!(component = %self.id, kind = err.as_label(), "error reported to boundary");
        self.errors.borrow_mut().push_back(err);
        self.wake.notify_one();
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }

    pub(crate) fn take_error(&self) -> Option<HookError> {
        self.errors.borrow_mut().pop_front()
    }

    pub(crate) fn register_effect(&self, slot: Rc<EffectSlot>) {
        self.effects.borrow_mut().push(slot);
    }

    pub(crate) fn queue_effect(&self, effect: PendingEffect) {
        self.pending.borrow_mut().push(effect);
    }

    /// Start a fresh mount: drop all slots and queued work.
    pub(crate) fn begin_mount(&self) {
        self.slots.borrow_mut().clear();
        self.effects.borrow_mut().clear();
        self.pending.borrow_mut().clear();
        self.errors.borrow_mut().clear();
        self.dirty.set(false);
        self.mounted.set(true);
    }

    /// Run the effects queued by the last render, in call order.
    ///
    /// Each effect's previous cleanup runs before its new setup. A failing
    /// setup is reported and keeps the new dependencies, so it is not retried
    /// until they change again.
    pub(crate) fn commit_effects(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for effect in pending {
            if !self.mounted.get() {
                break;
            }
            if effect.slot.run_cleanup() {
                tracing::debug!(component = %self.id, effect = effect.index, "effect torn down");
            }
            *effect.slot.deps.borrow_mut() = Some(effect.deps);
            tracing::debug!(component = %self.id, effect = effect.index, "effect set up");
            match (effect.setup)() {
                Ok(cleanup) => *effect.slot.cleanup.borrow_mut() = cleanup,
                Err(err) => self.report(err),
            }
        }
    }

    /// Run every remaining cleanup and stop accepting state changes.
    pub(crate) fn unmount(&self) {
        self.mounted.set(false);
        self.dirty.set(false);
        self.pending.borrow_mut().clear();
        let effects = self.effects.borrow().clone();
        for (index, effect) in effects.iter().enumerate() {
            if effect.run_cleanup() {
                tracing::debug!(component = %self.id, effect = index, "effect torn down on unmount");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Render frames
// ---------------------------------------------------------------------------

struct Frame {
    instance: Rc<Instance>,
    cursor: usize,
    first: bool,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a render frame on the stack; pops it on drop (also on panic).
pub(crate) struct RenderGuard {
    popped: bool,
}

impl RenderGuard {
    /// Pop the frame and return how many hooks the render called.
    pub(crate) fn finish(mut self) -> usize {
        self.popped = true;
        FRAMES.with(|frames| frames.borrow_mut().pop().map_or(0, |frame| frame.cursor))
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        if !self.popped {
            FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }
}

/// Make `instance` the rendering component until the guard is finished.
pub(crate) fn enter(instance: Rc<Instance>, first: bool) -> RenderGuard {
    FRAMES.with(|frames| {
        frames.borrow_mut().push(Frame {
            instance,
            cursor: 0,
            first,
        });
    });
    RenderGuard { popped: false }
}

/// The component currently rendering.
///
/// # Panics
///
/// Panics when called outside a component render.
pub(crate) fn current_instance(hook: &'static str) -> Rc<Instance> {
    FRAMES.with(|frames| match frames.borrow().last() {
        Some(frame) => Rc::clone(&frame.instance),
        None => panic!("`{hook}` called outside of a component render"),
    })
}

/// A hook's storage for the current render.
pub(crate) struct HookSlot<S> {
    pub(crate) value: Rc<S>,
    pub(crate) instance: Rc<Instance>,
    pub(crate) index: usize,
    /// `true` during the render that created the slot.
    pub(crate) created: bool,
}

/// Claim the next slot of the rendering component, creating it with `init`
/// on the first render.
///
/// # Panics
///
/// Panics when called outside a render, or when the hook sequence differs
/// from the first render (different hook at this position, or more hooks).
pub(crate) fn hook_slot<S: 'static>(hook: &'static str, init: impl FnOnce() -> S) -> HookSlot<S> {
    let (instance, index, first) = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        match frames.last_mut() {
            Some(frame) => {
                let index = frame.cursor;
                frame.cursor += 1;
                (Rc::clone(&frame.instance), index, frame.first)
            }
            None => panic!("`{hook}` called outside of a component render"),
        }
    });

    let existing = instance.slots.borrow().get(index).cloned();
    match existing {
        Some(slot) => match slot.downcast::<S>() {
            Ok(value) => HookSlot {
                value,
                instance,
                index,
                created: false,
            },
            Err(_) => panic!(
                "hook order changed in component {}: slot {index} is not a `{hook}` slot",
                instance.id
            ),
        },
        None if first => {
            let value = Rc::new(init());
            instance
                .slots
                .borrow_mut()
                .push(Rc::clone(&value) as Rc<dyn Any>);
            HookSlot {
                value,
                instance,
                index,
                created: true,
            }
        }
        None => panic!(
            "hook order changed in component {}: `{hook}` at slot {index} was not called on the first render",
            instance.id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted_instance() -> Rc<Instance> {
        let instance = Rc::new(Instance::new(RuntimeConfig::default()));
        instance.begin_mount();
        instance
    }

    #[test]
    fn slots_are_stable_across_renders() {
        let instance = mounted_instance();

        let guard = enter(Rc::clone(&instance), true);
        let a = hook_slot("test", || Cell::new(1));
        let b = hook_slot("test", || Cell::new(2));
        assert!(a.created && b.created);
        a.value.set(10);
        assert_eq!(guard.finish(), 2);

        let guard = enter(Rc::clone(&instance), false);
        let a = hook_slot("test", || Cell::new(0));
        let b = hook_slot("test", || Cell::new(0));
        assert!(!a.created);
        assert_eq!(a.value.get(), 10);
        assert_eq!(b.value.get(), 2);
        assert_eq!(guard.finish(), 2);
    }

    #[test]
    #[should_panic(expected = "outside of a component render")]
    fn slot_outside_render_panics() {
        let _ = hook_slot("use_state", || 0);
    }

    #[test]
    #[should_panic(expected = "is not a `other` slot")]
    fn changed_hook_type_panics() {
        let instance = mounted_instance();
        let guard = enter(Rc::clone(&instance), true);
        let _ = hook_slot("first", || 1_u8);
        guard.finish();

        let _guard = enter(Rc::clone(&instance), false);
        let _ = hook_slot("other", || String::new());
    }

    #[test]
    #[should_panic(expected = "was not called on the first render")]
    fn extra_hook_panics() {
        let instance = mounted_instance();
        enter(Rc::clone(&instance), true).finish();

        let _guard = enter(Rc::clone(&instance), false);
        let _ = hook_slot("late", || 0);
    }

    #[test]
    fn guard_pops_frame_on_drop() {
        let instance = mounted_instance();
        {
            let _guard = enter(Rc::clone(&instance), true);
        }
        FRAMES.with(|frames| assert!(frames.borrow().is_empty()));
    }

    #[test]
    fn mark_dirty_ignored_after_unmount() {
        let instance = mounted_instance();
        instance.mark_dirty();
        assert!(instance.is_dirty());
        instance.unmount();
        instance.mark_dirty();
        assert!(!instance.is_dirty());
    }

    #[test]
    fn errors_are_fifo() {
        let instance = mounted_instance();
        instance.report(HookError::NotMounted);
        instance.report(HookError::AlreadyMounted);
        assert!(instance.has_errors());
        assert_eq!(instance.take_error().map(|e| e.as_label()), Some("not_mounted"));
        assert_eq!(instance.take_error().map(|e| e.as_label()), Some("already_mounted"));
        assert!(instance.take_error().is_none());
    }

    #[test]
    fn component_ids_are_unique() {
        let a = Instance::new(RuntimeConfig::default());
        let b = Instance::new(RuntimeConfig::default());
        assert_ne!(a.id, b.id);
        assert!(a.id.to_string().starts_with('#'));
    }

    #[test]
    fn successor_keeps_id_and_config_but_no_state() {
        let config = RuntimeConfig::new().with_max_render_passes(7);
        let old = Rc::new(Instance::new(config));
        old.begin_mount();
        {
            let _guard = enter(Rc::clone(&old), true);
            let _ = hook_slot("use_state", || Cell::new(1));
        }
        old.unmount();

        let next = old.successor();
        assert_eq!(next.id, old.id);
        assert_eq!(next.config.max_render_passes, 7);
        assert_eq!(next.slot_count(), 0);
        assert!(!next.is_mounted());
    }
}
