//! Host primitives: state, instance-scoped references, effects.
//!
//! These are the building blocks the library hooks in [`crate::hooks`] are
//! written against. They must be called unconditionally and in the same order
//! on every render of a component.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::deps::{Deps, DepsChange};
use crate::component::runtime::{self, Cleanup, EffectSlot, Instance, PendingEffect};
use crate::config::DepsLengthPolicy;
use crate::error::HookError;

// ---------------------------------------------------------------------------
// use_state
// ---------------------------------------------------------------------------

/// Write handle for a value created by [`use_state`].
///
/// Setting stores the value and schedules a re-render of the owning
/// component. Once the component is unmounted the setter does nothing.
pub struct StateSetter<T> {
    value: Rc<RefCell<T>>,
    instance: Weak<Instance>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            instance: Weak::clone(&self.instance),
        }
    }
}

impl<T: 'static> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("live", &self.is_live())
            .finish()
    }
}

impl<T: 'static> StateSetter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        let Some(instance) = self.live_instance() else {
            return;
        };
        *self.value.borrow_mut() = value;
        instance.mark_dirty();
    }

    /// Replace the value with a function of the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let Some(instance) = self.live_instance() else {
            return;
        };
        let next = f(&self.value.borrow());
        *self.value.borrow_mut() = next;
        instance.mark_dirty();
    }

    /// Whether the owning component is still mounted.
    pub fn is_live(&self) -> bool {
        self.instance.upgrade().is_some_and(|i| i.is_mounted())
    }

    fn live_instance(&self) -> Option<Rc<Instance>> {
        match self.instance.upgrade() {
            Some(instance) if instance.is_mounted() => Some(instance),
            _ => {
                tracing::trace!("state set on an unmounted component ignored");
                None
            }
        }
    }
}

/// Component-local state persisted across renders.
///
/// `init` runs on the first render only. Returns the current value and a
/// setter that triggers a re-render.
///
/// # Panics
///
/// Panics outside a render or when hook order changes between renders.
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, StateSetter<T>) {
    let slot = runtime::hook_slot("use_state", || RefCell::new(init()));
    let current = slot.value.borrow().clone();
    let setter = StateSetter {
        value: Rc::clone(&slot.value),
        instance: Rc::downgrade(&slot.instance),
    };
    (current, setter)
}

// ---------------------------------------------------------------------------
// use_ref
// ---------------------------------------------------------------------------

/// Instance-scoped mutable reference.
///
/// Created by `init` on the first render and returned unchanged afterwards.
/// Mutating it never triggers a render.
///
/// # Panics
///
/// Panics outside a render or when hook order changes between renders.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    runtime::hook_slot("use_ref", || RefCell::new(init())).value
}

// ---------------------------------------------------------------------------
// use_effect
// ---------------------------------------------------------------------------

/// Run `setup` after the render commits, on mount and whenever `deps` changed.
///
/// The cleanup returned by the previous setup runs exactly once before the
/// next setup, and once more on unmount. A setup error goes to the
/// component's error boundary and is not retried until `deps` change again.
///
/// # Panics
///
/// Panics outside a render or when hook order changes between renders.
pub fn use_effect<F>(setup: F, deps: Deps)
where
    F: FnOnce() -> Result<Option<Cleanup>, HookError> + 'static,
{
    let slot = runtime::hook_slot("use_effect", EffectSlot::new);
    let instance = &slot.instance;
    if slot.created {
        instance.register_effect(Rc::clone(&slot.value));
    }

    let change = match slot.value.deps.borrow().as_ref() {
        None => DepsChange::Changed,
        Some(previous) => deps.compare(previous),
    };

    if let DepsChange::LengthChanged { previous, current } = change {
        tracing::warn!(
            component = %instance.id,
            effect = slot.index,
            previous,
            current,
            "dependency list changed length; resubscribing"
        );
        if instance.config.deps_length_policy == DepsLengthPolicy::Reject {
            instance.report(HookError::DepsLengthChanged { previous, current });
        }
    }

    if change.is_changed() {
        instance.queue_effect(PendingEffect {
            slot: Rc::clone(&slot.value),
            index: slot.index,
            deps,
            setup: Box::new(setup),
        });
    }
}

// ---------------------------------------------------------------------------
// use_error_reporter
// ---------------------------------------------------------------------------

/// Handle for reporting errors to a component's error boundary from outside
/// the render, e.g. from a spawned task.
#[derive(Clone)]
pub struct ErrorReporter {
    instance: Weak<Instance>,
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter").finish_non_exhaustive()
    }
}

impl ErrorReporter {
    pub(crate) fn for_instance(instance: &Rc<Instance>) -> Self {
        Self {
            instance: Rc::downgrade(instance),
        }
    }

    /// Queue `err` on the component. Dropped if the component is gone.
    pub fn report(&self, err: HookError) {
        match self.instance.upgrade() {
            Some(instance) => instance.report(err),
            None => tracing::debug!(error = %err, "error reported after component was dropped"),
        }
    }
}

/// A reporter bound to the component currently rendering.
///
/// Does not occupy a hook slot.
///
/// # Panics
///
/// Panics outside a render.
pub fn use_error_reporter() -> ErrorReporter {
    ErrorReporter::for_instance(&runtime::current_instance("use_error_reporter"))
}
