//! Subscription handles.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

struct SubscriptionInner {
    released: Cell<bool>,
    /// Taken out on the first release so the teardown runs at most once.
    teardown: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Handle to an active subscription.
///
/// `release` runs the teardown exactly once; later calls do nothing. Clones
/// share the same state. Dropping a handle does **not** release it.
#[derive(Clone)]
#[must_use = "a subscription keeps delivering until it is released"]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` when released.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                released: Cell::new(false),
                teardown: RefCell::new(Some(Box::new(teardown))),
            }),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                released: Cell::new(false),
                teardown: RefCell::new(None),
            }),
        }
    }

    /// Release the subscription. Idempotent.
    pub fn release(&self) {
        if self.inner.released.replace(true) {
            return;
        }
        let teardown = self.inner.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Whether `release` has been called on this handle or a clone of it.
    pub fn is_released(&self) -> bool {
        self.inner.released.get()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_runs_teardown_once() {
        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        let sub = Subscription::new(move || count_c.set(count_c.get() + 1));
        assert!(!sub.is_released());

        sub.release();
        sub.release();
        sub.release();

        assert!(sub.is_released());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn clones_share_release_state() {
        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        let sub = Subscription::new(move || count_c.set(count_c.get() + 1));
        let other = sub.clone();

        other.release();
        assert!(sub.is_released());
        sub.release();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_does_not_release() {
        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        drop(Subscription::new(move || count_c.set(count_c.get() + 1)));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn empty_release_is_noop() {
        let sub = Subscription::empty();
        sub.release();
        assert!(sub.is_released());
    }

    #[test]
    fn teardown_may_release_itself() {
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_c = slot.clone();
        let sub = Subscription::new(move || {
            if let Some(sub) = slot_c.borrow().as_ref() {
                sub.release();
            }
        });
        *slot.borrow_mut() = Some(sub.clone());
        sub.release();
        assert!(sub.is_released());
    }

    #[test]
    fn debug_shows_state() {
        let sub = Subscription::empty();
        assert!(format!("{sub:?}").contains("released: false"));
    }
}
