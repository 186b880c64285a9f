//! BehaviorSubject<T>: a single-slot replay broadcast.
//!
//! The subject holds exactly one value. Every new subscriber receives that
//! value synchronously inside `subscribe`, then every later `next`. Observers
//! live in a slotmap, so delivery order among them is unspecified.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::rx::observable::{Notification, Observable, Subscriber};
use crate::rx::subscription::Subscription;

new_key_type! {
    /// Key of one registered observer.
    struct ObserverKey;
}

struct SubjectState<T> {
    value: T,
    observers: SlotMap<ObserverKey, Subscriber<T>>,
}

/// Shared cell with a push-based read side.
pub struct BehaviorSubject<T> {
    state: Rc<RefCell<SubjectState<T>>>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BehaviorSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("BehaviorSubject")
            .field("value", &state.value)
            .field("observers", &state.observers.len())
            .finish()
    }
}

impl<T: Clone + 'static> BehaviorSubject<T> {
    /// Create a subject holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                value: initial,
                observers: SlotMap::with_key(),
            })),
        }
    }

    /// The current value.
    pub fn value(&self) -> T {
        self.state.borrow().value.clone()
    }

    /// Store `value` and push it to every registered observer.
    pub fn next(&self, value: T) {
        let observers: Vec<Subscriber<T>> = {
            let mut state = self.state.borrow_mut();
            state.value = value.clone();
            state.observers.values().cloned().collect()
        };
        for observer in observers {
            observer.next(value.clone());
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// The read side as an [`Observable`].
    pub fn as_observable(&self) -> Observable<T> {
        let state = Rc::clone(&self.state);
        Observable::new(move |subscriber: Subscriber<T>| {
            let (key, current) = {
                let mut st = state.borrow_mut();
                let key = st.observers.insert(subscriber.clone());
                (key, st.value.clone())
            };
            subscriber.next(current);

            let state = Rc::clone(&state);
            Subscription::new(move || {
                state.borrow_mut().observers.remove(key);
            })
        })
    }

    /// Shorthand for `as_observable().subscribe(..)`.
    pub fn subscribe(&self, observer: impl FnMut(Notification<T>) + 'static) -> Subscription {
        self.as_observable().subscribe(observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn collect(subject: &BehaviorSubject<i32>) -> (Rc<RefCell<Vec<i32>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        let sub = subject.as_observable().subscribe_next(move |v| log_c.borrow_mut().push(v));
        (log, sub)
    }

    #[test]
    fn replays_current_value_on_subscribe() {
        let subject = BehaviorSubject::new(5);
        let (log, _sub) = collect(&subject);
        assert_eq!(*log.borrow(), vec![5]);
    }

    #[test]
    fn late_subscriber_sees_latest_only() {
        let subject = BehaviorSubject::new(0);
        subject.next(1);
        subject.next(2);
        let (log, _sub) = collect(&subject);
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn broadcasts_to_every_observer() {
        let subject = BehaviorSubject::new(0);
        let (a, _sa) = collect(&subject);
        let (b, _sb) = collect(&subject);
        subject.next(9);
        assert_eq!(*a.borrow(), vec![0, 9]);
        assert_eq!(*b.borrow(), vec![0, 9]);
        assert_eq!(subject.value(), 9);
    }

    #[test]
    fn release_removes_observer() {
        let subject = BehaviorSubject::new(0);
        let (log, sub) = collect(&subject);
        assert_eq!(subject.observer_count(), 1);

        sub.release();
        subject.next(1);

        assert_eq!(subject.observer_count(), 0);
        assert_eq!(*log.borrow(), vec![0]);
    }

    #[test]
    fn observer_may_write_back() {
        let subject = BehaviorSubject::new(0);
        let writer = subject.clone();
        let calls = Rc::new(Cell::new(0));
        let calls_c = calls.clone();
        let _sub = subject.as_observable().subscribe_next(move |v| {
            calls_c.set(calls_c.get() + 1);
            if v == 1 {
                writer.next(2);
            }
        });
        subject.next(1);
        assert_eq!(subject.value(), 2);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn debug_reports_value_and_count() {
        let subject = BehaviorSubject::new("x");
        let _sub = subject.as_observable().subscribe_next(|_| {});
        let dbg = format!("{subject:?}");
        assert!(dbg.contains("\"x\""));
        assert!(dbg.contains("observers: 1"));
    }
}
