//! Observable<T>, Subscriber<T> and the notification protocol.
//!
//! An [`Observable`] is a cold, push-based stream: every call to
//! [`Observable::subscribe`] runs its subscribe function again with a fresh
//! [`Subscriber`]. The subscriber is the delivery gate. Once it has seen a
//! terminal notification, or once its subscription is released, it forwards
//! nothing else to the observer, whatever the producer keeps doing.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::HookError;
use crate::rx::subscription::Subscription;

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// One event pushed to an observer.
#[derive(Debug)]
pub enum Notification<T> {
    /// A value.
    Next(T),
    /// The source failed. Terminal.
    Error(HookError),
    /// The source finished. Terminal.
    Complete,
}

impl<T> Notification<T> {
    /// Whether this notification ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Next(_))
    }
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

type ObserverFn<T> = Box<dyn FnMut(Notification<T>)>;

struct SubscriberInner<T> {
    /// A terminal notification was accepted; later ones are ignored.
    stopped: Cell<bool>,
    /// The subscription was released; nothing reaches the observer any more.
    released: Cell<bool>,
    /// Set while the observer runs so re-entrant notifications get queued.
    delivering: Cell<bool>,
    queue: RefCell<VecDeque<Notification<T>>>,
    /// Taken out while running so the observer can touch this subscriber.
    observer: RefCell<Option<ObserverFn<T>>>,
}

/// Producer-side handle to one observer.
pub struct Subscriber<T> {
    inner: Rc<SubscriberInner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("stopped", &self.inner.stopped.get())
            .field("released", &self.inner.released.get())
            .finish()
    }
}

impl<T> Subscriber<T> {
    pub(crate) fn new(observer: impl FnMut(Notification<T>) + 'static) -> Self {
        Self {
            inner: Rc::new(SubscriberInner {
                stopped: Cell::new(false),
                released: Cell::new(false),
                delivering: Cell::new(false),
                queue: RefCell::new(VecDeque::new()),
                observer: RefCell::new(Some(Box::new(observer))),
            }),
        }
    }

    /// Push a value.
    pub fn next(&self, value: T) {
        self.deliver(Notification::Next(value));
    }

    /// Fail the stream.
    pub fn error(&self, err: HookError) {
        self.deliver(Notification::Error(err));
    }

    /// Finish the stream.
    pub fn complete(&self) {
        self.deliver(Notification::Complete);
    }

    /// Whether further notifications would be dropped.
    pub fn is_closed(&self) -> bool {
        self.inner.stopped.get() || self.inner.released.get()
    }

    /// Stop delivery for good and drop the observer.
    pub(crate) fn release(&self) {
        self.inner.released.set(true);
        self.inner.queue.borrow_mut().clear();
        let observer = self.inner.observer.borrow_mut().take();
        drop(observer);
    }

    fn deliver(&self, notification: Notification<T>) {
        if self.is_closed() {
            return;
        }
        if notification.is_terminal() {
            self.inner.stopped.set(true);
        }
        self.inner.queue.borrow_mut().push_back(notification);
        if self.inner.delivering.get() {
            return;
        }

        self.inner.delivering.set(true);
        loop {
            if self.inner.released.get() {
                self.inner.queue.borrow_mut().clear();
                break;
            }
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(notification) = next else {
                break;
            };
            let observer = self.inner.observer.borrow_mut().take();
            let Some(mut observer) = observer else {
                break;
            };
            observer(notification);
            if !self.inner.released.get() {
                *self.inner.observer.borrow_mut() = Some(observer);
            }
        }
        self.inner.delivering.set(false);

        if self.inner.stopped.get() {
            let observer = self.inner.observer.borrow_mut().take();
            drop(observer);
        }
    }
}

// ---------------------------------------------------------------------------
// Observable
// ---------------------------------------------------------------------------

type SubscribeFn<T> = dyn Fn(Subscriber<T>) -> Subscription;

/// A cold push-based stream.
pub struct Observable<T> {
    subscribe_fn: Rc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Rc::clone(&self.subscribe_fn),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T: 'static> Observable<T> {
    /// Build an observable from a subscribe function.
    ///
    /// The function receives the new [`Subscriber`] and returns the teardown
    /// for whatever it started.
    pub fn new(subscribe: impl Fn(Subscriber<T>) -> Subscription + 'static) -> Self {
        Self {
            subscribe_fn: Rc::new(subscribe),
        }
    }

    /// Emits `value` synchronously, then completes.
    pub fn of(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move |subscriber| {
            subscriber.next(value.clone());
            subscriber.complete();
            Subscription::empty()
        })
    }

    /// Completes immediately without emitting.
    pub fn empty() -> Self {
        Self::new(|subscriber| {
            subscriber.complete();
            Subscription::empty()
        })
    }

    /// Subscribe an observer.
    ///
    /// Releasing the returned handle closes the delivery gate first and then
    /// runs the producer's teardown.
    pub fn subscribe(&self, observer: impl FnMut(Notification<T>) + 'static) -> Subscription {
        let subscriber = Subscriber::new(observer);
        let teardown = (self.subscribe_fn)(subscriber.clone());
        Subscription::new(move || {
            subscriber.release();
            teardown.release();
        })
    }

    /// Subscribe to values only; errors and completion are ignored.
    pub fn subscribe_next(&self, mut on_next: impl FnMut(T) + 'static) -> Subscription {
        self.subscribe(move |notification| {
            if let Notification::Next(value) = notification {
                on_next(value);
            }
        })
    }

    /// Transform every value.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Observable<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Observable::new(move |downstream: Subscriber<U>| {
            let f = Rc::clone(&f);
            source.subscribe(move |notification| match notification {
                Notification::Next(value) => downstream.next(f(value)),
                Notification::Error(err) => downstream.error(err),
                Notification::Complete => downstream.complete(),
            })
        })
    }
}

impl<T: Clone + 'static> FromIterator<T> for Observable<T> {
    /// Emits every collected item synchronously, then completes.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Rc<[T]> = iter.into_iter().collect();
        Observable::new(move |subscriber| {
            for item in items.iter() {
                if subscriber.is_closed() {
                    break;
                }
                subscriber.next(item.clone());
            }
            subscriber.complete();
            Subscription::empty()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
