//! External mutable cell: a value holder read through a replaying observable
//! and written outside the render cycle.

use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;

use crate::component::use_ref;
use crate::error::{BoxError, HookError};
use crate::rx::{BehaviorSubject, Observable};

/// A mutable value with a push-based read side.
///
/// Subscribers to [`observable`](Self::observable) receive the current value
/// synchronously on subscribe, then every later write. Writing never touches
/// the owning component's render state.
pub struct MutableCell<T> {
    subject: BehaviorSubject<T>,
}

impl<T: fmt::Debug> fmt::Debug for MutableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableCell")
            .field("subject", &self.subject)
            .finish()
    }
}

impl<T: Clone + 'static> MutableCell<T> {
    /// A cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            subject: BehaviorSubject::new(initial),
        }
    }

    /// Read side; replays the current value on subscribe.
    pub fn observable(&self) -> Observable<T> {
        self.subject.as_observable()
    }

    /// Write side.
    pub fn setter(&self) -> CellSetter<T> {
        CellSetter {
            subject: self.subject.clone(),
        }
    }

    /// Synchronous read side.
    pub fn getter(&self) -> CellGetter<T> {
        CellGetter {
            subject: self.subject.clone(),
        }
    }

    /// The three bound handles at once.
    pub fn split(&self) -> (Observable<T>, CellSetter<T>, CellGetter<T>) {
        (self.observable(), self.setter(), self.getter())
    }
}

/// Write side of a [`MutableCell`].
pub struct CellSetter<T> {
    subject: BehaviorSubject<T>,
}

impl<T> Clone for CellSetter<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<T> fmt::Debug for CellSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellSetter").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> CellSetter<T> {
    /// Replace the value and broadcast it.
    pub fn set(&self, value: T) {
        self.subject.next(value);
    }

    /// Broadcast `f(previous)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.subject.value());
        self.subject.next(next);
    }

    /// Broadcast the value `f(previous)` resolves to, once it resolves.
    ///
    /// `previous` is read now. Concurrent updates are not queued: each one
    /// broadcasts when its own future completes. Must be called inside a
    /// [`tokio::task::LocalSet`].
    pub fn update_async<F, Fut>(&self, f: F) -> JoinHandle<()>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = T> + 'static,
    {
        let pending = f(self.subject.value());
        let subject = self.subject.clone();
        tokio::task::spawn_local(async move {
            let next = pending.await;
            subject.next(next);
        })
    }

    /// Like [`update_async`](Self::update_async) for fallible updates.
    ///
    /// On failure the value is left unchanged; the error is logged and
    /// returned through the handle.
    pub fn try_update_async<F, Fut, E>(&self, f: F) -> JoinHandle<Result<(), HookError>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Into<BoxError>,
    {
        let pending = f(self.subject.value());
        let subject = self.subject.clone();
        tokio::task::spawn_local(async move {
            match pending.await {
                Ok(next) => {
                    subject.next(next);
                    Ok(())
                }
                Err(err) => {
                    let err = HookError::UpdateRejected(err.into());
                    tracing::error!(error = %err, label = err.as_label(), "cell update rejected");
                    Err(err)
                }
            }
        })
    }
}

/// Synchronous read side of a [`MutableCell`].
pub struct CellGetter<T> {
    subject: BehaviorSubject<T>,
}

impl<T> Clone for CellGetter<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<T> fmt::Debug for CellGetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellGetter").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> CellGetter<T> {
    /// The current value.
    pub fn get(&self) -> T {
        self.subject.value()
    }
}

/// A [`MutableCell`] created on the first render and kept for the lifetime
/// of the component instance.
///
/// Writes never re-render the component; render from the observable (for
/// example through [`use_async`](crate::hooks::use_async)) to react to them.
pub fn use_cell<T: Clone + 'static>(
    init: impl FnOnce() -> T,
) -> (Observable<T>, CellSetter<T>, CellGetter<T>) {
    let cell = use_ref(|| MutableCell::new(init()));
    let cell = cell.borrow();
    cell.split()
}
