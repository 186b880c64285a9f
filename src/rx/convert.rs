//! Normalizing futures, async streams and observables into one [`Observable`].
//!
//! [`AsyncSource`] names the three shapes a hook may be handed:
//!
//! - a deferred single value (a future),
//! - an incrementally produced sequence (an async [`Stream`]),
//! - a push-based [`Observable`].
//!
//! [`into_observable`] turns any of them into an `Observable`. Futures and
//! streams are driven on a `spawn_local` task, so subscribing to a converted
//! source must happen inside a [`tokio::task::LocalSet`]. Releasing the
//! subscription cancels a [`CancellationToken`]; the task then drops the
//! future or stream at its next wake-up, which is how a Rust producer is asked
//! to stop early. Delivery stops immediately either way.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{LocalBoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, HookError};
use crate::rx::observable::{Observable, Subscriber};
use crate::rx::subscription::Subscription;

// ---------------------------------------------------------------------------
// AsyncSource
// ---------------------------------------------------------------------------

/// One of the three async input shapes.
pub enum AsyncSource<T> {
    /// Resolves to exactly one value, or fails, once.
    Deferred(LocalBoxFuture<'static, Result<T, HookError>>),
    /// Yields zero or more values over time, then ends.
    Sequence(LocalBoxStream<'static, Result<T, HookError>>),
    /// Pushes values to its observers; passed through untouched.
    Stream(Observable<T>),
}

impl<T: 'static> AsyncSource<T> {
    /// An infallible future.
    pub fn deferred(fut: impl Future<Output = T> + 'static) -> Self {
        AsyncSource::Deferred(fut.map(Ok).boxed_local())
    }

    /// A fallible future. An `Err` is delivered as [`HookError::Source`].
    pub fn try_deferred<E>(fut: impl Future<Output = Result<T, E>> + 'static) -> Self
    where
        E: Into<BoxError>,
    {
        AsyncSource::Deferred(fut.map(|res| res.map_err(HookError::source)).boxed_local())
    }

    /// An infallible async stream.
    pub fn sequence(stream: impl Stream<Item = T> + 'static) -> Self {
        AsyncSource::Sequence(stream.map(Ok).boxed_local())
    }

    /// A fallible async stream. The first `Err` ends the sequence.
    pub fn try_sequence<E>(stream: impl Stream<Item = Result<T, E>> + 'static) -> Self
    where
        E: Into<BoxError>,
    {
        AsyncSource::Sequence(
            stream
                .map(|res| res.map_err(HookError::source))
                .boxed_local(),
        )
    }

    /// A push-based stream.
    pub fn stream(observable: Observable<T>) -> Self {
        AsyncSource::Stream(observable)
    }

    /// Short name of the shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AsyncSource::Deferred(_) => "deferred",
            AsyncSource::Sequence(_) => "sequence",
            AsyncSource::Stream(_) => "stream",
        }
    }
}

impl<T: 'static> From<Observable<T>> for AsyncSource<T> {
    fn from(observable: Observable<T>) -> Self {
        AsyncSource::Stream(observable)
    }
}

impl<T> fmt::Debug for AsyncSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            AsyncSource::Deferred(_) => "Deferred",
            AsyncSource::Sequence(_) => "Sequence",
            AsyncSource::Stream(_) => "Stream",
        };
        f.debug_tuple("AsyncSource").field(&kind).finish()
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Normalize `source` into a push-based stream.
///
/// Deferred and sequence sources can only be consumed once: the first
/// subscriber drives them, any later subscriber just sees `Complete`.
///
/// # Panics
///
/// Subscribing to a converted deferred or sequence source outside a
/// [`tokio::task::LocalSet`] panics (see [`tokio::task::spawn_local`]).
pub fn into_observable<T: 'static>(source: AsyncSource<T>) -> Observable<T> {
    match source {
        AsyncSource::Stream(observable) => observable,
        AsyncSource::Deferred(fut) => {
            let slot = Rc::new(RefCell::new(Some(fut)));
            Observable::new(move |subscriber| {
                let taken = slot.borrow_mut().take();
                match taken {
                    Some(fut) => drive_deferred(fut, subscriber),
                    None => already_consumed(subscriber, "deferred"),
                }
            })
        }
        AsyncSource::Sequence(stream) => {
            let slot = Rc::new(RefCell::new(Some(stream)));
            Observable::new(move |subscriber| {
                let taken = slot.borrow_mut().take();
                match taken {
                    Some(stream) => drive_sequence(stream, subscriber),
                    None => already_consumed(subscriber, "sequence"),
                }
            })
        }
    }
}

fn already_consumed<T>(subscriber: Subscriber<T>, kind: &'static str) -> Subscription {
    tracing::debug!(kind, "async source already consumed; completing new subscriber");
    subscriber.complete();
    Subscription::empty()
}

fn drive_deferred<T: 'static>(
    fut: LocalBoxFuture<'static, Result<T, HookError>>,
    subscriber: Subscriber<T>,
) -> Subscription {
    let token = CancellationToken::new();
    let cancelled = token.clone();

    tokio::task::spawn_local(async move {
        let outcome = tokio::select! {
            biased;
            _ = cancelled.cancelled() => None,
            res = fut => Some(res),
        };
        match outcome {
            None => tracing::trace!("deferred source dropped before resolving"),
            Some(_) if subscriber.is_closed() => {
                tracing::trace!("deferred source resolved after release; discarded");
            }
            Some(Ok(value)) => {
                subscriber.next(value);
                subscriber.complete();
            }
            Some(Err(err)) => subscriber.error(err),
        }
    });

    Subscription::new(move || token.cancel())
}

fn drive_sequence<T: 'static>(
    mut stream: LocalBoxStream<'static, Result<T, HookError>>,
    subscriber: Subscriber<T>,
) -> Subscription {
    let token = CancellationToken::new();
    let cancelled = token.clone();

    tokio::task::spawn_local(async move {
        let mut produced = 0usize;
        loop {
            let item = tokio::select! {
                biased;
                _ = cancelled.cancelled() => None,
                item = stream.next() => Some(item),
            };
            match item {
                None => {
                    tracing::trace!(produced, "sequence source stopped early");
                    break;
                }
                Some(Some(Ok(value))) => {
                    produced += 1;
                    subscriber.next(value);
                }
                Some(Some(Err(err))) => {
                    subscriber.error(err);
                    break;
                }
                Some(None) => {
                    subscriber.complete();
                    break;
                }
            }
            if subscriber.is_closed() {
                break;
            }
        }
    });

    Subscription::new(move || token.cancel())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
