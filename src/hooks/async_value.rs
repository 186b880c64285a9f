//! Unified async adapter: render the latest value of a future, async stream
//! or observable.

use tokio_util::sync::CancellationToken;

use crate::component::{use_error_reporter, use_state, Deps};
use crate::hooks::subscription::use_subscription;
use crate::rx::{into_observable, AsyncSource, Notification, Subscription};

/// Subscribe to the source built by `factory` and return its latest value.
///
/// `factory` runs after the first render and again whenever `deps` change.
/// Whatever shape it returns is normalized with [`into_observable`]; every
/// emitted value replaces the rendered state. Until the first emission the
/// hook returns `initial`. After a dependency change the previous value stays
/// in place until the new source emits.
///
/// On teardown (dependency change or unmount) the token handed to `factory`
/// is cancelled and the subscription is released. Values the old source
/// produces afterwards are discarded, even if the source ignores the token.
/// Source errors go to the component's error boundary.
///
/// Deferred and sequence sources run on `spawn_local` tasks, so the component
/// must be driven inside a [`tokio::task::LocalSet`].
///
/// ```
/// use rx_hooks::hooks::use_async;
/// use rx_hooks::rx::AsyncSource;
/// use rx_hooks::testing::Harness;
/// use rx_hooks::deps;
///
/// async fn fetch_greeting() -> String {
///     "Hi!".to_owned()
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// tokio::task::LocalSet::new()
///     .run_until(async {
///         let mut h = Harness::mount(|| {
///             use_async(
///                 |_cancel| AsyncSource::deferred(fetch_greeting()),
///                 deps![],
///                 Some("Loading...".to_owned()),
///             )
///         })
///         .unwrap();
///         h.next_render().await.unwrap();
///         assert_eq!(
///             h.history(),
///             vec![Some("Loading...".to_owned()), Some("Hi!".to_owned())]
///         );
///     })
///     .await;
/// # }
/// ```
pub fn use_async<T, F>(factory: F, deps: Deps, initial: Option<T>) -> Option<T>
where
    T: Clone + 'static,
    F: FnOnce(CancellationToken) -> AsyncSource<T> + 'static,
{
    let (value, set_value) = use_state(move || initial);
    let reporter = use_error_reporter();

    use_subscription(
        move || {
            let token = CancellationToken::new();
            let source = factory(token.clone());
            tracing::debug!(kind = source.kind(), "subscribing to async source");

            let subscription = into_observable(source).subscribe(move |notification| {
                match notification {
                    Notification::Next(next) => set_value.set(Some(next)),
                    Notification::Error(err) => reporter.report(err),
                    Notification::Complete => tracing::trace!("async source completed"),
                }
            });

            Ok(Subscription::new(move || {
                token.cancel();
                subscription.release();
            }))
        },
        deps,
    );

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use crate::error::HookError;
    use crate::rx::BehaviorSubject;
    use crate::testing::Harness;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn deferred_value_replaces_initial() {
        LocalSet::new()
            .run_until(async {
                let mut h = Harness::mount(|| {
                    use_async(
                        |_| {
                            AsyncSource::deferred(async {
                                sleep(Duration::from_millis(100)).await;
                                "Hi!"
                            })
                        },
                        deps![],
                        Some("Loading..."),
                    )
                })
                .unwrap();

                h.next_render().await.unwrap();
                assert_eq!(h.history(), vec![Some("Loading..."), Some("Hi!")]);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn observable_emits_synchronously_on_subscribe() {
        LocalSet::new()
            .run_until(async {
                let subject = BehaviorSubject::new(1);
                let source = subject.clone();
                let mut h = Harness::mount(move || {
                    let source = source.clone();
                    use_async(move |_| source.as_observable().into(), deps![], None)
                })
                .unwrap();
                // Effect emitted during mount, which rendered again right away.
                assert_eq!(h.history(), vec![None, Some(1)]);

                subject.next(2);
                h.next_render().await.unwrap();
                assert_eq!(h.latest(), Some(Some(2)));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_stream_cannot_reach_state() {
        LocalSet::new()
            .run_until(async {
                let key = Rc::new(Cell::new(1_u32));
                let first = BehaviorSubject::new("first-0");
                let second = BehaviorSubject::new("second-0");

                let key_c = key.clone();
                let (a, b) = (first.clone(), second.clone());
                let mut h = Harness::mount(move || {
                    let k = key_c.get();
                    let subject = if k == 1 { a.clone() } else { b.clone() };
                    use_async(move |_| subject.as_observable().into(), deps![k], None)
                })
                .unwrap();
                assert_eq!(h.latest(), Some(Some("first-0")));

                key.set(2);
                h.rerender().unwrap();
                assert_eq!(first.observer_count(), 0);

                first.next("first-late");
                assert!(!h.component().is_dirty());
                assert!(!h.history().contains(&Some("first-late")));
                assert_eq!(h.latest(), Some(Some("second-0")));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn late_deferred_result_is_discarded() {
        LocalSet::new()
            .run_until(async {
                let key = Rc::new(Cell::new(1_u32));
                let key_c = key.clone();
                let mut h = Harness::mount(move || {
                    let k = key_c.get();
                    use_async(
                        move |_| {
                            AsyncSource::deferred(async move {
                                let delay = if k == 1 { 30 } else { 100 };
                                sleep(Duration::from_millis(delay)).await;
                                format!("value-{k}")
                            })
                        },
                        deps![k],
                        None,
                    )
                })
                .unwrap();

                sleep(Duration::from_millis(5)).await;
                key.set(2);
                h.rerender().unwrap();

                sleep(Duration::from_millis(60)).await;
                assert!(!h.component().is_dirty());

                h.next_render().await.unwrap();
                let history = h.history();
                assert!(!history.contains(&Some("value-1".to_owned())));
                assert_eq!(history.last(), Some(&Some("value-2".to_owned())));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_factory_token() {
        LocalSet::new()
            .run_until(async {
                let tokens: Rc<RefCell<Vec<CancellationToken>>> = Rc::default();
                let key = Rc::new(Cell::new(1_u32));
                let (tokens_c, key_c) = (tokens.clone(), key.clone());
                let mut h = Harness::mount(move || {
                    let k = key_c.get();
                    let tokens = tokens_c.clone();
                    use_async(
                        move |token| {
                            tokens.borrow_mut().push(token);
                            AsyncSource::deferred(std::future::pending::<u32>())
                        },
                        deps![k],
                        None,
                    )
                })
                .unwrap();

                key.set(2);
                h.rerender().unwrap();
                {
                    let tokens = tokens.borrow();
                    assert_eq!(tokens.len(), 2);
                    assert!(tokens[0].is_cancelled());
                    assert!(!tokens[1].is_cancelled());
                }

                h.unmount();
                assert!(tokens.borrow()[1].is_cancelled());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn source_error_reaches_boundary() {
        LocalSet::new()
            .run_until(async {
                let mut h = Harness::mount(|| {
                    use_async(
                        |_| {
                            AsyncSource::try_deferred(async {
                                sleep(Duration::from_millis(10)).await;
                                Err::<u32, _>("backend unavailable")
                            })
                        },
                        deps![],
                        Some(0),
                    )
                })
                .unwrap();

                let err = h.next_render().await.unwrap_err();
                assert!(matches!(err, HookError::Source(_)));
                assert_eq!(h.latest(), Some(Some(0)));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn value_survives_dependency_change_until_new_emission() {
        LocalSet::new()
            .run_until(async {
                let key = Rc::new(Cell::new(1_u32));
                let key_c = key.clone();
                let mut h = Harness::mount(move || {
                    let k = key_c.get();
                    use_async(
                        move |_| {
                            AsyncSource::deferred(async move {
                                sleep(Duration::from_millis(10)).await;
                                k * 10
                            })
                        },
                        deps![k],
                        None,
                    )
                })
                .unwrap();
                h.next_render().await.unwrap();
                assert_eq!(h.latest(), Some(Some(10)));

                key.set(2);
                h.rerender().unwrap();
                assert_eq!(h.latest(), Some(Some(10)));

                h.next_render().await.unwrap();
                assert_eq!(h.latest(), Some(Some(20)));
            })
            .await;
    }
}
