//! Lifecycle binder: tie a subscription's lifetime to a dependency list.

use crate::component::{use_effect, Cleanup, Deps};
use crate::error::HookError;
use crate::rx::Subscription;

/// Call `setup` on mount and whenever `deps` change; release the subscription
/// it returned exactly once before the next setup and on unmount.
///
/// If `setup` fails the error goes to the component's error boundary and
/// nothing is retried until `deps` change.
///
/// ```
/// use rx_hooks::component::use_state;
/// use rx_hooks::hooks::use_subscription;
/// use rx_hooks::rx::BehaviorSubject;
/// use rx_hooks::testing::Harness;
/// use rx_hooks::deps;
///
/// let ticker = BehaviorSubject::new(0);
/// let source = ticker.clone();
/// let mut h = Harness::mount(move || {
///     let (tick, set_tick) = use_state(|| 0);
///     let source = source.clone();
///     use_subscription(
///         move || Ok(source.as_observable().subscribe_next(move |t| set_tick.set(t))),
///         deps![],
///     );
///     tick
/// })
/// .unwrap();
///
/// ticker.next(3);
/// h.flush().unwrap();
/// assert_eq!(h.latest(), Some(3));
/// ```
pub fn use_subscription<F>(setup: F, deps: Deps)
where
    F: FnOnce() -> Result<Subscription, HookError> + 'static,
{
    use_effect(
        move || {
            let subscription = setup()?;
            Ok(Some(Box::new(move || subscription.release()) as Cleanup))
        },
        deps,
    );
}
