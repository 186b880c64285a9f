//! # rx-hooks
//!
//! Component hooks that bind asynchronous sources to render state.
//!
//! A [`Component`](component::Component) owns a render closure and the hook
//! state it uses. The hooks in [`hooks`] connect that state to the outside
//! world: a deferred value, an async sequence or a push-based observable is
//! normalized into one [`Observable`](rx::Observable), subscribed after
//! render, and released before every re-subscription and on unmount. Values a
//! superseded source produces after teardown never reach state.
//!
//! ## Core Systems
//!
//! - **[`rx`]**: push-based streams, subscriptions, a replaying subject and the
//!   async-to-observable conversion
//! - **[`component`]**: dependency lists, hook slots, `use_state` / `use_ref` /
//!   `use_effect`, and the component driver
//! - **[`hooks`]**: `use_subscription`, `use_async`, `use_cell`
//! - **[`testing`]**: a headless harness recording every render
//! - **[`config`]** and **[`error`]**: runtime knobs and the error boundary type
//!
//! ```
//! use rx_hooks::component::use_state;
//! use rx_hooks::hooks::use_async;
//! use rx_hooks::rx::AsyncSource;
//! use rx_hooks::testing::Harness;
//! use rx_hooks::deps;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let local = tokio::task::LocalSet::new();
//! local
//!     .run_until(async {
//!         let mut h = Harness::mount(|| {
//!             let (name, _) = use_state(|| "world");
//!             use_async(
//!                 move |_cancel| AsyncSource::deferred(async move { format!("Hello, {name}!") }),
//!                 deps![name],
//!                 None,
//!             )
//!         })
//!         .unwrap();
//!         h.next_render().await.unwrap();
//!         assert_eq!(h.latest(), Some(Some("Hello, world!".to_owned())));
//!     })
//!     .await;
//! # }
//! ```

// Foundation
pub mod config;
pub mod error;

// Streams
pub mod rx;

// Host framework
pub mod component;

// Hooks
pub mod hooks;

pub mod testing;

pub use config::{DepsLengthPolicy, RuntimeConfig};
pub use error::HookError;
