//! Dependency lists: the keys that decide when an effect re-runs.
//!
//! A [`Deps`] is an ordered list of opaque keys. Two lists are equal when they
//! have the same length and every position holds keys of the same type that
//! compare equal with `PartialEq`. Lists of different length are never equal.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// DepKey
// ---------------------------------------------------------------------------

/// A single dependency key. Implemented for every `'static + PartialEq + Debug` type.
pub trait DepKey: Any + fmt::Debug {
    /// Upcast for downcasting in [`dep_eq`](Self::dep_eq).
    fn as_any(&self) -> &dyn Any;

    /// Shallow equality against a key of possibly different type.
    fn dep_eq(&self, other: &dyn DepKey) -> bool;
}

impl<T: Any + PartialEq + fmt::Debug> DepKey for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dep_eq(&self, other: &dyn DepKey) -> bool {
        (*other)
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Key that compares an `Rc` by pointer instead of by value.
pub struct Identity<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> Identity<T> {
    /// Wrap a clone of `rc`.
    pub fn of(rc: &Rc<T>) -> Self {
        Identity(Rc::clone(rc))
    }
}

impl<T: ?Sized> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Identity(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Identity<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&Rc::as_ptr(&self.0)).finish()
    }
}

// ---------------------------------------------------------------------------
// Deps
// ---------------------------------------------------------------------------

/// Outcome of comparing two dependency lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsChange {
    /// Same length, every key equal.
    Unchanged,
    /// Same length, at least one key differs.
    Changed,
    /// The lists have different lengths.
    LengthChanged {
        /// Length of the older list.
        previous: usize,
        /// Length of the newer list.
        current: usize,
    },
}

impl DepsChange {
    /// Whether the effect has to be torn down and set up again.
    pub fn is_changed(&self) -> bool {
        !matches!(self, DepsChange::Unchanged)
    }
}

/// Ordered list of dependency keys. Build one with [`deps!`](crate::deps).
#[derive(Default)]
pub struct Deps {
    keys: Vec<Box<dyn DepKey>>,
}

impl Deps {
    /// An empty list: the effect runs once, on mount.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key (builder).
    pub fn with(mut self, key: impl DepKey) -> Self {
        self.push(key);
        self
    }

    /// Append a key.
    pub fn push(&mut self, key: impl DepKey) {
        self.keys.push(Box::new(key));
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the list has no keys (a run-once effect).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compare this (newer) list against `previous`.
    pub fn compare(&self, previous: &Deps) -> DepsChange {
        if self.keys.len() != previous.keys.len() {
            return DepsChange::LengthChanged {
                previous: previous.keys.len(),
                current: self.keys.len(),
            };
        }
        let same = self
            .keys
            .iter()
            .zip(previous.keys.iter())
            .all(|(new, old)| (**new).dep_eq(&**old));
        if same {
            DepsChange::Unchanged
        } else {
            DepsChange::Changed
        }
    }
}

impl PartialEq for Deps {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == DepsChange::Unchanged
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys.iter()).finish()
    }
}

/// Build a [`Deps`] list from comma-separated keys.
///
/// ```
/// use rx_hooks::component::use_effect;
/// use rx_hooks::deps;
/// use rx_hooks::testing::Harness;
///
/// let h = Harness::mount(|| {
///     let (user_id, page) = (7_u32, 2_u32);
///     use_effect(move || { let _ = (user_id, page); Ok(None) }, deps![user_id, page]);
///     // Runs once.
///     use_effect(|| Ok(None), deps![]);
/// })
/// .unwrap();
/// assert_eq!(h.render_count(), 1);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::component::Deps::new()
    };
    ($($key:expr),+ $(,)?) => {
        $crate::component::Deps::new()$(.with($key))+
    };
}
