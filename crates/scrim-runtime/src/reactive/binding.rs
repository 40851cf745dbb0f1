#![forbid(unsafe_code)]

//! Derived, read-only values computed from [`Observable`]s.
//!
//! A [`Binding<T>`] holds no value of its own. Every `get()` re-runs its
//! transform against the sources, so a binding can never be stale and needs
//! no subscription to stay current.
//!
//! ```
//! use scrim_runtime::reactive::{Observable, bind_mapped};
//!
//! let depth = Observable::new(0usize);
//! let any_open = bind_mapped(&depth, |d| *d > 0);
//! assert!(!any_open.get());
//! depth.set(2);
//! assert!(any_open.get());
//! ```

use std::fmt;
use std::rc::Rc;

use super::observable::Observable;

/// A value derived from one or more observables.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.get()).finish()
    }
}

impl<T: 'static> Binding<T> {
    pub fn new(eval: impl Fn() -> T + 'static) -> Self {
        Self {
            eval: Rc::new(eval),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        (self.eval)()
    }
}

/// `map` applied to the current value of `source`.
pub fn bind_mapped<S: Clone + PartialEq + 'static, T: 'static>(
    source: &Observable<S>,
    map: impl Fn(&S) -> T + 'static,
) -> Binding<T> {
    let source = source.clone();
    Binding::new(move || source.with(|value| map(value)))
}

/// `map` applied to the current values of two observables.
pub fn bind_mapped2<S1, S2, T>(
    first: &Observable<S1>,
    second: &Observable<S2>,
    map: impl Fn(&S1, &S2) -> T + 'static,
) -> Binding<T>
where
    S1: Clone + PartialEq + 'static,
    S2: Clone + PartialEq + 'static,
    T: 'static,
{
    let first = first.clone();
    let second = second.clone();
    Binding::new(move || first.with(|a| second.with(|b| map(a, b))))
}
