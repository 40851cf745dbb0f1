#![forbid(unsafe_code)]

//! Version-tracked shared values with change notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per `set` that changes the value.
//! 2. Setting a value equal to the current value is a no-op.
//! 3. Subscribers run in registration order, after the new value is stored,
//!    so a callback that reads the observable sees the new value.
//! 4. Dropping a [`Subscription`] stops its callback before the next
//!    notification; dead entries are pruned lazily.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared, version-tracked value.
///
/// Clones share the same underlying value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>()
        };
        let snapshot = self.get();
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Modify the value in place through a copy.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Number of changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a change callback. Keep the returned guard alive for as long
    /// as the callback should fire.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription {
            _callback: Box::new(callback),
        }
    }

    /// Live subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// RAII guard that keeps a callback registered.
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl Subscription {
    /// Wrap any strong handle whose lifetime controls a registration.
    pub(crate) fn from_guard(guard: Box<dyn Any>) -> Self {
        Self { _callback: guard }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_bumps_version_once() {
        let depth = Observable::new(0usize);
        depth.set(1);
        assert_eq!(depth.version(), 1);
        depth.set(1);
        assert_eq!(depth.version(), 1);
        assert_eq!(depth.get(), 1);
    }

    #[test]
    fn subscribers_see_new_value() {
        let locked = Observable::new(false);
        let seen = Rc::new(Cell::new(None));
        let s = Rc::clone(&seen);
        let probe = locked.clone();
        let _sub = locked.subscribe(move |v| s.set(Some((*v, probe.get()))));

        locked.set(true);
        assert_eq!(seen.get(), Some((true, true)));
    }

    #[test]
    fn dropped_subscription_stops_firing() {
        let obs = Observable::new(1);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = obs.subscribe(move |_| h.set(h.get() + 1));

        obs.set(2);
        drop(sub);
        obs.set(3);
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn update_in_place() {
        let queue = Observable::new(vec![1, 2]);
        queue.update(|q| q.push(3));
        assert_eq!(queue.get(), vec![1, 2, 3]);
        assert_eq!(queue.version(), 1);
    }

    #[test]
    fn registration_order() {
        let obs = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&order);
        let b = Rc::clone(&order);
        let _s1 = obs.subscribe(move |_| a.borrow_mut().push("first"));
        let _s2 = obs.subscribe(move |_| b.borrow_mut().push("second"));
        obs.set(1);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }
}
