#![forbid(unsafe_code)]

//! Fire-and-forget event fan-out.
//!
//! Unlike an [`Observable`](super::Observable), an [`EventStream`] keeps no
//! current value: each emitted event is delivered once to every live
//! subscriber and then forgotten. Events emitted from inside a subscriber are
//! queued and delivered after the current one, so every subscriber observes
//! the same order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use super::observable::Subscription;

type Listener<E> = dyn Fn(&E);

struct StreamInner<E> {
    listeners: Vec<Weak<Listener<E>>>,
    pending: VecDeque<E>,
    delivering: bool,
    emitted: u64,
}

/// A broadcast stream of events. Clones share listeners.
pub struct EventStream<E> {
    inner: Rc<RefCell<StreamInner<E>>>,
}

impl<E> Clone for EventStream<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventStream")
            .field("listeners", &inner.listeners.len())
            .field("emitted", &inner.emitted)
            .finish()
    }
}

impl<E: 'static> Default for EventStream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventStream<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StreamInner {
                listeners: Vec::new(),
                pending: VecDeque::new(),
                delivering: false,
                emitted: 0,
            })),
        }
    }

    /// Listen for events until the returned guard is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let listener: Rc<Listener<E>> = Rc::new(listener);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&listener));
        Subscription::from_guard(Box::new(listener))
    }

    /// Deliver `event` to every live listener.
    pub fn emit(&self, event: E) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.emitted += 1;
            inner.pending.push_back(event);
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }
        loop {
            let (event, listeners) = {
                let mut inner = self.inner.borrow_mut();
                let Some(event) = inner.pending.pop_front() else {
                    inner.delivering = false;
                    return;
                };
                inner.listeners.retain(|w| w.strong_count() > 0);
                let listeners: Vec<_> = inner.listeners.iter().filter_map(Weak::upgrade).collect();
                (event, listeners)
            };
            for listener in listeners {
                listener(&event);
            }
        }
    }

    /// Total events emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.inner.borrow().emitted
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}
