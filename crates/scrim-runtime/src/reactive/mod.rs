#![forbid(unsafe_code)]

//! Change-tracking primitives for overlay projections.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Binding`]: a value derived from one or two observables.
//! - [`EventStream`]: broadcast of discrete events with no current value.
//!
//! # Architecture
//!
//! Everything here is single-threaded and built on `Rc<RefCell<..>>`.
//! Callbacks are stored as `Weak` pointers and pruned lazily during
//! notification, so a consumer that drops its guard costs nothing afterwards.

pub mod binding;
pub mod observable;
pub mod stream;

pub use binding::{Binding, bind_mapped, bind_mapped2};
pub use observable::{Observable, Subscription};
pub use stream::EventStream;
