#![forbid(unsafe_code)]

//! Runtime plumbing for Scrim: reactive projections, cross-tab messaging,
//! and session storage.
//!
//! Nothing here knows about overlay lifecycles. The engine in `scrim-overlay`
//! publishes into these primitives and consumers read from them.

pub mod reactive;
pub mod storage;
pub mod sync;

pub use reactive::{Binding, EventStream, Observable, Subscription, bind_mapped, bind_mapped2};
#[cfg(feature = "file-storage")]
pub use storage::FileStorage;
pub use storage::{MemoryStorage, PersistedOverlay, SessionStorage, StorageError};
pub use sync::{BroadcastHub, HubPort, SyncError, SyncKind, SyncMessage, SyncTransport, Unavailable};
