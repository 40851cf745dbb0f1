#![forbid(unsafe_code)]

//! Overlay orchestration for Scrim.
//!
//! This crate provides:
//! - [`OverlayEngine`], the stack manager that owns every overlay instance
//! - the subsystems it coordinates: stacking, portals, focus traps, scroll
//!   lock, drag-to-dismiss gestures, transitions, and the admission queue
//! - [`variants`] shells with per-variant dismiss and animation defaults
//! - [`OverlayViews`] and [`OverlayEvent`] projections for renderers
//! - cross-tab mirroring ([`SyncBridge`]) and session [`Persistence`]

pub mod analytics;
pub mod animation;
pub mod engine;
pub mod focus;
pub mod gesture;
pub mod handle;
pub mod mirror;
pub mod persistence;
pub mod portal;
pub mod queue;
pub mod scroll_lock;
pub mod stack;
pub mod timers;
pub mod variants;
pub mod views;

pub use analytics::{AnalyticsRecorder, AnalyticsSummary, InstanceMetrics};
pub use animation::{AnimationOrchestrator, Settled, Started, TransitionView};
pub use engine::{OverlayEngine, OverlayEngineBuilder};
pub use focus::FocusController;
pub use gesture::{GestureController, GestureOutcome, GesturePhase, GestureState};
pub use handle::{OverlayHandle, OverlaySnapshot};
pub use mirror::{MirrorAction, MirrorKey, SyncBridge};
pub use persistence::Persistence;
pub use portal::PortalMount;
pub use queue::{QueueEntry, QueueScheduler};
pub use scroll_lock::ScrollLock;
pub use stack::{OverlayStack, StackEntry};
pub use timers::Timers;
pub use variants::Shell;
pub use views::{OverlayEvent, OverlayViews, StackItem};
