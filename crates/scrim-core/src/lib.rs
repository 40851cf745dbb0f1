#![forbid(unsafe_code)]

//! Core vocabulary for the Scrim overlay engine.
//!
//! This crate holds the types every other Scrim crate speaks: overlay ids,
//! variants, lifecycle status, dismiss policy, configuration, animation
//! presets, input events, the [`host::Host`] seam, clocks, and the error
//! taxonomy. It contains no lifecycle logic of its own.

pub mod config;
pub mod dismiss;
pub mod error;
pub mod event;
pub mod host;
pub mod id;
pub mod preset;
pub mod status;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod time;
pub mod variant;

pub use config::{GestureConfig, OpenOptions, OverlayConfig, QueuePolicy};
pub use dismiss::{DismissPolicy, DismissTrigger};
pub use error::{OverlayError, OverlayErrorKind};
pub use event::{Axis, InputEvent, Key, Point, PointerId};
pub use host::{Host, HostError, ScrollPosition, TransitionAck};
pub use id::{ElementId, NodeId, OverlayId, PortalKey, TabId};
pub use preset::{AnimationPreset, Easing, PresetTable, TransitionPhase};
pub use status::{CloseReason, OverlayStatus};
pub use time::{Clock, ManualClock, SystemClock};
pub use variant::Variant;

/// Opaque payload handed to the content renderer. The engine never inspects it.
pub type Props = serde_json::Value;
