#![forbid(unsafe_code)]

//! Scrim: headless overlay and modal orchestration.
//!
//! Scrim owns the lifecycle of every modal, drawer, lightbox, and toast an
//! application shows. It stacks them with strictly increasing z-indexes,
//! traps and restores focus, locks page scroll, recognizes drag-to-dismiss
//! gestures, runs one enter/exit transition at a time, queues requests under
//! a policy, and can mirror notifications across tabs. Rendering stays with
//! the host: the engine talks to it through the [`Host`] trait and publishes
//! read-only projections for renderers to subscribe to.
//!
//! # Example
//!
//! ```
//! use scrim::prelude::*;
//! use scrim::core::testing::ScriptedHost;
//! use serde_json::json;
//!
//! let mut engine = OverlayEngine::builder(ScriptedHost::new()).build().unwrap();
//! let confirm = variants::confirmation(&mut engine, json!({ "msg": "Discard draft?" })).unwrap();
//! assert_eq!(confirm.status(&engine), Some(OverlayStatus::Open));
//!
//! // Escape is allowed by the confirmation shell.
//! assert!(engine.handle_input(InputEvent::Key(Key::Escape)));
//! assert_eq!(confirm.status(&engine), Some(OverlayStatus::Closed));
//! ```

pub use scrim_core as core;
pub use scrim_overlay as overlay;
pub use scrim_runtime as runtime;

pub use scrim_core::{
    AnimationPreset, Axis, Clock, CloseReason, DismissPolicy, DismissTrigger, Easing, ElementId,
    GestureConfig, Host, HostError, InputEvent, Key, ManualClock, NodeId, OpenOptions,
    OverlayConfig, OverlayError, OverlayErrorKind, OverlayId, OverlayStatus, Point, PointerId,
    PortalKey, Props, QueuePolicy, ScrollPosition, SystemClock, TabId, TransitionAck,
    TransitionPhase, Variant,
};
pub use scrim_overlay::{
    AnalyticsSummary, GesturePhase, GestureState, OverlayEngine, OverlayEngineBuilder,
    OverlayEvent, OverlayHandle, OverlaySnapshot, OverlayViews, Shell, StackItem,
    TransitionView, variants,
};
#[cfg(feature = "file-storage")]
pub use scrim_runtime::FileStorage;
pub use scrim_runtime::{
    Binding, BroadcastHub, EventStream, MemoryStorage, Observable, SessionStorage, Subscription,
    SyncTransport,
};

/// Everything needed to drive an engine from application code.
pub mod prelude {
    pub use crate::{
        DismissPolicy, DismissTrigger, Host, InputEvent, Key, OpenOptions, OverlayConfig,
        OverlayEngine, OverlayError, OverlayEvent, OverlayHandle, OverlayId, OverlayStatus,
        QueuePolicy, TransitionAck, Variant, variants,
    };
}
