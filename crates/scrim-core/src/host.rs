#![forbid(unsafe_code)]

//! The host seam.
//!
//! Everything the engine needs from the page (insertion roots, focus, scroll,
//! animation) goes through [`Host`]. A browser binding implements it over the
//! DOM; tests use the scripted host from [`crate::testing`].
//!
//! # Ownership
//!
//! The engine owns its host. No other component is expected to create portal
//! roots, move focus into overlays, or toggle the scroll lock behind the
//! engine's back.

use crate::event::Axis;
use crate::id::{ElementId, NodeId, OverlayId, PortalKey};
use crate::preset::{AnimationPreset, TransitionPhase};
use std::fmt;

/// Document scroll offset in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How the host will report the end of a transition it was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionAck {
    /// Nothing to animate; the transition is already over.
    Immediate,
    /// The host will call `transition_finished` when its animation ends.
    /// If it never does, the engine force-settles after the timeout window.
    Callback,
    /// The host does not report completion; the engine settles the transition
    /// once the preset duration has elapsed.
    #[default]
    Timed,
}

/// Failure reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The document (or layout context) is not ready to receive nodes.
    NotReady,
    /// Any other host-specific failure.
    Other(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "host not ready"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Page-side operations the engine delegates to.
pub trait Host {
    // --- Portal roots ---

    /// Create an insertion root for `key` outside the normal layout flow.
    fn create_root(&mut self, key: &PortalKey) -> Result<NodeId, HostError>;

    /// Remove a root created by [`create_root`](Self::create_root).
    fn remove_root(&mut self, node: NodeId);

    // --- Focus ---

    /// Currently focused element, if any.
    fn active_element(&self) -> Option<ElementId>;

    /// Move keyboard focus to `element`.
    fn focus(&mut self, element: ElementId);

    /// Whether `element` is still part of the document.
    fn is_attached(&self, element: ElementId) -> bool;

    /// Focusable elements rendered inside `overlay`, in tab order.
    fn focusables(&self, overlay: OverlayId) -> Vec<ElementId>;

    /// Where focus goes when the recorded trigger is gone.
    fn default_focus_target(&self) -> Option<ElementId> {
        None
    }

    // --- Scroll ---

    fn scroll_position(&self) -> ScrollPosition;

    fn scroll_to(&mut self, position: ScrollPosition);

    /// Width of the vertical scrollbar that disappears when scrolling is
    /// disabled (0 on overlay-scrollbar platforms).
    fn scrollbar_width(&self) -> f64;

    /// Enable or disable body scrolling. `compensation` is the padding to add
    /// so content does not shift when the scrollbar vanishes.
    fn set_scroll_locked(&mut self, locked: bool, compensation: f64);

    // --- Animation ---

    /// Begin rendering a transition for `overlay`.
    fn start_transition(
        &mut self,
        overlay: OverlayId,
        phase: TransitionPhase,
        preset: &AnimationPreset,
    ) -> TransitionAck {
        let _ = (overlay, phase, preset);
        TransitionAck::Timed
    }

    // --- Geometry ---

    /// Length of `overlay` along the dismiss axis, if measurable.
    fn extent(&self, overlay: OverlayId, axis: Axis) -> Option<f64> {
        let _ = (overlay, axis);
        None
    }
}
