#![forbid(unsafe_code)]

//! Input events the host forwards to the engine.
//!
//! Events that target an overlay name it explicitly. The engine routes them
//! only to the topmost instance; anything aimed at a lower instance is inert.

use crate::id::{ElementId, OverlayId};

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Tab,
    /// Shift+Tab.
    BackTab,
    Enter,
    Other(char),
}

/// Axis along which a drag dismisses an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    Horizontal,
    #[default]
    Vertical,
}

/// Pointer position in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Coordinate along an axis.
    #[must_use]
    pub const fn along(self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// Host pointer identifier (mouse, pen, or one touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

/// Input delivered to the engine's `handle_input`.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key press while an overlay may own focus.
    Key(Key),
    /// Focus moved to `element` (the host's `focusin`).
    FocusIn(ElementId),
    /// The backdrop behind `target` was clicked.
    BackdropClick { target: OverlayId },
    PointerDown {
        target: OverlayId,
        pointer: PointerId,
        position: Point,
    },
    PointerMove {
        pointer: PointerId,
        position: Point,
    },
    PointerUp {
        pointer: PointerId,
        position: Point,
    },
    PointerCancel {
        pointer: PointerId,
    },
}

impl InputEvent {
    /// Pointer this event belongs to, if any.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            Self::PointerDown { pointer, .. }
            | Self::PointerMove { pointer, .. }
            | Self::PointerUp { pointer, .. }
            | Self::PointerCancel { pointer } => Some(*pointer),
            _ => None,
        }
    }
}
