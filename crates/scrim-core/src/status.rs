#![forbid(unsafe_code)]

//! Lifecycle status and close reasons.

use crate::dismiss::DismissTrigger;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of one overlay.
///
/// `Queued → Entering → Open → Exiting → Closed`. An instance may also jump
/// straight from `Queued` to `Closed` when it is cancelled, dropped by the
/// overflow guard, or fails to mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStatus {
    Queued,
    Entering,
    Open,
    Exiting,
    Closed,
}

impl OverlayStatus {
    /// Whether the instance currently sits on the stack.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Entering | Self::Open | Self::Exiting)
    }

    /// Whether the instance is in the middle of a transition.
    #[must_use]
    pub const fn is_transitioning(self) -> bool {
        matches!(self, Self::Entering | Self::Exiting)
    }
}

impl fmt::Display for OverlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Entering => "entering",
            Self::Open => "open",
            Self::Exiting => "exiting",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Why an overlay reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum CloseReason {
    /// Dismissed normally through one of the dismiss triggers.
    Dismissed { trigger: DismissTrigger },
    /// No insertion root was available; the overlay never entered.
    MountFailed { detail: String },
    /// Dropped by the queue overflow guard before admission.
    QueueOverflow,
    /// Withdrawn while still queued (`cancel` or `close_all`).
    Cancelled,
}

impl CloseReason {
    /// Whether the close reflects a failure rather than a normal dismissal.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::MountFailed { .. } | Self::QueueOverflow)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dismissed { trigger } => write!(f, "dismissed by {trigger}"),
            Self::MountFailed { detail } => write!(f, "mount failed: {detail}"),
            Self::QueueOverflow => f.write_str("dropped by queue overflow"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}
