#![forbid(unsafe_code)]

//! Error taxonomy.
//!
//! # Propagation
//!
//! | Error | Raised when | Behaviour |
//! |-------|-------------|-----------|
//! | `Mount` | host cannot provide an insertion root | overlay closes before entering |
//! | `AnimationTimeout` | a transition never reports completion | state is force-settled |
//! | `GestureConflict` | second pointer on an overlay mid-drag | later input ignored |
//! | `SyncChannel` | cross-tab transport unavailable | sync degrades to local-only |
//! | `QueueOverflow` | pending queue exceeds its cap | lowest-priority entries dropped |
//! | `InvalidArgument` | unknown variant, malformed config | returned to the caller |
//!
//! Only `InvalidArgument` ever reaches a caller. Every other error is logged,
//! recorded by the analytics recorder, and absorbed.

use crate::host::HostError;
use crate::id::OverlayId;
use crate::preset::TransitionPhase;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors produced by the overlay engine.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// No insertion root was available for the overlay.
    Mount {
        overlay: OverlayId,
        source: HostError,
    },
    /// A transition did not settle within its timeout window.
    AnimationTimeout {
        overlay: OverlayId,
        phase: TransitionPhase,
    },
    /// Gesture input arrived for an overlay already being dragged.
    GestureConflict { overlay: OverlayId },
    /// The cross-tab channel failed.
    SyncChannel(String),
    /// A pending request was dropped because the queue was full.
    QueueOverflow {
        dropped: OverlayId,
        capacity: usize,
    },
    /// Programming error at the call site.
    InvalidArgument(String),
}

impl OverlayError {
    #[must_use]
    pub fn kind(&self) -> OverlayErrorKind {
        match self {
            Self::Mount { .. } => OverlayErrorKind::Mount,
            Self::AnimationTimeout { .. } => OverlayErrorKind::AnimationTimeout,
            Self::GestureConflict { .. } => OverlayErrorKind::GestureConflict,
            Self::SyncChannel(_) => OverlayErrorKind::SyncChannel,
            Self::QueueOverflow { .. } => OverlayErrorKind::QueueOverflow,
            Self::InvalidArgument(_) => OverlayErrorKind::InvalidArgument,
        }
    }

    /// The overlay the error concerns, when there is one.
    #[must_use]
    pub fn overlay(&self) -> Option<OverlayId> {
        match self {
            Self::Mount { overlay, .. }
            | Self::AnimationTimeout { overlay, .. }
            | Self::GestureConflict { overlay } => Some(*overlay),
            Self::QueueOverflow { dropped, .. } => Some(*dropped),
            Self::SyncChannel(_) | Self::InvalidArgument(_) => None,
        }
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount { overlay, source } => write!(f, "cannot mount {overlay}: {source}"),
            Self::AnimationTimeout { overlay, phase } => {
                let phase = match phase {
                    TransitionPhase::Enter => "enter",
                    TransitionPhase::Exit => "exit",
                };
                write!(f, "{phase} transition of {overlay} timed out")
            }
            Self::GestureConflict { overlay } => {
                write!(f, "conflicting gesture on {overlay} ignored")
            }
            Self::SyncChannel(msg) => write!(f, "sync channel unavailable: {msg}"),
            Self::QueueOverflow { dropped, capacity } => {
                write!(f, "queue over capacity {capacity}, dropped {dropped}")
            }
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for OverlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mount { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Payload-free error tag, used as an analytics key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayErrorKind {
    Mount,
    AnimationTimeout,
    GestureConflict,
    SyncChannel,
    QueueOverflow,
    InvalidArgument,
}

impl OverlayErrorKind {
    pub const ALL: [OverlayErrorKind; 6] = [
        Self::Mount,
        Self::AnimationTimeout,
        Self::GestureConflict,
        Self::SyncChannel,
        Self::QueueOverflow,
        Self::InvalidArgument,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Mount => 0,
            Self::AnimationTimeout => 1,
            Self::GestureConflict => 2,
            Self::SyncChannel => 3,
            Self::QueueOverflow => 4,
            Self::InvalidArgument => 5,
        }
    }
}

impl fmt::Display for OverlayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mount => "MountError",
            Self::AnimationTimeout => "AnimationTimeoutError",
            Self::GestureConflict => "GestureConflictError",
            Self::SyncChannel => "SyncChannelError",
            Self::QueueOverflow => "QueueOverflowError",
            Self::InvalidArgument => "InvalidArgumentError",
        };
        f.write_str(s)
    }
}
