#![forbid(unsafe_code)]

//! Dismiss policy and dismiss triggers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Which user-driven dismiss triggers an overlay honours.
    ///
    /// Programmatic `close()` is always honoured; an empty policy means
    /// "programmatic only".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DismissPolicy: u8 {
        const BACKDROP = 0b001;
        const ESCAPE = 0b010;
        const GESTURE = 0b100;
    }
}

impl DismissPolicy {
    /// Only programmatic `close()` dismisses.
    pub const PROGRAMMATIC_ONLY: Self = Self::empty();

    /// Whether the given trigger is allowed by this policy.
    #[must_use]
    pub fn allows(self, trigger: DismissTrigger) -> bool {
        match trigger {
            DismissTrigger::Backdrop => self.contains(Self::BACKDROP),
            DismissTrigger::Escape => self.contains(Self::ESCAPE),
            DismissTrigger::Gesture => self.contains(Self::GESTURE),
            DismissTrigger::Programmatic | DismissTrigger::AutoDismiss | DismissTrigger::Remote => {
                true
            }
        }
    }
}

impl Default for DismissPolicy {
    fn default() -> Self {
        Self::BACKDROP | Self::ESCAPE
    }
}

/// What caused an overlay to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissTrigger {
    Backdrop,
    Escape,
    Gesture,
    Programmatic,
    /// A notification's auto-dismiss timer elapsed.
    AutoDismiss,
    /// Another tab closed the notification this overlay mirrors.
    Remote,
}

impl DismissTrigger {
    /// Every trigger, for iterating analytics counters.
    pub const ALL: [DismissTrigger; 6] = [
        Self::Backdrop,
        Self::Escape,
        Self::Gesture,
        Self::Programmatic,
        Self::AutoDismiss,
        Self::Remote,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Backdrop => 0,
            Self::Escape => 1,
            Self::Gesture => 2,
            Self::Programmatic => 3,
            Self::AutoDismiss => 4,
            Self::Remote => 5,
        }
    }
}

impl fmt::Display for DismissTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Backdrop => "backdrop",
            Self::Escape => "escape",
            Self::Gesture => "gesture",
            Self::Programmatic => "programmatic",
            Self::AutoDismiss => "auto-dismiss",
            Self::Remote => "remote",
        };
        f.write_str(s)
    }
}
