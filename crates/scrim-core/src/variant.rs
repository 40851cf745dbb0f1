#![forbid(unsafe_code)]

//! Content-shell tags.
//!
//! A variant tells the host which shell to render around the caller's props.
//! The engine only uses it for defaults and for deciding which overlays are
//! notification-class (mirrored across tabs).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which content shell an overlay renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Variant {
    Confirmation,
    Video,
    Form,
    Gallery,
    Notification,
    Loading,
    Fullscreen,
    /// A caller-registered shell. Must be registered on the engine before use.
    Custom(String),
}

impl Variant {
    /// Every built-in variant, in declaration order.
    pub const BUILTIN: [Variant; 7] = [
        Variant::Confirmation,
        Variant::Video,
        Variant::Form,
        Variant::Gallery,
        Variant::Notification,
        Variant::Loading,
        Variant::Fullscreen,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Confirmation => "confirmation",
            Self::Video => "video",
            Self::Form => "form",
            Self::Gallery => "gallery",
            Self::Notification => "notification",
            Self::Loading => "loading",
            Self::Fullscreen => "fullscreen",
            Self::Custom(name) => name,
        }
    }

    /// Notification-class overlays carry no local state and are the only
    /// ones mirrored to other tabs.
    #[must_use]
    pub fn is_notification_class(&self) -> bool {
        matches!(self, Self::Notification)
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        match value.as_str() {
            "confirmation" => Self::Confirmation,
            "video" => Self::Video,
            "form" => Self::Form,
            "gallery" => Self::Gallery,
            "notification" => Self::Notification,
            "loading" => Self::Loading,
            "fullscreen" => Self::Fullscreen,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<Variant> for String {
    fn from(value: Variant) -> Self {
        match value {
            Variant::Custom(name) => name,
            other => other.name().to_owned(),
        }
    }
}

impl FromStr for Variant {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
