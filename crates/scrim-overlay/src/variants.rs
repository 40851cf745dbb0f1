#![forbid(unsafe_code)]

//! Pre-configured content shells.
//!
//! Each shell fixes a variant, a default dismiss policy, and a default
//! animation preset, then forwards the caller's props untouched. Options the
//! caller sets explicitly win over the shell's defaults.
//!
//! | Shell | Dismiss | Preset |
//! |-------|---------|--------|
//! | confirmation | backdrop, escape | `scale` |
//! | video | backdrop, escape | `fade` |
//! | form | escape | `slide-up` |
//! | gallery | backdrop, escape, gesture | `fade` |
//! | notification | escape, gesture | `slide-down` |
//! | loading | programmatic only | `fade` |
//! | fullscreen | escape, gesture | `slide-up` |

use crate::engine::OverlayEngine;
use crate::handle::OverlayHandle;
use scrim_core::{DismissPolicy, Host, OpenOptions, OverlayError, Props, Variant};

/// A variant with its default dismiss policy and preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub variant: Variant,
    pub dismiss: DismissPolicy,
    pub preset: &'static str,
}

pub static CONFIRMATION: Shell = Shell {
    variant: Variant::Confirmation,
    dismiss: DismissPolicy::BACKDROP.union(DismissPolicy::ESCAPE),
    preset: "scale",
};

pub static VIDEO: Shell = Shell {
    variant: Variant::Video,
    dismiss: DismissPolicy::BACKDROP.union(DismissPolicy::ESCAPE),
    preset: "fade",
};

// Backdrop clicks would throw away typed input.
pub static FORM: Shell = Shell {
    variant: Variant::Form,
    dismiss: DismissPolicy::ESCAPE,
    preset: "slide-up",
};

pub static GALLERY: Shell = Shell {
    variant: Variant::Gallery,
    dismiss: DismissPolicy::all(),
    preset: "fade",
};

pub static NOTIFICATION: Shell = Shell {
    variant: Variant::Notification,
    dismiss: DismissPolicy::ESCAPE.union(DismissPolicy::GESTURE),
    preset: "slide-down",
};

pub static LOADING: Shell = Shell {
    variant: Variant::Loading,
    dismiss: DismissPolicy::PROGRAMMATIC_ONLY,
    preset: "fade",
};

pub static FULLSCREEN: Shell = Shell {
    variant: Variant::Fullscreen,
    dismiss: DismissPolicy::ESCAPE.union(DismissPolicy::GESTURE),
    preset: "slide-up",
};

impl Shell {
    /// The shell for a built-in variant.
    #[must_use]
    pub fn for_variant(variant: &Variant) -> Option<&'static Shell> {
        match variant {
            Variant::Confirmation => Some(&CONFIRMATION),
            Variant::Video => Some(&VIDEO),
            Variant::Form => Some(&FORM),
            Variant::Gallery => Some(&GALLERY),
            Variant::Notification => Some(&NOTIFICATION),
            Variant::Loading => Some(&LOADING),
            Variant::Fullscreen => Some(&FULLSCREEN),
            Variant::Custom(_) => None,
        }
    }

    /// The shell's defaults as open options.
    #[must_use]
    pub fn options(&self) -> OpenOptions {
        OpenOptions::new().dismiss(self.dismiss).preset(self.preset)
    }

    /// Open through the shell. Explicit `options` override its defaults.
    pub fn open<H: Host>(
        &self,
        engine: &mut OverlayEngine<H>,
        props: Props,
        options: OpenOptions,
    ) -> Result<OverlayHandle, OverlayError> {
        engine.open(self.variant.clone(), props, options.or(&self.options()))
    }
}

pub fn confirmation<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    CONFIRMATION.open(engine, props, OpenOptions::new())
}

pub fn video<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    VIDEO.open(engine, props, OpenOptions::new())
}

pub fn form<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    FORM.open(engine, props, OpenOptions::new())
}

pub fn gallery<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    GALLERY.open(engine, props, OpenOptions::new())
}

pub fn notification<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    NOTIFICATION.open(engine, props, OpenOptions::new())
}

pub fn loading<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    LOADING.open(engine, props, OpenOptions::new())
}

pub fn fullscreen<H: Host>(
    engine: &mut OverlayEngine<H>,
    props: Props,
) -> Result<OverlayHandle, OverlayError> {
    FULLSCREEN.open(engine, props, OpenOptions::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrim_core::DismissTrigger;

    #[test]
    fn every_builtin_has_a_shell() {
        for variant in Variant::BUILTIN {
            let shell = Shell::for_variant(&variant).unwrap();
            assert_eq!(shell.variant, variant);
        }
        assert!(Shell::for_variant(&Variant::from("tour")).is_none());
    }

    #[test]
    fn loading_cannot_be_dismissed_by_the_user() {
        for trigger in [
            DismissTrigger::Backdrop,
            DismissTrigger::Escape,
            DismissTrigger::Gesture,
        ] {
            assert!(!LOADING.dismiss.allows(trigger));
        }
    }

    #[test]
    fn explicit_options_win() {
        let merged = OpenOptions::new().preset("none").or(&FORM.options());
        assert_eq!(merged.preset.as_deref(), Some("none"));
        assert_eq!(merged.dismiss, Some(DismissPolicy::ESCAPE));
    }
}
