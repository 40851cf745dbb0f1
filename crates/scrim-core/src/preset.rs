#![forbid(unsafe_code)]

//! Named enter/exit transition presets.
//!
//! A preset only fixes timing and an easing curve. How opacity or position is
//! interpolated from the eased progress is up to the host renderer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Preset used when a gesture commits a dismissal.
pub const GESTURE_DISMISS_PRESET: &str = "gesture-dismiss";

/// Preset that settles instantly.
pub const NO_ANIMATION_PRESET: &str = "none";

/// Which half of the lifecycle a transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    Enter,
    Exit,
}

/// Easing curves for transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    EaseOut,
    EaseInOut,
    /// Slight overshoot past 1.0 before settling.
    EaseOutBack,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseOutBack => {
                const C1: f64 = 1.701_58;
                const C3: f64 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
        }
    }
}

/// Timing and easing for one named transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPreset {
    pub name: String,
    #[serde(with = "millis")]
    pub enter: Duration,
    #[serde(with = "millis")]
    pub exit: Duration,
    #[serde(default)]
    pub easing: Easing,
}

impl AnimationPreset {
    pub fn new(name: impl Into<String>, enter: Duration, exit: Duration, easing: Easing) -> Self {
        Self {
            name: name.into(),
            enter,
            exit,
            easing,
        }
    }

    /// Duration of the given phase.
    #[must_use]
    pub fn duration(&self, phase: TransitionPhase) -> Duration {
        match phase {
            TransitionPhase::Enter => self.enter,
            TransitionPhase::Exit => self.exit,
        }
    }

    /// Whether the given phase settles without waiting.
    #[must_use]
    pub fn is_instant(&self, phase: TransitionPhase) -> bool {
        self.duration(phase).is_zero()
    }
}

/// Registry of named presets.
#[derive(Debug, Clone)]
pub struct PresetTable {
    presets: BTreeMap<String, AnimationPreset>,
}

impl PresetTable {
    /// Table with the built-in presets.
    #[must_use]
    pub fn builtin() -> Self {
        let ms = Duration::from_millis;
        let mut table = Self {
            presets: BTreeMap::new(),
        };
        for preset in [
            AnimationPreset::new(NO_ANIMATION_PRESET, ms(0), ms(0), Easing::Linear),
            AnimationPreset::new("fade", ms(150), ms(120), Easing::EaseOut),
            AnimationPreset::new("scale", ms(200), ms(150), Easing::EaseOutBack),
            AnimationPreset::new("slide-up", ms(240), ms(200), Easing::EaseInOut),
            AnimationPreset::new("slide-down", ms(240), ms(200), Easing::EaseInOut),
            AnimationPreset::new(GESTURE_DISMISS_PRESET, ms(0), ms(180), Easing::EaseOut),
        ] {
            table.insert(preset);
        }
        table
    }

    /// Register (or replace) a preset.
    pub fn insert(&mut self, preset: AnimationPreset) {
        self.presets.insert(preset.name.clone(), preset);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AnimationPreset> {
        self.presets.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Preset names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
