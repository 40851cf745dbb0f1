#![forbid(unsafe_code)]

//! Engine configuration and per-call open options.
//!
//! # Sources
//!
//! `OverlayConfig` is plain data with serde support, so it can be embedded in
//! an application's own settings or loaded directly from TOML/JSON. Every key
//! is optional; missing keys take the documented defaults.
//!
//! ```
//! use scrim_core::config::{OverlayConfig, QueuePolicy};
//!
//! let config = OverlayConfig::from_toml_str(
//!     r#"
//!     baseZIndex = 2000
//!     queuePolicy = "serial"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.base_z_index, 2000);
//! assert_eq!(config.queue_policy, QueuePolicy::Serial);
//! assert_eq!(config.z_index_step, 10);
//! ```

use crate::dismiss::DismissPolicy;
use crate::error::OverlayError;
use crate::id::{ElementId, PortalKey};
use crate::preset::PresetTable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission rule for `open()` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Admit while the stack is below `max_stack_depth`; queue otherwise.
    #[default]
    Immediate,
    /// Admit one at a time; everything else waits in FIFO order.
    Serial,
    /// Like `Immediate`, but a request whose dedupe key is already queued or
    /// open collapses into the existing instance.
    Dedupe,
}

/// Drag-to-dismiss tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    pub enabled: bool,
    /// Linear drag distance (px) before resistance kicks in.
    pub elastic_bound: f64,
    /// Rubber-band factor in `(0, 1]`; smaller feels stiffer.
    pub elastic_coefficient: f64,
    /// Asymptotic travel (px) allowed past the elastic bound.
    pub max_overdrag: f64,
    /// Release velocity (px/s) that commits a dismissal on its own.
    pub velocity_threshold: f64,
    /// Fraction of the dismiss-axis length that commits a dismissal.
    pub commit_fraction: f64,
    /// Only samples this recent (ms) contribute to release velocity.
    pub velocity_window_ms: u64,
    /// Axis length used when the host cannot measure the overlay.
    pub fallback_axis_length: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            elastic_bound: 120.0,
            elastic_coefficient: 0.55,
            max_overdrag: 80.0,
            velocity_threshold: 900.0,
            commit_fraction: 0.35,
            velocity_window_ms: 100,
            fallback_axis_length: 600.0,
        }
    }
}

impl GestureConfig {
    #[must_use]
    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    pub base_z_index: i32,
    pub z_index_step: i32,
    pub dismiss_on_backdrop_click: bool,
    pub dismiss_on_escape: bool,
    #[serde(rename = "gestureDismiss")]
    pub gesture: GestureConfig,
    pub animation_preset: String,
    pub queue_policy: QueuePolicy,
    pub max_stack_depth: usize,
    pub sync_across_tabs: bool,
    /// Overflow guard: pending requests beyond this are dropped.
    pub queue_capacity: usize,
    /// Dedupe hits replace the existing entry's props.
    pub refresh_on_dedupe: bool,
    /// Grace period after a preset's duration before a transition is
    /// force-settled.
    pub animation_timeout_ms: u64,
    /// Default auto-dismiss for notification overlays; 0 disables.
    pub notification_auto_dismiss_ms: u64,
    /// Settle every transition immediately.
    pub reduced_motion: bool,
    /// Closed records kept around for `query`.
    pub closed_history: usize,
    /// Session id used to key persisted overlays. `None` disables persistence.
    pub session_id: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            base_z_index: 1000,
            z_index_step: 10,
            dismiss_on_backdrop_click: true,
            dismiss_on_escape: true,
            gesture: GestureConfig::default(),
            animation_preset: "fade".to_owned(),
            queue_policy: QueuePolicy::Immediate,
            max_stack_depth: 4,
            sync_across_tabs: false,
            queue_capacity: 16,
            refresh_on_dedupe: true,
            animation_timeout_ms: 1000,
            notification_auto_dismiss_ms: 5000,
            reduced_motion: false,
            closed_history: 64,
            session_id: None,
        }
    }
}

impl OverlayConfig {
    /// Parse a TOML document. Unknown keys are ignored.
    pub fn from_toml_str(source: &str) -> Result<Self, OverlayError> {
        toml::from_str(source).map_err(|e| OverlayError::InvalidArgument(format!("config: {e}")))
    }

    /// Parse a JSON document. Unknown keys are ignored.
    pub fn from_json_str(source: &str) -> Result<Self, OverlayError> {
        serde_json::from_str(source)
            .map_err(|e| OverlayError::InvalidArgument(format!("config: {e}")))
    }

    pub fn base_z_index(mut self, value: i32) -> Self {
        self.base_z_index = value;
        self
    }

    pub fn z_index_step(mut self, value: i32) -> Self {
        self.z_index_step = value;
        self
    }

    pub fn queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = policy;
        self
    }

    pub fn max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn animation_preset(mut self, name: impl Into<String>) -> Self {
        self.animation_preset = name.into();
        self
    }

    pub fn sync_across_tabs(mut self, enabled: bool) -> Self {
        self.sync_across_tabs = enabled;
        self
    }

    pub fn reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn gesture(mut self, gesture: GestureConfig) -> Self {
        self.gesture = gesture;
        self
    }

    #[must_use]
    pub fn animation_timeout(&self) -> Duration {
        Duration::from_millis(self.animation_timeout_ms)
    }

    /// Auto-dismiss delay for notifications, if enabled.
    #[must_use]
    pub fn notification_auto_dismiss(&self) -> Option<Duration> {
        (self.notification_auto_dismiss_ms > 0)
            .then(|| Duration::from_millis(self.notification_auto_dismiss_ms))
    }

    /// Check the configuration against the built-in presets.
    pub fn validate(&self) -> Result<(), OverlayError> {
        self.validate_with(&PresetTable::builtin())
    }

    /// Check the configuration against a preset table.
    ///
    /// # Errors
    ///
    /// [`OverlayError::InvalidArgument`] naming the first offending option.
    pub fn validate_with(&self, presets: &PresetTable) -> Result<(), OverlayError> {
        let invalid = |msg: String| Err(OverlayError::InvalidArgument(msg));
        if self.z_index_step <= 0 {
            return invalid(format!("zIndexStep must be positive, got {}", self.z_index_step));
        }
        if self.max_stack_depth == 0 {
            return invalid("maxStackDepth must be at least 1".to_owned());
        }
        // A closed instance must stay queryable at least until the next close.
        if self.closed_history == 0 {
            return invalid("closedHistory must be at least 1".to_owned());
        }
        if !presets.contains(&self.animation_preset) {
            return invalid(format!("unknown animation preset '{}'", self.animation_preset));
        }
        let g = &self.gesture;
        if !(g.commit_fraction > 0.0 && g.commit_fraction <= 1.0) {
            return invalid(format!(
                "gestureDismiss.commitFraction must be in (0, 1], got {}",
                g.commit_fraction
            ));
        }
        if !(g.elastic_coefficient > 0.0 && g.elastic_coefficient <= 1.0) {
            return invalid(format!(
                "gestureDismiss.elasticCoefficient must be in (0, 1], got {}",
                g.elastic_coefficient
            ));
        }
        if !(g.velocity_threshold > 0.0) {
            return invalid("gestureDismiss.velocityThreshold must be positive".to_owned());
        }
        if g.elastic_bound < 0.0 || g.max_overdrag < 0.0 || !(g.fallback_axis_length > 0.0) {
            return invalid("gestureDismiss distances must be non-negative".to_owned());
        }
        Ok(())
    }
}

/// Per-call overrides for `open()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenOptions {
    pub dismiss: Option<DismissPolicy>,
    pub preset: Option<String>,
    pub queue_policy: Option<QueuePolicy>,
    /// Higher priorities are admitted first and dropped last.
    pub priority: i32,
    pub dedupe_key: Option<String>,
    /// Element to return focus to on close. Defaults to the element focused
    /// when the overlay starts entering.
    pub trigger: Option<ElementId>,
    pub portal: Option<PortalKey>,
    /// `Some(Duration::ZERO)` disables auto-dismiss for this overlay.
    pub auto_dismiss: Option<Duration>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(mut self, policy: DismissPolicy) -> Self {
        self.dismiss = Some(policy);
        self
    }

    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    pub fn queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = Some(policy);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    pub fn trigger(mut self, element: ElementId) -> Self {
        self.trigger = Some(element);
        self
    }

    pub fn portal(mut self, key: PortalKey) -> Self {
        self.portal = Some(key);
        self
    }

    pub fn auto_dismiss(mut self, after: Duration) -> Self {
        self.auto_dismiss = Some(after);
        self
    }

    /// Fill unset fields from `defaults` (used by the variant shells).
    #[must_use]
    pub fn or(mut self, defaults: &OpenOptions) -> Self {
        if self.dismiss.is_none() {
            self.dismiss = defaults.dismiss;
        }
        if self.preset.is_none() {
            self.preset.clone_from(&defaults.preset);
        }
        if self.queue_policy.is_none() {
            self.queue_policy = defaults.queue_policy;
        }
        if self.dedupe_key.is_none() {
            self.dedupe_key.clone_from(&defaults.dedupe_key);
        }
        if self.auto_dismiss.is_none() {
            self.auto_dismiss = defaults.auto_dismiss;
        }
        if self.portal.is_none() {
            self.portal.clone_from(&defaults.portal);
        }
        self
    }
}
