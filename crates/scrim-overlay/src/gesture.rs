#![forbid(unsafe_code)]

//! Drag-to-dismiss gesture recognition.
//!
//! ```text
//! Idle -> Dragging -> Committing   -> Idle
//!                 \-> SnappingBack -> Idle
//! ```
//!
//! The physics are pure functions ([`rubber_band`], [`release_velocity`],
//! [`should_commit`]) so they can be tested without pointer events. The
//! [`GestureController`] holds at most one drag: only the topmost overlay
//! ever receives pointer input, and a second pointer during a drag is a
//! conflict (the first pointer wins).
//!
//! Offsets are measured along the dismiss axis; positive values move toward
//! dismissal.

use scrim_core::{Axis, GestureConfig, OverlayError, OverlayId, Point, PointerId};
use std::collections::VecDeque;
use std::time::Duration;
use web_time::Instant;

/// Samples older than this many windows are discarded while dragging.
const SAMPLE_RETENTION_WINDOWS: u32 = 4;

/// Displayed offset for a raw drag distance.
///
/// Travel is linear up to `elastic_bound`; beyond it the excess is mapped
/// through `(1 - 1 / (x * c / max + 1)) * max`, which approaches `max_overdrag`
/// asymptotically. Drags against the dismiss direction resist from zero.
#[must_use]
pub fn rubber_band(raw: f64, config: &GestureConfig) -> f64 {
    let resist = |excess: f64| -> f64 {
        let max = config.max_overdrag;
        if max <= 0.0 || excess <= 0.0 {
            return 0.0;
        }
        (1.0 - 1.0 / (excess * config.elastic_coefficient / max + 1.0)) * max
    };
    if raw < 0.0 {
        -resist(-raw)
    } else if raw <= config.elastic_bound {
        raw
    } else {
        config.elastic_bound + resist(raw - config.elastic_bound)
    }
}

/// Release velocity in px/s from `(time, raw offset)` samples.
///
/// Only samples within `window` of the newest one count. Fewer than two
/// usable samples, or no elapsed time, gives zero.
#[must_use]
pub fn release_velocity(samples: &[(Instant, f64)], window: Duration) -> f64 {
    let Some(&(t_end, p_end)) = samples.last() else {
        return 0.0;
    };
    let Some(&(t_start, p_start)) = samples
        .iter()
        .find(|(t, _)| t_end.saturating_duration_since(*t) <= window)
    else {
        return 0.0;
    };
    let dt = t_end.saturating_duration_since(t_start).as_secs_f64();
    if dt <= 0.0 {
        return 0.0;
    }
    (p_end - p_start) / dt
}

/// Whether a release dismisses: fast enough, or dragged far enough.
///
/// `raw_offset` is pointer travel before rubber-banding, so the commit
/// distance does not depend on the elastic curve.
#[must_use]
pub fn should_commit(
    raw_offset: f64,
    velocity: f64,
    axis_length: f64,
    config: &GestureConfig,
) -> bool {
    velocity >= config.velocity_threshold || raw_offset >= config.commit_fraction * axis_length
}

/// Lifecycle of one drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    Dragging,
    /// Released past a threshold; the overlay exits from the drag offset.
    Committing,
    /// Released short of both thresholds; the overlay returns to rest.
    SnappingBack,
}

/// Read-only view of the drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    pub overlay: OverlayId,
    pub phase: GesturePhase,
    /// Displayed offset after rubber-banding.
    pub drag_offset: f64,
    /// Current velocity estimate (px/s).
    pub velocity: f64,
    pub elastic_bound: f64,
    pub committed: bool,
}

/// What a release decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureOutcome {
    pub overlay: OverlayId,
    /// `Committing` or `SnappingBack`.
    pub phase: GesturePhase,
    /// Displayed offset at release; exit animations start here.
    pub drag_offset: f64,
    pub velocity: f64,
}

impl GestureOutcome {
    #[must_use]
    pub fn committed(&self) -> bool {
        self.phase == GesturePhase::Committing
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    overlay: OverlayId,
    pointer: PointerId,
    origin: f64,
    raw: f64,
    samples: VecDeque<(Instant, f64)>,
}

impl DragSession {
    fn record(&mut self, now: Instant, raw: f64, window: Duration) {
        self.raw = raw;
        self.samples.push_back((now, raw));
        let keep = window * SAMPLE_RETENTION_WINDOWS;
        while self.samples.len() > 2
            && self
                .samples
                .front()
                .is_some_and(|(t, _)| now.saturating_duration_since(*t) > keep)
        {
            self.samples.pop_front();
        }
    }

    fn velocity(&self, window: Duration) -> f64 {
        let samples: Vec<_> = self.samples.iter().copied().collect();
        release_velocity(&samples, window)
    }
}

/// Single-drag gesture recognizer.
#[derive(Debug, Clone)]
pub struct GestureController {
    axis: Axis,
    session: Option<DragSession>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(Axis::Vertical)
    }
}

impl GestureController {
    #[must_use]
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            session: None,
        }
    }

    #[must_use]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        if self.session.is_some() {
            GesturePhase::Dragging
        } else {
            GesturePhase::Idle
        }
    }

    /// Overlay being dragged, if any.
    #[must_use]
    pub fn dragging(&self) -> Option<OverlayId> {
        self.session.as_ref().map(|s| s.overlay)
    }

    /// Start a drag on `overlay`.
    ///
    /// # Errors
    ///
    /// [`OverlayError::GestureConflict`] when another pointer is already
    /// dragging. The existing drag is untouched.
    pub fn begin(
        &mut self,
        overlay: OverlayId,
        pointer: PointerId,
        position: Point,
        now: Instant,
    ) -> Result<(), OverlayError> {
        if let Some(session) = &self.session {
            if session.pointer == pointer && session.overlay == overlay {
                return Ok(());
            }
            return Err(OverlayError::GestureConflict {
                overlay: session.overlay,
            });
        }
        let origin = position.along(self.axis);
        self.session = Some(DragSession {
            overlay,
            pointer,
            origin,
            raw: 0.0,
            samples: VecDeque::from([(now, 0.0)]),
        });
        Ok(())
    }

    /// Feed a pointer move. Returns the overlay and its displayed offset, or
    /// `None` if the pointer is not the one dragging.
    pub fn drag(
        &mut self,
        pointer: PointerId,
        position: Point,
        now: Instant,
        config: &GestureConfig,
    ) -> Option<(OverlayId, f64)> {
        let axis = self.axis;
        let session = self.session.as_mut().filter(|s| s.pointer == pointer)?;
        let raw = position.along(axis) - session.origin;
        session.record(now, raw, config.velocity_window());
        let shown = rubber_band(raw, config);
        tracing::trace!(overlay = %session.overlay, raw, shown, "drag sample");
        Some((session.overlay, shown))
    }

    /// Finish the drag and decide between commit and snap-back.
    pub fn release(
        &mut self,
        pointer: PointerId,
        position: Point,
        now: Instant,
        axis_length: f64,
        config: &GestureConfig,
    ) -> Option<GestureOutcome> {
        if self.session.as_ref().is_none_or(|s| s.pointer != pointer) {
            return None;
        }
        let mut session = self.session.take()?;
        let raw = position.along(self.axis) - session.origin;
        session.record(now, raw, config.velocity_window());
        let velocity = session.velocity(config.velocity_window());
        let commit = should_commit(raw, velocity, axis_length, config);
        let outcome = GestureOutcome {
            overlay: session.overlay,
            phase: if commit {
                GesturePhase::Committing
            } else {
                GesturePhase::SnappingBack
            },
            drag_offset: if commit { rubber_band(raw, config) } else { 0.0 },
            velocity,
        };
        tracing::debug!(
            overlay = %outcome.overlay,
            raw,
            velocity,
            axis_length,
            committed = commit,
            "drag released"
        );
        Some(outcome)
    }

    /// Abandon the drag for `pointer` (pointer cancel). Snaps back.
    pub fn cancel_pointer(&mut self, pointer: PointerId) -> Option<OverlayId> {
        if self.session.as_ref().is_some_and(|s| s.pointer == pointer) {
            return self.session.take().map(|s| s.overlay);
        }
        None
    }

    /// Abandon any drag on `overlay` (programmatic close). Returns `true`
    /// if one was in progress.
    pub fn cancel_for(&mut self, overlay: OverlayId) -> bool {
        if self.session.as_ref().is_some_and(|s| s.overlay == overlay) {
            self.session = None;
            tracing::debug!(%overlay, "drag cancelled");
            return true;
        }
        false
    }

    /// Snapshot of the drag in progress.
    #[must_use]
    pub fn state(&self, config: &GestureConfig) -> Option<GestureState> {
        let session = self.session.as_ref()?;
        Some(GestureState {
            overlay: session.overlay,
            phase: GesturePhase::Dragging,
            drag_offset: rubber_band(session.raw, config),
            velocity: session.velocity(config.velocity_window()),
            elastic_bound: config.elastic_bound,
            committed: false,
        })
    }
}
