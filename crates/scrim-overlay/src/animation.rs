#![forbid(unsafe_code)]

//! Animation orchestrator: at most one enter/exit transition in flight.
//!
//! The orchestrator asks the host to render a transition and then decides
//! when it has settled:
//!
//! | Ack | Settles when | Error |
//! |-----|--------------|-------|
//! | `Immediate` | at once | none |
//! | `Timed` | preset duration elapsed (checked on `poll`) | none |
//! | `Callback` | host calls `finish`, or duration + timeout | `AnimationTimeout` on timeout |
//!
//! Zero-length presets and reduced motion settle at once whatever the ack.
//! A settle is reported exactly once; a late `finish` for a transition that
//! already settled is ignored.

use scrim_core::{AnimationPreset, Host, OverlayId, TransitionAck, TransitionPhase};
use std::time::Duration;
use web_time::Instant;

/// A transition that reached its end state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub overlay: OverlayId,
    pub phase: TransitionPhase,
    /// Forced by the timeout rather than reported by the host.
    pub timed_out: bool,
}

/// Result of starting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Started {
    /// Already settled; no transition is in flight.
    Settled(Settled),
    /// In flight; the orchestrator is busy until it settles.
    Running,
}

/// Read-only view of the transition in flight, for renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionView {
    pub overlay: OverlayId,
    pub phase: TransitionPhase,
    pub preset: String,
    /// Linear progress in `[0, 1]`.
    pub progress: f64,
    /// Progress through the preset's easing curve.
    pub eased_progress: f64,
    /// Drag offset the transition starts from (gesture exits only).
    pub from_offset: f64,
}

#[derive(Debug, Clone)]
struct Active {
    overlay: OverlayId,
    phase: TransitionPhase,
    preset: AnimationPreset,
    ack: TransitionAck,
    started: Instant,
    from_offset: f64,
}

impl Active {
    fn duration(&self) -> Duration {
        self.preset.duration(self.phase)
    }
}

/// Sequencer for enter/exit transitions.
#[derive(Debug, Default)]
pub struct AnimationOrchestrator {
    active: Option<Active>,
}

impl AnimationOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transition is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Overlay whose transition is in flight.
    #[must_use]
    pub fn current(&self) -> Option<OverlayId> {
        self.active.as_ref().map(|a| a.overlay)
    }

    /// Begin a transition. Must not be called while busy.
    pub fn start(
        &mut self,
        host: &mut impl Host,
        overlay: OverlayId,
        phase: TransitionPhase,
        preset: &AnimationPreset,
        from_offset: f64,
        reduced_motion: bool,
        now: Instant,
    ) -> Started {
        debug_assert!(self.active.is_none(), "overlapping transitions");
        let ack = host.start_transition(overlay, phase, preset);
        let instant = reduced_motion || preset.is_instant(phase) || ack == TransitionAck::Immediate;
        tracing::debug!(
            %overlay,
            ?phase,
            preset = %preset.name,
            ?ack,
            instant,
            "transition started"
        );
        if instant {
            return Started::Settled(Settled {
                overlay,
                phase,
                timed_out: false,
            });
        }
        self.active = Some(Active {
            overlay,
            phase,
            preset: preset.clone(),
            ack,
            started: now,
            from_offset,
        });
        Started::Running
    }

    /// Settle the in-flight transition if its time is up.
    ///
    /// `timeout` is the grace period a `Callback` transition gets beyond its
    /// preset duration.
    pub fn poll(&mut self, now: Instant, timeout: Duration) -> Option<Settled> {
        let active = self.active.as_ref()?;
        let elapsed = now.saturating_duration_since(active.started);
        let timed_out = match active.ack {
            TransitionAck::Timed | TransitionAck::Immediate => {
                if elapsed < active.duration() {
                    return None;
                }
                false
            }
            TransitionAck::Callback => {
                if elapsed < active.duration() + timeout {
                    return None;
                }
                true
            }
        };
        self.settle(timed_out)
    }

    /// Host reports the transition for `overlay` finished.
    pub fn finish(&mut self, overlay: OverlayId) -> Option<Settled> {
        if self.current() != Some(overlay) {
            tracing::trace!(%overlay, "stale transition completion ignored");
            return None;
        }
        self.settle(false)
    }

    fn settle(&mut self, timed_out: bool) -> Option<Settled> {
        let active = self.active.take()?;
        Some(Settled {
            overlay: active.overlay,
            phase: active.phase,
            timed_out,
        })
    }

    /// Latest instant at which the in-flight transition will settle.
    #[must_use]
    pub fn deadline(&self, timeout: Duration) -> Option<Instant> {
        let active = self.active.as_ref()?;
        let grace = if active.ack == TransitionAck::Callback {
            timeout
        } else {
            Duration::ZERO
        };
        Some(active.started + active.duration() + grace)
    }

    /// Progress of the in-flight transition.
    #[must_use]
    pub fn view(&self, now: Instant) -> Option<TransitionView> {
        let active = self.active.as_ref()?;
        let total = active.duration().as_secs_f64();
        let progress = if total <= 0.0 {
            1.0
        } else {
            (now.saturating_duration_since(active.started).as_secs_f64() / total).clamp(0.0, 1.0)
        };
        Some(TransitionView {
            overlay: active.overlay,
            phase: active.phase,
            preset: active.preset.name.clone(),
            progress,
            eased_progress: active.preset.easing.apply(progress),
            from_offset: active.from_offset,
        })
    }
}
