#![forbid(unsafe_code)]

//! Analytics recorder.
//!
//! Records per-instance timings, the dismiss trigger, and every reported
//! error, and keeps running aggregates. It only observes: nothing in the
//! engine reads it to make a decision.
//!
//! Time to mount runs from the `open()` call to the instance becoming
//! interactive (`open`), so it includes any time spent queued.

use ahash::AHashMap;
use scrim_core::{DismissTrigger, OverlayError, OverlayErrorKind, OverlayId, Variant};
use serde::Serialize;
use std::time::Duration;
use web_time::Instant;

/// What the recorder knows about one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceMetrics {
    pub variant: Variant,
    pub requested_at: Instant,
    pub opened_at: Option<Instant>,
    pub closed_at: Option<Instant>,
    pub time_to_mount: Option<Duration>,
    pub open_duration: Option<Duration>,
    pub dismiss_trigger: Option<DismissTrigger>,
    pub errors: Vec<OverlayErrorKind>,
}

/// Aggregated counts and durations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub requested: u64,
    pub opened: u64,
    pub closed: u64,
    /// Indexed by [`DismissTrigger::index`].
    pub dismissals: [u64; 6],
    /// Indexed by [`OverlayErrorKind::index`].
    pub errors: [u64; 6],
    pub total_time_to_mount: Duration,
    pub total_open_time: Duration,
}

impl AnalyticsSummary {
    #[must_use]
    pub fn dismissals_by(&self, trigger: DismissTrigger) -> u64 {
        self.dismissals[trigger.index()]
    }

    #[must_use]
    pub fn errors_of(&self, kind: OverlayErrorKind) -> u64 {
        self.errors[kind.index()]
    }

    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.errors.iter().sum()
    }

    #[must_use]
    pub fn mean_time_to_mount(&self) -> Option<Duration> {
        mean(self.total_time_to_mount, self.opened)
    }

    /// Mean time spent open across instances that have closed.
    #[must_use]
    pub fn mean_open_time(&self) -> Option<Duration> {
        let dismissed: u64 = self.dismissals.iter().sum();
        mean(self.total_open_time, dismissed)
    }
}

fn mean(total: Duration, count: u64) -> Option<Duration> {
    let count = u32::try_from(count).ok().filter(|c| *c > 0)?;
    Some(total / count)
}

#[derive(Debug, Default)]
pub struct AnalyticsRecorder {
    instances: AHashMap<OverlayId, InstanceMetrics>,
    summary: AnalyticsSummary,
}

impl AnalyticsRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&mut self, id: OverlayId, variant: Variant, now: Instant) {
        self.summary.requested += 1;
        self.instances.insert(
            id,
            InstanceMetrics {
                variant,
                requested_at: now,
                opened_at: None,
                closed_at: None,
                time_to_mount: None,
                open_duration: None,
                dismiss_trigger: None,
                errors: Vec::new(),
            },
        );
    }

    pub fn opened(&mut self, id: OverlayId, now: Instant) {
        let Some(m) = self.instances.get_mut(&id) else {
            return;
        };
        let ttm = now.saturating_duration_since(m.requested_at);
        m.opened_at = Some(now);
        m.time_to_mount = Some(ttm);
        self.summary.opened += 1;
        self.summary.total_time_to_mount += ttm;
    }

    /// Close of `id`. `trigger` is `None` for closes that were not
    /// dismissals (cancelled, dropped, failed to mount).
    pub fn closed(&mut self, id: OverlayId, trigger: Option<DismissTrigger>, now: Instant) {
        let Some(m) = self.instances.get_mut(&id) else {
            return;
        };
        m.closed_at = Some(now);
        m.dismiss_trigger = trigger;
        self.summary.closed += 1;
        if let Some(trigger) = trigger {
            self.summary.dismissals[trigger.index()] += 1;
            if let Some(opened) = m.opened_at {
                let open_for = now.saturating_duration_since(opened);
                m.open_duration = Some(open_for);
                self.summary.total_open_time += open_for;
            }
        }
    }

    /// Log and count a runtime error.
    pub fn error(&mut self, error: &OverlayError) {
        tracing::warn!(kind = %error.kind(), overlay = ?error.overlay(), "{error}");
        self.summary.errors[error.kind().index()] += 1;
        if let Some(m) = error.overlay().and_then(|id| self.instances.get_mut(&id)) {
            m.errors.push(error.kind());
        }
    }

    #[must_use]
    pub fn instance(&self, id: OverlayId) -> Option<&InstanceMetrics> {
        self.instances.get(&id)
    }

    /// Drop per-instance data; aggregates are kept.
    pub fn forget(&mut self, id: OverlayId) {
        self.instances.remove(&id);
    }

    #[must_use]
    pub fn summary(&self) -> &AnalyticsSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrim_core::TransitionPhase;
    use tracing_test::traced_test;

    fn id(n: u64) -> OverlayId {
        OverlayId::from_raw(n)
    }

    #[test]
    fn timings_and_trigger() {
        let mut rec = AnalyticsRecorder::new();
        let t0 = Instant::now();
        rec.requested(id(1), Variant::Confirmation, t0);
        rec.opened(id(1), t0 + Duration::from_millis(200));
        rec.closed(id(1), Some(DismissTrigger::Escape), t0 + Duration::from_millis(1200));

        let m = rec.instance(id(1)).unwrap();
        assert_eq!(m.time_to_mount, Some(Duration::from_millis(200)));
        assert_eq!(m.open_duration, Some(Duration::from_millis(1000)));
        assert_eq!(m.dismiss_trigger, Some(DismissTrigger::Escape));

        let s = rec.summary();
        assert_eq!(s.dismissals_by(DismissTrigger::Escape), 1);
        assert_eq!(s.mean_time_to_mount(), Some(Duration::from_millis(200)));
        assert_eq!(s.mean_open_time(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn non_dismissal_close_has_no_trigger() {
        let mut rec = AnalyticsRecorder::new();
        let t0 = Instant::now();
        rec.requested(id(2), Variant::Loading, t0);
        rec.closed(id(2), None, t0);
        assert_eq!(rec.summary().closed, 1);
        assert_eq!(rec.summary().dismissals.iter().sum::<u64>(), 0);
        assert_eq!(rec.summary().mean_open_time(), None);
    }

    #[traced_test]
    #[test]
    fn errors_are_counted_and_logged() {
        let mut rec = AnalyticsRecorder::new();
        rec.requested(id(3), Variant::Video, Instant::now());
        rec.error(&OverlayError::AnimationTimeout {
            overlay: id(3),
            phase: TransitionPhase::Enter,
        });
        rec.error(&OverlayError::SyncChannel("closed".into()));

        let s = rec.summary();
        assert_eq!(s.errors_of(OverlayErrorKind::AnimationTimeout), 1);
        assert_eq!(s.errors_of(OverlayErrorKind::SyncChannel), 1);
        assert_eq!(s.total_errors(), 2);
        assert_eq!(
            rec.instance(id(3)).unwrap().errors,
            vec![OverlayErrorKind::AnimationTimeout]
        );
        assert!(logs_contain("enter transition of overlay#3 timed out"));
    }

    #[test]
    fn forget_keeps_aggregates() {
        let mut rec = AnalyticsRecorder::new();
        rec.requested(id(4), Variant::Form, Instant::now());
        rec.forget(id(4));
        assert!(rec.instance(id(4)).is_none());
        assert_eq!(rec.summary().requested, 1);
    }
}
