#![forbid(unsafe_code)]

//! Per-instance deadline timers (notification auto-dismiss).
//!
//! At most one timer per overlay. Timers are cleared when the overlay
//! starts closing, so a fired timer always refers to a live instance.

use ahash::AHashMap;
use scrim_core::OverlayId;
use web_time::Instant;

#[derive(Debug, Default)]
pub struct Timers {
    deadlines: AHashMap<OverlayId, Instant>,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the deadline for `id`.
    pub fn arm(&mut self, id: OverlayId, at: Instant) {
        self.deadlines.insert(id, at);
    }

    /// Returns `true` if a timer was pending.
    pub fn clear(&mut self, id: OverlayId) -> bool {
        self.deadlines.remove(&id).is_some()
    }

    #[must_use]
    pub fn deadline(&self, id: OverlayId) -> Option<Instant> {
        self.deadlines.get(&id).copied()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<OverlayId> {
        let mut due: Vec<(Instant, OverlayId)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (*at, *id))
            .collect();
        due.sort();
        for (_, id) in &due {
            self.deadlines.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn due_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let (a, b, c) = (
            OverlayId::from_raw(1),
            OverlayId::from_raw(2),
            OverlayId::from_raw(3),
        );
        timers.arm(a, t0 + Duration::from_millis(300));
        timers.arm(b, t0 + Duration::from_millis(100));
        timers.arm(c, t0 + Duration::from_millis(900));

        assert!(timers.take_due(t0).is_empty());
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(100)));
        assert_eq!(timers.take_due(t0 + Duration::from_millis(500)), vec![b, a]);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn clear_cancels() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let id = OverlayId::from_raw(1);
        timers.arm(id, t0);
        assert!(timers.clear(id));
        assert!(!timers.clear(id));
        assert!(timers.take_due(t0).is_empty());
    }
}
