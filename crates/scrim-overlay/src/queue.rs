#![forbid(unsafe_code)]

//! Queue scheduler: admission policy and the pending-request queue.
//!
//! Requests wait here until [`admits`] lets the head through. Order is
//! highest priority first, then first come first served. The overflow guard
//! drops the lowest-priority, most recent entries beyond the cap.
//!
//! Request payloads stay in the engine's arena; the queue only orders ids.

use scrim_core::{OverlayId, QueuePolicy};

/// One waiting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: OverlayId,
    pub priority: i32,
    pub policy: QueuePolicy,
}

/// Whether a request under `policy` may be admitted now.
///
/// `active` counts stacked instances; `pending` counts admitted requests
/// still waiting for their enter transition to start.
#[must_use]
pub fn admits(policy: QueuePolicy, active: usize, pending: usize, max_depth: usize) -> bool {
    match policy {
        QueuePolicy::Serial => active == 0 && pending == 0,
        QueuePolicy::Immediate | QueuePolicy::Dedupe => active + pending < max_depth,
    }
}

#[derive(Debug, Default)]
pub struct QueueScheduler {
    entries: Vec<QueueEntry>,
}

impl QueueScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a request in priority order.
    pub fn push(&mut self, id: OverlayId, priority: i32, policy: QueuePolicy) {
        let entry = QueueEntry {
            id,
            priority,
            policy,
        };
        // Insert after every entry of equal or higher priority.
        let at = self
            .entries
            .iter()
            .position(|e| e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
    }

    /// Drop entries beyond `capacity`, lowest priority and newest first.
    /// Returns the dropped ids.
    pub fn enforce_capacity(&mut self, capacity: usize) -> Vec<OverlayId> {
        let mut dropped = Vec::new();
        while self.entries.len() > capacity {
            // The tail is the lowest priority; among equals, the newest.
            if let Some(entry) = self.entries.pop() {
                dropped.push(entry.id);
            }
        }
        dropped
    }

    #[must_use]
    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.first()
    }

    pub fn pop_head(&mut self) -> Option<QueueEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// Withdraw a request. Returns `true` if it was queued.
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Empty the queue, returning ids in admission order.
    pub fn drain(&mut self) -> Vec<OverlayId> {
        self.entries.drain(..).map(|e| e.id).collect()
    }

    /// Queued ids in admission order.
    pub fn ids(&self) -> impl Iterator<Item = OverlayId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(n: u64) -> OverlayId {
        OverlayId::from_raw(n)
    }

    #[test]
    fn admission_rules() {
        assert!(admits(QueuePolicy::Immediate, 1, 0, 2));
        assert!(!admits(QueuePolicy::Immediate, 1, 1, 2));
        assert!(admits(QueuePolicy::Dedupe, 0, 0, 1));
        assert!(admits(QueuePolicy::Serial, 0, 0, 4));
        assert!(!admits(QueuePolicy::Serial, 1, 0, 4));
        assert!(!admits(QueuePolicy::Serial, 0, 1, 4));
    }

    #[test]
    fn fifo_within_priority() {
        let mut q = QueueScheduler::new();
        q.push(id(1), 0, QueuePolicy::Serial);
        q.push(id(2), 0, QueuePolicy::Serial);
        q.push(id(3), 0, QueuePolicy::Serial);
        assert_eq!(q.ids().collect::<Vec<_>>(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn higher_priority_jumps_ahead() {
        let mut q = QueueScheduler::new();
        q.push(id(1), 0, QueuePolicy::Immediate);
        q.push(id(2), 5, QueuePolicy::Immediate);
        q.push(id(3), 5, QueuePolicy::Immediate);
        q.push(id(4), -1, QueuePolicy::Immediate);
        assert_eq!(q.ids().collect::<Vec<_>>(), vec![id(2), id(3), id(1), id(4)]);
        assert_eq!(q.pop_head().map(|e| e.id), Some(id(2)));
    }

    #[test]
    fn overflow_drops_lowest_priority_newest() {
        let mut q = QueueScheduler::new();
        q.push(id(1), 1, QueuePolicy::Immediate);
        q.push(id(2), 0, QueuePolicy::Immediate);
        q.push(id(3), 0, QueuePolicy::Immediate);
        q.push(id(4), 2, QueuePolicy::Immediate);
        let dropped = q.enforce_capacity(2);
        assert_eq!(dropped, vec![id(3), id(2)]);
        assert_eq!(q.ids().collect::<Vec<_>>(), vec![id(4), id(1)]);
    }

    #[test]
    fn remove_and_drain() {
        let mut q = QueueScheduler::new();
        q.push(id(1), 0, QueuePolicy::Immediate);
        q.push(id(2), 0, QueuePolicy::Immediate);
        assert!(q.remove(id(1)));
        assert!(!q.remove(id(1)));
        assert_eq!(q.drain(), vec![id(2)]);
        assert!(q.is_empty());
    }

    proptest! {
        #[test]
        fn order_is_priority_then_fifo(prios in proptest::collection::vec(-3i32..3, 0..40)) {
            let mut q = QueueScheduler::new();
            for (i, p) in prios.iter().enumerate() {
                q.push(id(i as u64), *p, QueuePolicy::Immediate);
            }
            let order: Vec<(i32, u64)> =
                q.ids().map(|x| (prios[x.get() as usize], x.get())).collect();
            for w in order.windows(2) {
                prop_assert!(w[0].0 > w[1].0 || (w[0].0 == w[1].0 && w[0].1 < w[1].1));
            }
        }

        #[test]
        fn capacity_is_respected(n in 0usize..40, cap in 0usize..20) {
            let mut q = QueueScheduler::new();
            for i in 0..n {
                q.push(id(i as u64), (i % 3) as i32, QueuePolicy::Immediate);
            }
            let dropped = q.enforce_capacity(cap);
            prop_assert_eq!(q.len(), n.min(cap));
            prop_assert_eq!(dropped.len(), n.saturating_sub(cap));
        }
    }
}
