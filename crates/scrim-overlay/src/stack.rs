#![forbid(unsafe_code)]

//! Ordered stack of active overlays with z-index allocation.
//!
//! The stack holds the ids of every instance that is `entering`, `open`, or
//! `exiting`, bottom to top. It knows nothing else about them; records live
//! in the engine's arena.
//!
//! # Invariants
//!
//! - Z-order is strictly increasing: position `i` gets `base + i * step`.
//! - Indices are recomputed after every push and removal, so the invariant
//!   survives out-of-order closes.
//! - Only the top entry receives input.
//!
//! # Failure Modes
//!
//! - `remove()` of an id not on the stack returns `None` (no panic).

use scrim_core::OverlayId;

/// One stacked overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEntry {
    pub id: OverlayId,
    pub z_index: i32,
}

/// Active overlays in z-order (bottom to top).
#[derive(Debug, Clone)]
pub struct OverlayStack {
    entries: Vec<StackEntry>,
    base: i32,
    step: i32,
}

impl Default for OverlayStack {
    fn default() -> Self {
        Self::new(1000, 10)
    }
}

impl OverlayStack {
    /// Create an empty stack. `step` must be positive.
    pub fn new(base: i32, step: i32) -> Self {
        Self {
            entries: Vec::new(),
            base,
            step: step.max(1),
        }
    }

    // --- Stack Operations ---

    /// Push an overlay on top and return its z-index.
    pub fn push(&mut self, id: OverlayId) -> i32 {
        let z_index = self.z_for(self.entries.len());
        self.entries.push(StackEntry { id, z_index });
        z_index
    }

    /// Remove an overlay from any position.
    ///
    /// Entries above it move down one slot and get new z-indices.
    pub fn remove(&mut self, id: OverlayId) -> Option<StackEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        let removed = self.entries.remove(idx);
        self.recompute();
        Some(removed)
    }

    fn recompute(&mut self) {
        for i in 0..self.entries.len() {
            self.entries[i].z_index = self.z_for(i);
        }
    }

    fn z_for(&self, depth: usize) -> i32 {
        let depth = i32::try_from(depth).unwrap_or(i32::MAX);
        self.base.saturating_add(depth.saturating_mul(self.step))
    }

    // --- State Queries ---

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn top_id(&self) -> Option<OverlayId> {
        self.entries.last().map(|e| e.id)
    }

    /// Entries bottom to top.
    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    /// Ids bottom to top.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = OverlayId> + '_ {
        self.entries.iter().map(|e| e.id)
    }
}
