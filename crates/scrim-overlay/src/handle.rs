#![forbid(unsafe_code)]

//! Caller-facing handles and status snapshots.

use crate::engine::OverlayEngine;
use scrim_core::{CloseReason, Host, OverlayId, OverlayStatus, Props, Variant};
use serde::Serialize;

/// Returned by `open()`. Holds only the id; the engine owns the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle {
    id: OverlayId,
}

impl OverlayHandle {
    pub(crate) const fn new(id: OverlayId) -> Self {
        Self { id }
    }

    #[must_use]
    pub const fn id(self) -> OverlayId {
        self.id
    }

    /// Current status, or `None` once the record has been pruned.
    #[must_use]
    pub fn status<H: Host>(self, engine: &OverlayEngine<H>) -> Option<OverlayStatus> {
        engine.status(self.id)
    }

    #[must_use]
    pub fn query<H: Host>(self, engine: &OverlayEngine<H>) -> Option<OverlaySnapshot> {
        engine.query(self.id)
    }

    /// Programmatic close. A no-op unless the overlay is entering or open.
    pub fn close<H: Host>(self, engine: &mut OverlayEngine<H>) {
        engine.close(self.id);
    }

    /// Withdraw the request if it has not been admitted yet.
    pub fn cancel<H: Host>(self, engine: &mut OverlayEngine<H>) -> bool {
        engine.cancel(self.id)
    }
}

impl From<OverlayHandle> for OverlayId {
    fn from(handle: OverlayHandle) -> Self {
        handle.id
    }
}

/// Read-only view of one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub id: OverlayId,
    pub variant: Variant,
    pub status: OverlayStatus,
    /// Assigned while the instance is on the stack.
    pub z_index: Option<i32>,
    /// Wall-clock milliseconds.
    pub opened_at: Option<u64>,
    pub closed_at: Option<u64>,
    pub close_reason: Option<CloseReason>,
    pub props: Props,
}

impl OverlaySnapshot {
    /// Whether the instance can currently be interacted with.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.status == OverlayStatus::Open
    }
}
