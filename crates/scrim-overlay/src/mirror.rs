#![forbid(unsafe_code)]

//! Cross-tab mirroring of notification overlays.
//!
//! The bridge publishes this tab's notification opens/closes and turns what
//! other tabs publish into local actions. Local state stays authoritative:
//! only notification-class overlays are mirrored, and a mirrored instance is
//! never re-announced.
//!
//! Delivery is at-least-once, so every inbound message is resolved against
//! a per-`(origin, remote id)` record:
//!
//! - a repeated `Opened` for a live mirror is ignored;
//! - `Closed` leaves a tombstone stamped with its timestamp;
//! - an `Opened` older than (or as old as) a tombstone is ignored, a newer
//!   one reopens. Last write wins.
//!
//! Only the newest [`TOMBSTONE_CAPACITY`] tombstones are kept. An evicted
//! tombstone raises its origin's watermark, and anything from that origin
//! stamped at or below the watermark is treated as stale.

use std::collections::VecDeque;

use ahash::AHashMap;
use scrim_core::{OverlayId, Props, TabId, Variant};
use scrim_runtime::{SyncError, SyncKind, SyncMessage, SyncTransport};

/// Identity of a remote overlay: its origin tab and that tab's id for it.
pub type MirrorKey = (TabId, OverlayId);

/// Tombstones retained before the oldest is folded into a watermark.
pub const TOMBSTONE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Live { local: OverlayId, stamp: u64 },
    Tombstone { stamp: u64 },
}

/// What the engine should do about an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorAction {
    Open {
        key: MirrorKey,
        stamp: u64,
        variant: Variant,
        props: Props,
    },
    Close(OverlayId),
}

pub struct SyncBridge {
    tab: TabId,
    transport: Option<Box<dyn SyncTransport>>,
    entries: AHashMap<MirrorKey, Entry>,
    tombstones: VecDeque<MirrorKey>,
    watermarks: AHashMap<TabId, u64>,
}

impl std::fmt::Debug for SyncBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBridge")
            .field("tab", &self.tab)
            .field("enabled", &self.is_enabled())
            .field("entries", &self.entries.len())
            .field("watermarks", &self.watermarks.len())
            .finish()
    }
}

impl SyncBridge {
    #[must_use]
    pub fn new(tab: TabId, transport: Option<Box<dyn SyncTransport>>) -> Self {
        Self {
            tab,
            transport,
            entries: AHashMap::new(),
            tombstones: VecDeque::new(),
            watermarks: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        self.tab
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Drop the transport; the bridge is local-only from now on.
    pub fn disable(&mut self) {
        if self.transport.take().is_some() {
            tracing::debug!(tab = %self.tab, "cross-tab sync disabled");
        }
    }

    /// Announce a local event. A no-op when disabled.
    pub fn publish(&mut self, kind: SyncKind, timestamp_ms: u64) -> Result<(), SyncError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        let payload = SyncMessage {
            origin: self.tab,
            timestamp_ms,
            kind,
        }
        .encode()?;
        transport.publish(&payload)
    }

    /// Inbound messages from other tabs, oldest first. Undecodable payloads
    /// are logged and skipped.
    pub fn receive(&mut self) -> Result<Vec<SyncMessage>, SyncError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(Vec::new());
        };
        let payloads = transport.drain()?;
        let mut messages = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match SyncMessage::decode(&payload) {
                Ok(message) if message.origin == self.tab => {}
                Ok(message) => messages.push(message),
                Err(e) => tracing::warn!(error = %e, "dropping sync payload"),
            }
        }
        Ok(messages)
    }

    /// Decide what an inbound message means locally.
    pub fn resolve(&mut self, message: SyncMessage) -> Option<MirrorAction> {
        let key = (message.origin, message.remote_id());
        let stamp = message.timestamp_ms;
        if !matches!(self.entries.get(&key), Some(Entry::Live { .. }))
            && self.watermarks.get(&key.0).is_some_and(|mark| stamp <= *mark)
        {
            tracing::trace!(origin = %key.0, remote = %key.1, stamp, "below watermark");
            return None;
        }
        match message.kind {
            SyncKind::Opened { variant, props, .. } => {
                if !variant.is_notification_class() {
                    tracing::trace!(origin = %key.0, %variant, "not mirrored");
                    return None;
                }
                match self.entries.get(&key) {
                    Some(Entry::Live { .. }) => None,
                    Some(Entry::Tombstone { stamp: closed }) if *closed >= stamp => None,
                    _ => Some(MirrorAction::Open {
                        key,
                        stamp,
                        variant,
                        props,
                    }),
                }
            }
            SyncKind::Closed { .. } => match self.entries.get(&key).copied() {
                Some(Entry::Live { local, stamp: opened }) if stamp >= opened => {
                    self.bury(key, stamp);
                    Some(MirrorAction::Close(local))
                }
                Some(Entry::Live { .. }) => None,
                Some(Entry::Tombstone { stamp: closed }) => {
                    self.bury(key, closed.max(stamp));
                    None
                }
                None => {
                    self.bury(key, stamp);
                    None
                }
            },
        }
    }

    /// Record that `key` is now mirrored by the local instance `local`.
    pub fn bind(&mut self, key: MirrorKey, local: OverlayId, stamp: u64) {
        let previous = self.entries.insert(key, Entry::Live { local, stamp });
        if matches!(previous, Some(Entry::Tombstone { .. })) {
            self.tombstones.retain(|k| *k != key);
        }
    }

    /// The local mirror of `key` closed. Later redeliveries of the same
    /// open must not bring it back.
    pub fn forget(&mut self, key: MirrorKey) {
        if let Some(Entry::Live { stamp, .. }) = self.entries.get(&key).copied() {
            self.bury(key, stamp);
        }
    }

    fn bury(&mut self, key: MirrorKey, stamp: u64) {
        let previous = self.entries.insert(key, Entry::Tombstone { stamp });
        if !matches!(previous, Some(Entry::Tombstone { .. })) {
            self.tombstones.push_back(key);
        }
        while self.tombstones.len() > TOMBSTONE_CAPACITY {
            let Some(oldest) = self.tombstones.pop_front() else {
                break;
            };
            if let Some(Entry::Tombstone { stamp }) = self.entries.remove(&oldest) {
                let mark = self.watermarks.entry(oldest.0).or_insert(0);
                *mark = (*mark).max(stamp);
            }
        }
    }
}
