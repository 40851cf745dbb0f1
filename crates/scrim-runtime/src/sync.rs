#![forbid(unsafe_code)]

//! Cross-tab message passing.
//!
//! Tabs never share memory. Each one publishes JSON-encoded [`SyncMessage`]s
//! through a [`SyncTransport`] and drains what its peers published. Delivery
//! is at-least-once; receivers must be idempotent.
//!
//! [`BroadcastHub`] is the in-process transport: every [`HubPort`] created
//! from one hub hears everything the other ports publish, never its own
//! messages. A browser binding would implement [`SyncTransport`] over a
//! broadcast channel instead.

use scrim_core::{OverlayId, Props, TabId, Variant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

/// One announcement from a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    pub origin: TabId,
    /// Wall-clock milliseconds at the origin; larger wins on conflict.
    pub timestamp_ms: u64,
    pub kind: SyncKind,
}

/// What happened at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SyncKind {
    #[serde(rename_all = "camelCase")]
    Opened {
        remote_id: OverlayId,
        variant: Variant,
        props: Props,
    },
    #[serde(rename_all = "camelCase")]
    Closed { remote_id: OverlayId },
}

impl SyncMessage {
    /// The origin-local overlay id this message is about.
    #[must_use]
    pub fn remote_id(&self) -> OverlayId {
        match &self.kind {
            SyncKind::Opened { remote_id, .. } | SyncKind::Closed { remote_id } => *remote_id,
        }
    }

    pub fn encode(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::Malformed(e.to_string()))
    }

    pub fn decode(payload: &str) -> Result<Self, SyncError> {
        serde_json::from_str(payload).map_err(|e| SyncError::Malformed(e.to_string()))
    }
}

/// Transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No channel exists in this environment.
    Unavailable,
    /// The channel was shut down.
    Closed,
    /// A payload could not be encoded or decoded.
    Malformed(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "broadcast channel unavailable"),
            Self::Closed => write!(f, "broadcast channel closed"),
            Self::Malformed(msg) => write!(f, "malformed sync payload: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}

/// Publish/subscribe endpoint for one tab.
pub trait SyncTransport {
    /// Send `payload` to every other tab.
    fn publish(&mut self, payload: &str) -> Result<(), SyncError>;

    /// Take every payload received since the last drain, oldest first.
    fn drain(&mut self) -> Result<Vec<String>, SyncError>;
}

/// Transport for environments without a broadcast channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl SyncTransport for Unavailable {
    fn publish(&mut self, _payload: &str) -> Result<(), SyncError> {
        Err(SyncError::Unavailable)
    }

    fn drain(&mut self) -> Result<Vec<String>, SyncError> {
        Err(SyncError::Unavailable)
    }
}

#[derive(Debug, Default)]
struct HubState {
    peers: Vec<(u64, Sender<String>)>,
}

#[derive(Debug, Default)]
struct HubShared {
    state: Mutex<HubState>,
    closed: AtomicBool,
    next_port: AtomicU64,
}

/// In-process broadcast channel connecting any number of ports.
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    shared: Arc<HubShared>,
}

impl BroadcastHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the hub as a new tab.
    pub fn port(&self) -> HubPort {
        let id = self.shared.next_port.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();
        if let Ok(mut state) = self.shared.state.lock() {
            state.peers.push((id, tx));
        }
        HubPort {
            id,
            shared: Arc::clone(&self.shared),
            rx,
        }
    }

    /// Close the channel; every port fails from now on.
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Ok(mut state) = self.shared.state.lock() {
            state.peers.clear();
        }
    }

    #[must_use]
    pub fn port_count(&self) -> usize {
        self.shared.state.lock().map(|s| s.peers.len()).unwrap_or(0)
    }
}

/// One tab's end of a [`BroadcastHub`].
#[derive(Debug)]
pub struct HubPort {
    id: u64,
    shared: Arc<HubShared>,
    rx: Receiver<String>,
}

impl HubPort {
    fn ensure_open(&self) -> Result<(), SyncError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            Err(SyncError::Closed)
        } else {
            Ok(())
        }
    }
}

impl SyncTransport for HubPort {
    fn publish(&mut self, payload: &str) -> Result<(), SyncError> {
        self.ensure_open()?;
        let mut state = self.shared.state.lock().map_err(|_| SyncError::Closed)?;
        // Peers whose receiver is gone have left; forget them.
        state
            .peers
            .retain(|(id, tx)| *id == self.id || tx.send(payload.to_owned()).is_ok());
        Ok(())
    }

    fn drain(&mut self) -> Result<Vec<String>, SyncError> {
        self.ensure_open()?;
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(payload) => out.push(payload),
                Err(TryRecvError::Empty) => return Ok(out),
                Err(TryRecvError::Disconnected) => return Err(SyncError::Closed),
            }
        }
    }
}

impl Drop for HubPort {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.peers.retain(|(id, _)| *id != self.id);
        }
    }
}
