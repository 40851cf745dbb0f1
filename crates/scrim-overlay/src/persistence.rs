#![forbid(unsafe_code)]

//! Session persistence of resumable overlays.
//!
//! Writes go through only when the saved list changes, so the storage
//! backend sees one write per real change rather than one per engine call.

use scrim_runtime::storage::{load_overlays, save_overlays};
use scrim_runtime::{PersistedOverlay, SessionStorage, StorageError};

pub struct Persistence {
    storage: Box<dyn SessionStorage>,
    session: String,
    last: Option<Vec<PersistedOverlay>>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("session", &self.session)
            .field("saved", &self.last.as_ref().map(Vec::len))
            .finish()
    }
}

impl Persistence {
    #[must_use]
    pub fn new(storage: Box<dyn SessionStorage>, session: impl Into<String>) -> Self {
        Self {
            storage,
            session: session.into(),
            last: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Overlays saved by a previous run of this session.
    pub fn load(&self) -> Result<Vec<PersistedOverlay>, StorageError> {
        load_overlays(self.storage.as_ref(), &self.session)
    }

    /// Save `overlays` unless they match the last successful save.
    /// Returns `true` if storage was written.
    pub fn save(&mut self, overlays: &[PersistedOverlay]) -> Result<bool, StorageError> {
        if self.last.as_deref() == Some(overlays) {
            return Ok(false);
        }
        save_overlays(self.storage.as_mut(), &self.session, overlays)?;
        tracing::trace!(session = %self.session, count = overlays.len(), "overlays persisted");
        self.last = Some(overlays.to_vec());
        Ok(true)
    }
}
