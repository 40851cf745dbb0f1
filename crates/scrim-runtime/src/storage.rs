#![forbid(unsafe_code)]

//! Session-scoped key/value storage for resumable overlays.
//!
//! This is not a general persistence layer. The engine writes one key per
//! session, holding the variant and props of overlays that were open, so an
//! interrupted overlay can be resumed after a reload.
//!
//! # Backends
//!
//! - [`MemoryStorage`]: shared in-memory map. Clones see the same data, which
//!   lets a test simulate a reload by handing a clone to a second engine.
//! - [`FileStorage`] (feature `file-storage`): one JSON file per key in a
//!   directory, written atomically through a temp file and rename.

use scrim_core::{DismissPolicy, Props, Variant};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Storage failures. None of these ever reach an engine caller.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    /// Stored data did not parse.
    Corrupt(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "storage I/O error: {e}"),
            Self::Corrupt(msg) => write!(f, "corrupt stored overlays: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Minimal string key/value store.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// What gets written for one open overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedOverlay {
    pub variant: Variant,
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss: Option<DismissPolicy>,
    #[serde(default)]
    pub priority: i32,
}

/// Storage key for a session's overlays.
#[must_use]
pub fn session_key(session: &str) -> String {
    format!("scrim::{session}::overlays")
}

/// Read the overlays saved for `session`. A missing key reads as empty.
pub fn load_overlays(
    storage: &dyn SessionStorage,
    session: &str,
) -> Result<Vec<PersistedOverlay>, StorageError> {
    match storage.get(&session_key(session))? {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string())),
    }
}

/// Replace the overlays saved for `session`. An empty list removes the key.
pub fn save_overlays(
    storage: &mut dyn SessionStorage,
    session: &str,
    overlays: &[PersistedOverlay],
) -> Result<(), StorageError> {
    let key = session_key(session);
    if overlays.is_empty() {
        return storage.remove(&key);
    }
    let raw = serde_json::to_string(overlays).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    storage.set(&key, &raw)
}

/// In-memory storage. Clones share one map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(feature = "file-storage")]
pub use file::FileStorage;

#[cfg(feature = "file-storage")]
mod file {
    use super::{SessionStorage, StorageError};
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use std::fs;
    use std::io::{ErrorKind, Write};
    use std::path::{Path, PathBuf};

    /// One JSON file per key under a directory.
    ///
    /// Keys are base64url-encoded into file names, so any key is safe on any
    /// filesystem.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        /// Use `dir`, creating it if needed.
        pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
            let dir = dir.into();
            fs::create_dir_all(&dir)?;
            Ok(Self { dir })
        }

        #[must_use]
        pub fn dir(&self) -> &Path {
            &self.dir
        }

        fn path_for(&self, key: &str) -> PathBuf {
            self.dir
                .join(format!("{}.json", URL_SAFE_NO_PAD.encode(key.as_bytes())))
        }
    }

    impl SessionStorage for FileStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            match fs::read_to_string(self.path_for(key)) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            let path = self.path_for(key);
            let tmp = path.with_extension("json.tmp");
            {
                let mut file = fs::File::create(&tmp)?;
                file.write_all(value.as_bytes())?;
                file.sync_all()?;
            }
            fs::rename(&tmp, &path)?;
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }
}
