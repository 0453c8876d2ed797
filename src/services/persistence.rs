//! Persistence backends for the history store.
//!
//! DESIGN
//! ======
//! History is one named record rewritten wholesale on every mutation.
//! `JsonFileBackend` writes a temp file in the same directory, syncs it,
//! then renames it over the record, so readers only ever see a complete
//! snapshot. `MemoryBackend` keeps the snapshot in process for tests and
//! ephemeral runs.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plant::Analysis;

/// Name of the persisted history record.
pub const HISTORY_RECORD_NAME: &str = "plant-analysis-storage";

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("history record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("unsupported history version {0}")]
    UnsupportedVersion(u32),
    #[error("chat message content must not be blank")]
    BlankMessage,
}

/// Where the history snapshot lives.
pub trait HistoryBackend: Send {
    /// Read the stored snapshot. A record that does not exist yet is empty.
    ///
    /// # Errors
    ///
    /// Returns a `HistoryError` if the record exists but cannot be read.
    fn load(&self) -> Result<Vec<Analysis>, HistoryError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `HistoryError` if the snapshot cannot be written.
    fn save(&self, history: &[Analysis]) -> Result<(), HistoryError>;
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    history: &'a [Analysis],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    history: Vec<Analysis>,
}

// =============================================================================
// JSON FILE
// =============================================================================

pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/plant-analysis-storage.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{HISTORY_RECORD_NAME}.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<Analysis>, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(HistoryError::UnsupportedVersion(snapshot.version));
        }
        debug!(path = %self.path.display(), count = snapshot.history.len(), "history: loaded");
        Ok(snapshot.history)
    }

    fn save(&self, history: &[Analysis]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&SnapshotRef { version: SNAPSHOT_VERSION, history })?;

        let tmp_path = self.temp_path();
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&body)?;
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), count = history.len(), "history: saved");
        Ok(())
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-process backend. Clones share one snapshot.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    snapshot: Arc<Mutex<Vec<Analysis>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_history(history: Vec<Analysis>) -> Self {
        Self { snapshot: Arc::new(Mutex::new(history)) }
    }

    /// Current stored snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Analysis> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<Analysis>, HistoryError> {
        Ok(self.snapshot())
    }

    fn save(&self, history: &[Analysis]) -> Result<(), HistoryError> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = history.to_vec();
        Ok(())
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
