//! History store — the capped, persisted list of past analyses.
//!
//! DESIGN
//! ======
//! Newest first, at most `HISTORY_CAPACITY` records. Each mutation builds
//! the next snapshot, saves it through the backend, and only then swaps it
//! in. A failed save leaves the in-memory list untouched, so callers never
//! observe a state that was not persisted.
//!
//! Records are immutable apart from `follow_up_questions`, which only
//! grows, and only with non-blank turns.

use tracing::{debug, info};
use uuid::Uuid;

use crate::plant::{Analysis, ChatMessage};
use crate::services::persistence::{HistoryBackend, HistoryError};

pub const HISTORY_CAPACITY: usize = 10;

pub struct HistoryStore {
    backend: Box<dyn HistoryBackend>,
    entries: Vec<Analysis>,
}

impl HistoryStore {
    /// Load the stored snapshot, keeping only the newest records.
    ///
    /// # Errors
    ///
    /// Returns a `HistoryError` if the backend cannot be read.
    pub fn open(backend: impl HistoryBackend + 'static) -> Result<Self, HistoryError> {
        let mut entries = backend.load()?;
        if entries.len() > HISTORY_CAPACITY {
            debug!(loaded = entries.len(), "history: truncating oversized snapshot");
            entries.truncate(HISTORY_CAPACITY);
        }
        Ok(Self { backend: Box::new(backend), entries })
    }

    /// Records, most recent first.
    #[must_use]
    pub fn list(&self) -> &[Analysis] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Analysis> {
        self.entries.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `analysis` at the front under a fresh id and timestamp.
    /// Returns the id it was stored under.
    ///
    /// # Errors
    ///
    /// Returns a `HistoryError` if the snapshot cannot be saved.
    pub fn append(&mut self, analysis: Analysis) -> Result<Uuid, HistoryError> {
        let analysis = analysis.with_fresh_identity();
        let id = analysis.id;

        let mut next = Vec::with_capacity(HISTORY_CAPACITY);
        next.push(analysis);
        next.extend(self.entries.iter().take(HISTORY_CAPACITY - 1).cloned());
        self.commit(next)?;

        info!(analysis_id = %id, count = self.entries.len(), "history: appended");
        Ok(id)
    }

    /// Append `message` to the follow-up thread of record `id`. Returns
    /// `false`, and persists nothing, when no such record exists.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::BlankMessage` for whitespace-only content, or
    /// a `HistoryError` if the snapshot cannot be saved.
    pub fn append_message(&mut self, id: Uuid, message: ChatMessage) -> Result<bool, HistoryError> {
        self.append_messages(id, [message])
    }

    /// Append several turns to record `id` in one write, so a question and
    /// its answer land together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::BlankMessage` if any turn is blank (nothing is
    /// written), or a `HistoryError` if the snapshot cannot be saved.
    pub fn append_messages(
        &mut self,
        id: Uuid,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) -> Result<bool, HistoryError> {
        let messages: Vec<ChatMessage> = messages.into_iter().collect();
        if messages.iter().any(|m| m.content.trim().is_empty()) {
            return Err(HistoryError::BlankMessage);
        }
        let Some(index) = self.entries.iter().position(|a| a.id == id) else {
            debug!(analysis_id = %id, "history: append to unknown id ignored");
            return Ok(false);
        };

        let mut next = self.entries.clone();
        next[index].follow_up_questions.extend(messages);
        self.commit(next)?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns a `HistoryError` if the snapshot cannot be saved.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.commit(Vec::new())?;
        info!("history: cleared");
        Ok(())
    }

    fn commit(&mut self, next: Vec<Analysis>) -> Result<(), HistoryError> {
        self.backend.save(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
