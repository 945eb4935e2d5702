//! Per-author draft registry.
//!
//! `DraftRegistry` maps an author identity to that author's single in-progress
//! draft. Each entry is an `Arc<Mutex<Option<Draft>>>` slot: the `DashMap`
//! shard lock is only held long enough to clone the slot, and the slot's
//! async mutex serializes concurrent commands from the same author. A slot
//! is emptied (`None`) when its draft is committed or aborted, so a command
//! that was waiting on the lock sees "no draft" instead of a stale copy.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard};

use pollbot_types::draft::Draft;
use pollbot_types::error::PollError;

type DraftSlot = Arc<Mutex<Option<Draft>>>;

/// Locked access to one author's live draft.
pub struct DraftGuard {
    guard: OwnedMutexGuard<Option<Draft>>,
}

impl DraftGuard {
    pub fn draft(&self) -> Result<&Draft, PollError> {
        self.guard.as_ref().ok_or(PollError::NoDraft)
    }

    pub fn draft_mut(&mut self) -> Result<&mut Draft, PollError> {
        self.guard.as_mut().ok_or(PollError::NoDraft)
    }

    /// Empty the slot, returning the draft it held.
    fn take(mut self) -> Option<Draft> {
        self.guard.take()
    }
}

/// Concurrent registry of in-progress drafts, keyed by author.
#[derive(Debug, Default)]
pub struct DraftRegistry {
    drafts: DashMap<String, DraftSlot>,
}

impl DraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty draft for `author` unless one already exists.
    ///
    /// Returns `true` if a new draft was created, `false` if the author
    /// already had one (which is left untouched).
    pub fn begin(&self, author: &str) -> bool {
        match self.drafts.entry(author.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(Some(Draft::default()))));
                true
            }
        }
    }

    /// Whether `author` currently has a draft.
    pub fn contains(&self, author: &str) -> bool {
        self.drafts.contains_key(author)
    }

    /// Lock `author`'s draft. Fails with `NoDraft` if there is none, or if it
    /// was committed or aborted while this call waited for the lock.
    pub async fn lock(&self, author: &str) -> Result<DraftGuard, PollError> {
        let slot = self
            .drafts
            .get(author)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(PollError::NoDraft)?;

        let guard = slot.lock_owned().await;
        if guard.is_none() {
            return Err(PollError::NoDraft);
        }
        Ok(DraftGuard { guard })
    }

    /// Run `f` against `author`'s draft under its lock.
    pub async fn update<T>(
        &self,
        author: &str,
        f: impl FnOnce(&mut Draft) -> Result<T, PollError>,
    ) -> Result<T, PollError> {
        let mut guard = self.lock(author).await?;
        f(guard.draft_mut()?)
    }

    /// Remove `author`'s draft while holding its lock, returning it.
    pub fn finish(&self, author: &str, guard: DraftGuard) -> Option<Draft> {
        self.drafts.remove(author);
        guard.take()
    }

    /// Number of authors with a draft in progress.
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
