//! Draft history storage.
//!
//! A store keeps, per draft, the draft record and its append-only log of
//! contributions. The current text is never stored on its own: it is the
//! snapshot of the newest contribution.
//!
//! Writers are serialized per draft by compare-and-swap: [`DraftStore::append`]
//! names the contribution the caller validated against and fails with
//! [`StoreError::HeadMoved`] if anything was appended since. Completion goes
//! through the same per-draft critical section, so no append can land after
//! a completion commits.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::model::{Contribution, ContributionId, Draft, DraftId, UserId};

/// Persistence for drafts and their contribution logs.
pub trait DraftStore: Send + Sync {
    /// Record a new draft together with its seed contribution, written by
    /// the draft's creator.
    fn insert_draft(&self, draft: Draft, seed_text: String) -> StoreResult<Contribution>;

    /// Look up a draft.
    fn draft(&self, id: DraftId) -> StoreResult<Draft>;

    /// Every draft, newest first.
    fn drafts(&self) -> StoreResult<Vec<Draft>>;

    /// The newest contribution, if any.
    fn head(&self, id: DraftId) -> StoreResult<Option<Contribution>>;

    /// Append a snapshot if `expected_head` is still the newest contribution
    /// and the draft is open.
    fn append(
        &self,
        id: DraftId,
        expected_head: Option<ContributionId>,
        author: UserId,
        text: String,
    ) -> StoreResult<Contribution>;

    /// Mark a draft completed. Fails if it already is.
    fn complete(&self, id: DraftId) -> StoreResult<Draft>;

    /// All contributions, newest first.
    fn history(&self, id: DraftId) -> StoreResult<Vec<Contribution>>;

    /// Snapshot of the newest contribution, or `""` for an empty log.
    fn current_text(&self, id: DraftId) -> StoreResult<String> {
        Ok(self.head(id)?.map(|c| c.text).unwrap_or_default())
    }
}

/// A draft and its contributions, oldest first.
///
/// This is both the in-memory record and the on-disk document format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DraftLog {
    pub(crate) draft: Draft,
    pub(crate) contributions: Vec<Contribution>,
}

impl DraftLog {
    pub(crate) fn new(draft: Draft, seed_text: String) -> Self {
        let author = draft.creator.clone();
        let mut log = Self {
            draft,
            contributions: Vec::new(),
        };
        log.push(author, seed_text);
        log
    }

    pub(crate) fn head(&self) -> Option<&Contribution> {
        self.contributions.last()
    }

    pub(crate) fn append(
        &mut self,
        expected_head: Option<ContributionId>,
        author: UserId,
        text: String,
    ) -> StoreResult<Contribution> {
        if self.draft.completed {
            return Err(StoreError::Closed(self.draft.id));
        }
        if self.head().map(|c| c.id) != expected_head {
            return Err(StoreError::HeadMoved {
                draft: self.draft.id,
            });
        }
        Ok(self.push(author, text))
    }

    pub(crate) fn complete(&mut self) -> StoreResult<Draft> {
        if self.draft.completed {
            return Err(StoreError::AlreadyCompleted(self.draft.id));
        }
        self.draft.completed = true;
        Ok(self.draft.clone())
    }

    pub(crate) fn history(&self) -> Vec<Contribution> {
        self.contributions.iter().rev().cloned().collect()
    }

    fn push(&mut self, author: UserId, text: String) -> Contribution {
        // Keep timestamp order identical to insertion order even if the
        // wall clock steps backwards.
        let now = Utc::now();
        let timestamp = self.head().map_or(now, |prev| prev.timestamp.max(now));
        let contribution = Contribution {
            id: ContributionId::new(),
            draft: self.draft.id,
            author,
            text,
            timestamp,
            seq: self.contributions.len() as u64,
        };
        self.contributions.push(contribution.clone());
        contribution
    }
}

/// Newest first; ties broken by id, which is time ordered.
pub(crate) fn sort_newest_first(drafts: &mut [Draft]) {
    drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
