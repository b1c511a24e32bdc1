//! Draft lifecycle: creation, contribution, completion.
//!
//! [`Drafts`] ties the validator to a [`DraftStore`]. Every operation takes
//! the acting user explicitly; nothing here knows who is "logged in".

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DraftError, DraftResult, StoreError};
use crate::model::{Contribution, ContributionId, Draft, DraftId, NewDraft, UserId};
use crate::store::DraftStore;
use crate::validate::{self, HistoryAudit};

/// Default number of validate-and-append attempts before giving up.
pub const DEFAULT_MAX_APPEND_ATTEMPTS: u32 = 8;

/// An accepted contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Added {
    /// Units added under the draft's limit.
    pub delta: i64,
    /// Id of the new contribution.
    pub contribution_id: ContributionId,
}

/// Drafts relevant to one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserDrafts {
    /// Drafts the user created, newest first.
    pub created: Vec<Draft>,
    /// Drafts the user contributed to without creating, most recently
    /// contributed to first.
    pub contributed: Vec<Draft>,
}

/// Draft operations over a store.
#[derive(Debug)]
pub struct Drafts<S> {
    store: S,
    max_append_attempts: u32,
}

impl<S: DraftStore> Drafts<S> {
    /// Wrap a store with default settings.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            max_append_attempts: DEFAULT_MAX_APPEND_ATTEMPTS,
        }
    }

    /// Set how many times a contribution is re-validated after losing a race.
    ///
    /// Values below 1 are treated as 1.
    pub fn with_max_append_attempts(mut self, attempts: u32) -> Self {
        self.max_append_attempts = attempts.max(1);
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create a draft and record the creator's opening text as its first
    /// contribution.
    #[tracing::instrument(skip(self, request), fields(title = %request.title))]
    pub fn create_draft(&self, creator: &UserId, request: NewDraft) -> DraftResult<DraftId> {
        let limit = request.validate()?;
        let draft = Draft {
            id: DraftId::new(),
            title: request.title.trim().to_string(),
            category: request.category.trim().to_string(),
            creator: creator.clone(),
            limit,
            completed: false,
            created_at: Utc::now(),
        };
        let id = draft.id;
        self.store.insert_draft(draft, request.initial_text)?;
        tracing::info!(draft = %id, %limit, "draft created");
        Ok(id)
    }

    /// Look up a draft.
    pub fn draft(&self, id: DraftId) -> DraftResult<Draft> {
        Ok(self.store.draft(id)?)
    }

    /// The draft's current text: the newest snapshot.
    pub fn current_text(&self, id: DraftId) -> DraftResult<String> {
        Ok(self.store.current_text(id)?)
    }

    /// Propose `proposed` as the draft's new full text.
    ///
    /// The proposal is validated against the newest snapshot and appended only
    /// if that snapshot is still the newest. When another contribution lands
    /// in between, the proposal is validated again against the new text; a
    /// contributor who lost a race therefore usually sees
    /// [`DraftError::PrefixViolation`].
    #[tracing::instrument(skip(self, proposed), fields(proposed_len = proposed.len()))]
    pub fn add_contribution(
        &self,
        id: DraftId,
        author: &UserId,
        proposed: &str,
    ) -> DraftResult<Added> {
        for attempt in 1..=self.max_append_attempts {
            let draft = self.store.draft(id)?;
            let head = self.store.head(id)?;
            let current = head.as_ref().map_or("", |c| c.text.as_str());

            let accepted =
                validate::validate_contribution(current, proposed, draft.limit, draft.state())
                    .inspect_err(|e| tracing::debug!(kind = e.kind(), "contribution rejected"))?;

            match self.store.append(
                id,
                head.map(|c| c.id),
                author.clone(),
                accepted.snapshot,
            ) {
                Ok(contribution) => {
                    tracing::info!(
                        draft = %id,
                        contribution = %contribution.id,
                        delta = accepted.delta,
                        "contribution added"
                    );
                    return Ok(Added {
                        delta: accepted.delta,
                        contribution_id: contribution.id,
                    });
                }
                Err(StoreError::HeadMoved { .. }) => {
                    tracing::debug!(attempt, "draft moved, validating again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(draft = %id, attempts = self.max_append_attempts, "giving up on busy draft");
        Err(DraftError::Contended {
            draft: id,
            attempts: self.max_append_attempts,
        })
    }

    /// Close the draft. Only its creator may do this, and only once.
    #[tracing::instrument(skip(self))]
    pub fn complete_draft(&self, id: DraftId, actor: &UserId) -> DraftResult<()> {
        let draft = self.store.draft(id)?;
        if &draft.creator != actor {
            return Err(DraftError::NotOwner);
        }
        if draft.completed {
            return Err(DraftError::AlreadyCompleted);
        }
        self.store.complete(id)?;
        tracing::info!(draft = %id, "draft completed");
        Ok(())
    }

    /// Every contribution, newest first.
    pub fn list_history(&self, id: DraftId) -> DraftResult<Vec<Contribution>> {
        Ok(self.store.history(id)?)
    }

    /// Every draft, newest first.
    pub fn list_drafts(&self) -> DraftResult<Vec<Draft>> {
        Ok(self.store.drafts()?)
    }

    /// Drafts `user` created, and drafts they contributed to but did not
    /// create, ordered by their latest contribution.
    #[tracing::instrument(skip(self))]
    pub fn drafts_for_user(&self, user: &UserId) -> DraftResult<UserDrafts> {
        let mut created = Vec::new();
        let mut contributed: Vec<(DateTime<Utc>, Draft)> = Vec::new();
        for draft in self.store.drafts()? {
            if &draft.creator == user {
                created.push(draft);
            } else if let Some(latest) = self
                .store
                .history(draft.id)?
                .iter()
                .filter(|c| &c.author == user)
                .map(|c| c.timestamp)
                .max()
            {
                contributed.push((latest, draft));
            }
        }
        // Stable: equal timestamps keep the newest-draft-first order.
        contributed.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(UserDrafts {
            created,
            contributed: contributed.into_iter().map(|(_, draft)| draft).collect(),
        })
    }

    /// Re-check every stored step of a draft against the prefix and limit
    /// rules.
    #[tracing::instrument(skip(self))]
    pub fn verify_history(&self, id: DraftId) -> DraftResult<HistoryAudit> {
        let draft = self.store.draft(id)?;
        let history = self.store.history(id)?;
        let audit = validate::verify_history(
            draft.limit,
            history.iter().rev().map(|c| c.text.as_str()),
        );
        if !audit.is_clean() {
            tracing::warn!(
                draft = %id,
                violations = audit.violations.len(),
                "history has invalid steps"
            );
        }
        Ok(audit)
    }
}
