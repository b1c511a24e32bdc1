//! In-process store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::model::{Contribution, ContributionId, Draft, DraftId, UserId};

use super::{DraftLog, DraftStore, sort_newest_first};

/// Keeps every draft in memory.
///
/// Each draft sits behind its own mutex; the map lock is only held long
/// enough to find or insert an entry, so different drafts never wait on
/// each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    drafts: RwLock<HashMap<DraftId, Arc<Mutex<DraftLog>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: DraftId) -> StoreResult<Arc<Mutex<DraftLog>>> {
        let drafts = self.drafts.read().unwrap_or_else(|e| e.into_inner());
        drafts.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn with_log<T>(&self, id: DraftId, f: impl FnOnce(&mut DraftLog) -> T) -> StoreResult<T> {
        let entry = self.entry(id)?;
        let mut log = lock(&entry);
        Ok(f(&mut log))
    }
}

// A poisoned log is still consistent: every mutation is a single push or
// flag write that happens after all checks pass.
fn lock(entry: &Mutex<DraftLog>) -> MutexGuard<'_, DraftLog> {
    entry.lock().unwrap_or_else(|e| e.into_inner())
}

impl DraftStore for MemoryStore {
    fn insert_draft(&self, draft: Draft, seed_text: String) -> StoreResult<Contribution> {
        let mut drafts = self.drafts.write().unwrap_or_else(|e| e.into_inner());
        if drafts.contains_key(&draft.id) {
            return Err(StoreError::Duplicate(draft.id));
        }
        let id = draft.id;
        let log = DraftLog::new(draft, seed_text);
        let seed = log.head().cloned().ok_or(StoreError::NotFound(id))?;
        drafts.insert(id, Arc::new(Mutex::new(log)));
        Ok(seed)
    }

    fn draft(&self, id: DraftId) -> StoreResult<Draft> {
        self.with_log(id, |log| log.draft.clone())
    }

    fn drafts(&self) -> StoreResult<Vec<Draft>> {
        let entries: Vec<_> = {
            let drafts = self.drafts.read().unwrap_or_else(|e| e.into_inner());
            drafts.values().cloned().collect()
        };
        let mut drafts: Vec<Draft> = entries
            .iter()
            .map(|entry| lock(entry).draft.clone())
            .collect();
        sort_newest_first(&mut drafts);
        Ok(drafts)
    }

    fn head(&self, id: DraftId) -> StoreResult<Option<Contribution>> {
        self.with_log(id, |log| log.head().cloned())
    }

    fn append(
        &self,
        id: DraftId,
        expected_head: Option<ContributionId>,
        author: UserId,
        text: String,
    ) -> StoreResult<Contribution> {
        self.with_log(id, |log| log.append(expected_head, author, text))?
    }

    fn complete(&self, id: DraftId) -> StoreResult<Draft> {
        self.with_log(id, DraftLog::complete)?
    }

    fn history(&self, id: DraftId) -> StoreResult<Vec<Contribution>> {
        self.with_log(id, |log| log.history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[test]
    fn insert_then_read_back() {
        let store = MemoryStore::new();
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "The cat sat.".to_string()).unwrap();

        assert_eq!(store.current_text(id).unwrap(), "The cat sat.");
        assert_eq!(store.head(id).unwrap().unwrap().id, seed.id);
        assert_eq!(store.history(id).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        let draft = testing::draft("ada");
        store.insert_draft(draft.clone(), "A.".to_string()).unwrap();
        let again = store.insert_draft(draft, "B.".to_string());
        assert!(matches!(again, Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn unknown_draft_is_not_found() {
        let store = MemoryStore::new();
        let id = DraftId::new();
        assert!(matches!(store.draft(id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.history(id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn drafts_listed_newest_first() {
        let store = MemoryStore::new();
        let mut older = testing::draft("ada");
        older.created_at -= chrono::Duration::minutes(5);
        let newer = testing::draft("bo");
        let (older_id, newer_id) = (older.id, newer.id);
        store.insert_draft(older, "A.".to_string()).unwrap();
        store.insert_draft(newer, "B.".to_string()).unwrap();

        let ids: Vec<_> = store.drafts().unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![newer_id, older_id]);
    }

    #[test]
    fn concurrent_appends_on_same_head_admit_one() {
        let store = Arc::new(MemoryStore::new());
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "Start.".to_string()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let author = UserId::new(format!("u{n}"));
                    store.append(id, Some(seed.id), author, format!("Start. {n}."))
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Result::is_ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(store.history(id).unwrap().len(), 2);
    }
}
