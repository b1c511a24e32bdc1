//! JSON-file store: one document per draft.
//!
//! Layout under the store root:
//!
//! ```text
//! drafts/<draft-id>.json    draft record + contributions, oldest first
//! drafts/<draft-id>.lock    present while a writer holds the draft
//! ```
//!
//! Writers take the draft's lock file (created with `create_new`, so it works
//! across processes), re-read the document, apply the change, and replace
//! the document through a temp file and rename. Readers never lock: a rename
//! swaps whole documents, so a reader sees either the old or the new log.
//!
//! A lock file records its holder's pid and when it was taken. A writer that
//! died while holding one leaves it behind; once it is older than the stale
//! bound (default 30s) the next writer removes it and proceeds.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::model::{Contribution, ContributionId, Draft, DraftId, UserId};

use super::{DraftLog, DraftStore, sort_newest_first};

/// Default time to wait for another writer to release a draft.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default age after which a lock is taken to belong to a dead writer.
pub const DEFAULT_STALE_LOCK_AFTER: Duration = Duration::from_secs(30);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stores each draft as a JSON document in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Utf8PathBuf,
    lock_timeout: Duration,
    stale_lock_after: Duration,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref()))]
    pub fn open<P: AsRef<Utf8Path>>(root: P) -> StoreResult<Self> {
        let dir = root.as_ref().join("drafts");
        fs::create_dir_all(dir.as_std_path()).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        tracing::debug!(dir = %dir, "file store opened");
        Ok(Self {
            dir,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            stale_lock_after: DEFAULT_STALE_LOCK_AFTER,
        })
    }

    /// Set how long writers wait for a busy draft before giving up.
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the age past which a leftover lock is removed.
    ///
    /// Must comfortably exceed the longest write, or a live writer's lock
    /// could be broken.
    pub const fn with_stale_lock_after(mut self, age: Duration) -> Self {
        self.stale_lock_after = age;
        self
    }

    /// Directory holding the draft documents.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn lock(&self, id: DraftId) -> StoreResult<DraftLock> {
        DraftLock::acquire(
            &self.dir.join(format!("{id}.lock")),
            self.lock_timeout,
            self.stale_lock_after,
        )
    }

    fn document_path(&self, id: DraftId) -> Utf8PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read_log(&self, id: DraftId) -> StoreResult<DraftLog> {
        let path = self.document_path(id);
        match fs::read_to_string(path.as_std_path()) {
            Ok(json) => parse_log(&path, &json),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn write_log(&self, log: &DraftLog) -> StoreResult<()> {
        let path = self.document_path(log.draft.id);
        let json = serde_json::to_vec_pretty(log).map_err(|source| StoreError::Serialization {
            path: path.clone(),
            source,
        })?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), &json).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|source| StoreError::Io { path, source })
    }

    /// Run `f` on the draft's log while holding its lock, persisting the log
    /// only if `f` succeeds.
    fn update<T>(
        &self,
        id: DraftId,
        f: impl FnOnce(&mut DraftLog) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _lock = self.lock(id)?;
        let mut log = self.read_log(id)?;
        let value = f(&mut log)?;
        self.write_log(&log)?;
        Ok(value)
    }
}

fn parse_log(path: &Utf8Path, json: &str) -> StoreResult<DraftLog> {
    serde_json::from_str(json).map_err(|source| StoreError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Contents of a lock file.
#[derive(Debug, Serialize, Deserialize)]
struct LockHolder {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Exclusive hold on one draft, released on drop.
struct DraftLock {
    path: Utf8PathBuf,
}

impl DraftLock {
    fn acquire(path: &Utf8Path, timeout: Duration, stale_after: Duration) -> StoreResult<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path.as_std_path())
            {
                Ok(file) => {
                    let holder = LockHolder {
                        pid: std::process::id(),
                        acquired_at: Utc::now(),
                    };
                    // The lock is held from here on; the record only helps
                    // whoever finds it left behind.
                    if let Err(e) = serde_json::to_writer(file, &holder) {
                        tracing::debug!(lock = %path, error = %e, "could not record lock holder");
                    }
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if break_if_stale(path, stale_after) {
                        continue;
                    }
                    if Instant::now() >= deadline {
                        tracing::warn!(lock = %path, "gave up waiting for draft lock");
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(StoreError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }
}

/// How long ago the lock at `path` was taken. Falls back to the file's
/// modification time when the holder record is missing or unreadable.
fn lock_age(path: &Utf8Path) -> Option<Duration> {
    let recorded = fs::read_to_string(path.as_std_path())
        .ok()
        .and_then(|json| serde_json::from_str::<LockHolder>(&json).ok());
    match recorded {
        Some(holder) => Some((Utc::now() - holder.acquired_at).to_std().unwrap_or_default()),
        None => fs::metadata(path.as_std_path())
            .and_then(|meta| meta.modified())
            .ok()
            .map(|modified| modified.elapsed().unwrap_or_default()),
    }
}

/// Remove the lock at `path` if it is older than `stale_after`. Returns
/// whether the caller should try to take the lock again right away.
fn break_if_stale(path: &Utf8Path, stale_after: Duration) -> bool {
    let Some(age) = lock_age(path) else {
        // Released while we looked.
        return !path.exists();
    };
    if age < stale_after {
        return false;
    }
    tracing::warn!(lock = %path, age_ms = age.as_millis(), "removing stale draft lock");
    match fs::remove_file(path.as_std_path()) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(lock = %path, error = %e, "failed to remove stale draft lock");
            false
        }
    }
}

impl Drop for DraftLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.path.as_std_path()) {
            tracing::warn!(lock = %self.path, error = %e, "failed to release draft lock");
        }
    }
}

impl DraftStore for FileStore {
    #[tracing::instrument(skip_all, fields(draft = %draft.id))]
    fn insert_draft(&self, draft: Draft, seed_text: String) -> StoreResult<Contribution> {
        let id = draft.id;
        let _lock = self.lock(id)?;
        if self.document_path(id).exists() {
            return Err(StoreError::Duplicate(id));
        }
        let log = DraftLog::new(draft, seed_text);
        self.write_log(&log)?;
        log.head().cloned().ok_or(StoreError::NotFound(id))
    }

    fn draft(&self, id: DraftId) -> StoreResult<Draft> {
        Ok(self.read_log(id)?.draft)
    }

    fn drafts(&self) -> StoreResult<Vec<Draft>> {
        let entries = fs::read_dir(self.dir.as_std_path()).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut drafts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.extension() != Some("json")
                || path.file_stem().and_then(|s| s.parse::<DraftId>().ok()).is_none()
            {
                continue;
            }
            match fs::read_to_string(path.as_std_path()) {
                Ok(json) => match parse_log(&path, &json) {
                    Ok(log) => drafts.push(log.draft),
                    Err(e) => tracing::warn!(error = %e, "skipping unreadable draft document"),
                },
                // Removed between listing and reading.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }

        sort_newest_first(&mut drafts);
        Ok(drafts)
    }

    fn head(&self, id: DraftId) -> StoreResult<Option<Contribution>> {
        Ok(self.read_log(id)?.head().cloned())
    }

    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    fn append(
        &self,
        id: DraftId,
        expected_head: Option<ContributionId>,
        author: UserId,
        text: String,
    ) -> StoreResult<Contribution> {
        self.update(id, |log| log.append(expected_head, author, text))
    }

    #[tracing::instrument(skip(self))]
    fn complete(&self, id: DraftId) -> StoreResult<Draft> {
        self.update(id, DraftLog::complete)
    }

    fn history(&self, id: DraftId) -> StoreResult<Vec<Contribution>> {
        Ok(self.read_log(id)?.history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> FileStore {
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        FileStore::open(root).unwrap()
    }

    #[test]
    fn persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = {
            let store = store(&tmp);
            store.insert_draft(draft, "The cat sat.".to_string()).unwrap()
        };
        store(&tmp)
            .append(id, Some(seed.id), UserId::from("bo"), "The cat sat. Meow.".to_string())
            .unwrap();

        let reopened = store(&tmp);
        assert_eq!(reopened.current_text(id).unwrap(), "The cat sat. Meow.");
        let authors: Vec<_> = reopened
            .history(id)
            .unwrap()
            .into_iter()
            .map(|c| c.author.to_string())
            .collect();
        assert_eq!(authors, vec!["bo", "ada"]);
    }

    #[test]
    fn rejected_append_leaves_document_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let draft = testing::draft("ada");
        let id = draft.id;
        store.insert_draft(draft, "A.".to_string()).unwrap();
        let before = fs::read_to_string(store.document_path(id).as_std_path()).unwrap();

        let stale = store.append(id, None, UserId::from("bo"), "A. B.".to_string());
        assert!(matches!(stale, Err(StoreError::HeadMoved { .. })));

        let after = fs::read_to_string(store.document_path(id).as_std_path()).unwrap();
        assert_eq!(before, after);
        assert!(!store.dir().join(format!("{id}.lock")).exists());
    }

    #[test]
    fn completion_is_persisted_and_final() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "A.".to_string()).unwrap();

        assert!(store.complete(id).unwrap().completed);
        assert!(matches!(store.complete(id), Err(StoreError::AlreadyCompleted(_))));
        let late = store.append(id, Some(seed.id), UserId::from("bo"), "A. B.".to_string());
        assert!(matches!(late, Err(StoreError::Closed(_))));
        assert!(store.draft(id).unwrap().completed);
    }

    #[test]
    fn held_lock_times_out() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).with_lock_timeout(Duration::from_millis(30));
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "A.".to_string()).unwrap();

        fs::write(store.dir().join(format!("{id}.lock")).as_std_path(), b"").unwrap();
        let blocked = store.append(id, Some(seed.id), UserId::from("bo"), "A. B.".to_string());
        assert!(matches!(blocked, Err(StoreError::LockTimeout { .. })));
    }

    #[test]
    fn lists_only_draft_documents() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.insert_draft(testing::draft("ada"), "A.".to_string()).unwrap();
        store.insert_draft(testing::draft("bo"), "B.".to_string()).unwrap();
        fs::write(store.dir().join("notes.txt").as_std_path(), "ignore me").unwrap();
        fs::write(store.dir().join("notes.json").as_std_path(), "{}").unwrap();

        assert_eq!(store.drafts().unwrap().len(), 2);
    }

    #[test]
    fn corrupt_document_is_skipped_when_listing() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.insert_draft(testing::draft("ada"), "A.".to_string()).unwrap();
        let broken = DraftId::new();
        fs::write(store.document_path(broken).as_std_path(), "{ not json").unwrap();

        assert_eq!(store.drafts().unwrap().len(), 1);
        assert!(matches!(
            store.draft(broken),
            Err(StoreError::Serialization { .. })
        ));
    }

    #[test]
    fn stale_lock_from_dead_writer_is_broken() {
        let tmp = TempDir::new().unwrap();
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store(&tmp).insert_draft(draft, "A.".to_string()).unwrap();

        // A writer that never released its lock.
        std::mem::forget(store(&tmp).lock(id).unwrap());
        let lock_path = store(&tmp).dir().join(format!("{id}.lock"));
        assert!(lock_path.exists());

        let store = store(&tmp).with_stale_lock_after(Duration::from_millis(50));
        thread::sleep(Duration::from_millis(80));
        let appended = store
            .append(id, Some(seed.id), UserId::from("bo"), "A. B.".to_string())
            .unwrap();
        assert_eq!(store.head(id).unwrap().map(|c| c.id), Some(appended.id));
        assert!(store.complete(id).unwrap().completed);
        assert!(!lock_path.exists());
    }

    #[test]
    fn old_holder_record_marks_lock_stale() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "A.".to_string()).unwrap();

        let holder = LockHolder {
            pid: 0,
            acquired_at: Utc::now() - chrono::Duration::hours(1),
        };
        fs::write(
            store.dir().join(format!("{id}.lock")).as_std_path(),
            serde_json::to_vec(&holder).unwrap(),
        )
        .unwrap();

        store
            .append(id, Some(seed.id), UserId::from("bo"), "A. B.".to_string())
            .unwrap();
    }

    #[test]
    fn live_lock_is_not_broken() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp).with_lock_timeout(Duration::from_millis(30));
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "A.".to_string()).unwrap();

        let _held = store.lock(id).unwrap();
        let blocked = store.append(id, Some(seed.id), UserId::from("bo"), "A. B.".to_string());
        assert!(matches!(blocked, Err(StoreError::LockTimeout { .. })));
    }

    #[test]
    fn concurrent_writers_serialize() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store(&tmp));
        let draft = testing::draft("ada");
        let id = draft.id;
        let seed = store.insert_draft(draft, "Start.".to_string()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
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
