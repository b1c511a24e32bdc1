//! Error types for codraft-core.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::model::{DraftId, Limit};

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures raised by a [`DraftStore`](crate::store::DraftStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No draft with this id exists in the store.
    #[error("draft not found: {0}")]
    NotFound(DraftId),

    /// A draft with this id already exists.
    #[error("draft already exists: {0}")]
    Duplicate(DraftId),

    /// The latest contribution is not the one the caller read.
    #[error("draft {draft} moved past the contribution that was read")]
    HeadMoved {
        /// Draft whose head changed.
        draft: DraftId,
    },

    /// The draft was completed; nothing more may be appended.
    #[error("draft {0} is completed")]
    Closed(DraftId),

    /// The draft was already completed.
    #[error("draft {0} is already completed")]
    AlreadyCompleted(DraftId),

    /// Another writer holds the draft's lock.
    #[error("timed out waiting for lock on {path}")]
    LockTimeout {
        /// Lock file that could not be acquired.
        path: Utf8PathBuf,
    },

    /// Underlying filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A stored document could not be encoded or decoded.
    #[error("corrupt draft document {path}: {source}")]
    Serialization {
        /// Path of the offending document.
        path: Utf8PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Caller-facing outcomes of draft operations.
///
/// Every variant except [`DraftError::StorageUnavailable`] and
/// [`DraftError::Contended`] is a semantic rejection: retrying the same
/// request will fail the same way.
#[derive(Error, Debug)]
pub enum DraftError {
    /// The draft is completed and accepts no more contributions.
    #[error("draft is completed; contributions are closed")]
    DraftClosed,

    /// The proposed text is empty or whitespace only.
    #[error("contribution cannot be empty")]
    EmptyContribution,

    /// The proposed text does not keep the current text as its prefix.
    #[error("contribution must keep the previous text unchanged")]
    PrefixViolation,

    /// The proposed text adds nothing under the draft's unit.
    #[error("contribution must add new content (delta was {delta})")]
    NoNewContent {
        /// Measured change; zero or negative.
        delta: i64,
    },

    /// The proposed text adds more than the draft allows per turn.
    #[error("contribution adds {delta}, more than the allowed {limit}")]
    LimitExceeded {
        /// Measured change.
        delta: i64,
        /// The draft's per-contribution limit.
        limit: Limit,
    },

    /// The requested limit is not usable.
    #[error("invalid limit: {reason}")]
    InvalidLimit {
        /// Why the limit was rejected.
        reason: String,
    },

    /// A draft field is missing or malformed.
    #[error("invalid {field}: {reason}")]
    InvalidDraft {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Only the draft's creator may do this.
    #[error("only the creator of the draft may complete it")]
    NotOwner,

    /// The draft was already completed.
    #[error("draft is already completed")]
    AlreadyCompleted,

    /// No draft with this id exists.
    #[error("draft not found: {0}")]
    NotFound(DraftId),

    /// Other contributors kept moving the draft forward while this one retried.
    #[error("draft {draft} is busy; gave up after {attempts} attempts")]
    Contended {
        /// Draft being contributed to.
        draft: DraftId,
        /// Number of validate-and-append attempts made.
        attempts: u32,
    },

    /// The storage layer failed; the request may be retried.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
}

impl DraftError {
    /// Stable snake_case code for this error, for mapping to user messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DraftClosed => "draft_closed",
            Self::EmptyContribution => "empty_contribution",
            Self::PrefixViolation => "prefix_violation",
            Self::NoNewContent { .. } => "no_new_content",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::InvalidLimit { .. } => "invalid_limit",
            Self::InvalidDraft { .. } => "invalid_draft",
            Self::NotOwner => "not_owner",
            Self::AlreadyCompleted => "already_completed",
            Self::NotFound(_) => "not_found",
            Self::Contended { .. } => "contended",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Whether the caller may usefully retry the same request.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Contended { .. })
    }
}

impl From<StoreError> for DraftError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Closed(_) => Self::DraftClosed,
            StoreError::AlreadyCompleted(_) => Self::AlreadyCompleted,
            other => Self::StorageUnavailable(other),
        }
    }
}

/// Result type alias using [`DraftError`].
pub type DraftResult<T> = Result<T, DraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        let io = StoreError::Io {
            path: Utf8PathBuf::from("/tmp/x.json"),
            source: std::io::Error::other("disk gone"),
        };
        assert!(DraftError::from(io).is_retryable());
        assert!(!DraftError::PrefixViolation.is_retryable());
        assert!(!DraftError::NotOwner.is_retryable());
    }

    #[test]
    fn store_rejections_map_to_semantic_kinds() {
        let id = DraftId::new();
        assert_eq!(DraftError::from(StoreError::Closed(id)).kind(), "draft_closed");
        assert_eq!(
            DraftError::from(StoreError::AlreadyCompleted(id)).kind(),
            "already_completed"
        );
        assert_eq!(DraftError::from(StoreError::NotFound(id)).kind(), "not_found");
    }
}
