//! Core library for codraft: collaborative drafting in bounded steps.
//!
//! A draft is a text that several people extend in turn. Every contribution
//! is a full snapshot that must keep the previous snapshot as its prefix and
//! add at most the draft's limit of words, sentences, or paragraphs.
//!
//! # Modules
//!
//! - [`text`] - word, sentence, paragraph and line counts
//! - [`validate`] - the accept/reject decision for a proposed snapshot
//! - [`store`] - append-only contribution logs, in memory or on disk
//! - [`lifecycle`] - draft operations tying the validator to a store
//! - [`config`] - configuration loading and discovery
//! - [`error`] - error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use codraft_core::{Drafts, LimitUnit, MemoryStore, NewDraft, UserId};
//!
//! let drafts = Drafts::new(MemoryStore::new());
//! let ada = UserId::from("ada");
//! let id = drafts
//!     .create_draft(&ada, NewDraft {
//!         title: "The Cat".into(),
//!         category: "fiction".into(),
//!         unit: LimitUnit::Words,
//!         quantity: 5,
//!         initial_text: "The cat sat.".into(),
//!     })
//!     .unwrap();
//!
//! let added = drafts
//!     .add_contribution(id, &UserId::from("bo"), "The cat sat. It was happy today.")
//!     .unwrap();
//! assert_eq!(added.delta, 4);
//! ```
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod text;
pub mod validate;

pub use config::{Config, ConfigLoader, ConfigSources, DEFAULT_MAX_INPUT_BYTES, LogLevel};
pub use error::{ConfigError, ConfigResult, DraftError, DraftResult, StoreError, StoreResult};
pub use lifecycle::{Added, Drafts, UserDrafts};
pub use model::{
    Contribution, ContributionId, Draft, DraftId, DraftState, Limit, LimitUnit, NewDraft, UserId,
};
pub use store::{DraftStore, FileStore, MemoryStore};
pub use text::TextMetrics;
pub use validate::{Accepted, HistoryAudit, validate_contribution};
