//! Drafts, contributions, and the identifiers that tie them together.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DraftError, DraftResult};

/// Maximum length, in characters, of a draft title or category.
pub const MAX_LABEL_CHARS: usize = 50;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh, time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identity of a draft.
    DraftId
);

uuid_id!(
    /// Identity of a single contribution.
    ContributionId
);

/// Opaque identity of a user, issued by whatever authenticates requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an externally issued user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Granularity used to measure how much a contribution adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LimitUnit {
    /// Runs of word characters.
    Words,
    /// Sentences, as found by the sentence splitter.
    Sentences,
    /// Non-blank lines.
    Paragraphs,
}

impl LimitUnit {
    /// Returns the unit as a lowercase plural noun.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Sentences => "sentences",
            Self::Paragraphs => "paragraphs",
        }
    }
}

impl fmt::Display for LimitUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimitUnit {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "words" | "word" => Ok(Self::Words),
            "sentences" | "sentence" => Ok(Self::Sentences),
            "paragraphs" | "paragraph" => Ok(Self::Paragraphs),
            other => Err(DraftError::InvalidLimit {
                reason: format!("unknown unit '{other}'. Use: words, sentences, paragraphs"),
            }),
        }
    }
}

/// How much a single contribution may add to a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Limit {
    /// Measurement unit.
    pub unit: LimitUnit,
    /// Maximum number of units per contribution; always positive.
    pub quantity: u32,
}

impl Limit {
    /// Build a limit, rejecting non-positive or oversized quantities.
    pub fn new(unit: LimitUnit, quantity: i64) -> DraftResult<Self> {
        if quantity <= 0 {
            return Err(DraftError::InvalidLimit {
                reason: format!("quantity must be positive, got {quantity}"),
            });
        }
        let quantity = u32::try_from(quantity).map_err(|_| DraftError::InvalidLimit {
            reason: format!("quantity {quantity} is too large"),
        })?;
        Ok(Self { unit, quantity })
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.unit)
    }
}

/// Lifecycle state of a draft. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DraftState {
    /// Accepting contributions.
    Open,
    /// Closed by its creator.
    Completed,
}

impl DraftState {
    /// Returns the state as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }
}

/// A collaboratively written text with a per-contribution limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Draft {
    /// Draft identity.
    pub id: DraftId,
    /// Human-readable title.
    pub title: String,
    /// Free-form category (genre, topic, ...).
    pub category: String,
    /// User who created the draft and alone may complete it.
    pub creator: UserId,
    /// Per-contribution limit.
    pub limit: Limit,
    /// Set once, by the creator. Never reset.
    pub completed: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Draft {
    /// Current lifecycle state.
    pub const fn state(&self) -> DraftState {
        if self.completed {
            DraftState::Completed
        } else {
            DraftState::Open
        }
    }
}

/// One immutable full-text snapshot in a draft's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Contribution {
    /// Contribution identity.
    pub id: ContributionId,
    /// Owning draft.
    pub draft: DraftId,
    /// Who wrote it; used for attribution only.
    pub author: UserId,
    /// The complete draft text after this contribution.
    pub text: String,
    /// When it was recorded. Never earlier than its predecessor's.
    pub timestamp: DateTime<Utc>,
    /// Zero-based position in the draft's history; breaks timestamp ties.
    pub seq: u64,
}

/// Request to create a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewDraft {
    /// Title, 1 to 50 characters.
    pub title: String,
    /// Category, 1 to 50 characters.
    pub category: String,
    /// Unit for the per-contribution limit.
    pub unit: LimitUnit,
    /// Units allowed per contribution; must be positive.
    pub quantity: i64,
    /// The creator's opening text, recorded as the first contribution.
    pub initial_text: String,
}

impl NewDraft {
    /// Check required fields and the limit, returning the parsed limit.
    pub fn validate(&self) -> DraftResult<Limit> {
        check_label("title", &self.title)?;
        check_label("category", &self.category)?;
        if self.initial_text.trim().is_empty() {
            return Err(DraftError::InvalidDraft {
                field: "initial_text",
                reason: "must not be empty".to_string(),
            });
        }
        Limit::new(self.unit, self.quantity)
    }
}

fn check_label(field: &'static str, value: &str) -> DraftResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DraftError::InvalidDraft {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    let chars = value.chars().count();
    if chars > MAX_LABEL_CHARS {
        return Err(DraftError::InvalidDraft {
            field,
            reason: format!("{chars} characters (max {MAX_LABEL_CHARS})"),
        });
    }
    Ok(())
}
