//! Contribution validation.
//!
//! Decides whether a proposed text is a legal successor to a draft's current
//! text. A legal successor keeps the current text as a literal prefix (after
//! trimming surrounding whitespace from both) and adds between one and
//! `limit.quantity` units. The whole texts are compared on every call, so
//! any stored snapshot can be re-checked on its own.
//!
//! Nothing here touches storage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DraftError, DraftResult};
use crate::model::{DraftState, Limit};
use crate::text;

/// A contribution that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Units added, always in `1..=limit.quantity`.
    pub delta: i64,
    /// The proposed text, unchanged, to be stored as the new snapshot.
    pub snapshot: String,
}

/// Validate `proposed` as the successor of `current`.
///
/// Checks run in a fixed order and the first failure wins: closed draft,
/// empty proposal, prefix, no new content, over the limit.
#[tracing::instrument(
    level = "debug",
    skip(current, proposed),
    fields(current_len = current.len(), proposed_len = proposed.len())
)]
pub fn validate_contribution(
    current: &str,
    proposed: &str,
    limit: Limit,
    state: DraftState,
) -> DraftResult<Accepted> {
    if state == DraftState::Completed {
        return Err(DraftError::DraftClosed);
    }

    if proposed.trim().is_empty() {
        return Err(DraftError::EmptyContribution);
    }

    if !extends(current, proposed) {
        return Err(DraftError::PrefixViolation);
    }

    let delta = delta(current, proposed, limit);
    if delta <= 0 {
        return Err(DraftError::NoNewContent { delta });
    }
    if delta > i64::from(limit.quantity) {
        return Err(DraftError::LimitExceeded { delta, limit });
    }

    tracing::debug!(delta, "contribution accepted");
    Ok(Accepted {
        delta,
        snapshot: proposed.to_string(),
    })
}

/// Whether `proposed` keeps `current` as its literal prefix.
///
/// Only leading and trailing whitespace is ignored; whitespace inside either
/// text must match exactly.
pub fn extends(current: &str, proposed: &str) -> bool {
    proposed.trim().starts_with(current.trim())
}

/// Signed change in `limit.unit` between `current` and `proposed`.
pub fn delta(current: &str, proposed: &str, limit: Limit) -> i64 {
    let before = text::measure(current, limit.unit);
    let after = text::measure(proposed, limit.unit);
    to_i64(after) - to_i64(before)
}

fn to_i64(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// One step of a stored history that would not pass validation today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryViolation {
    /// Position of the offending snapshot, oldest first, starting at 0.
    pub seq: u64,
    /// Stable error code (see [`DraftError::kind`]).
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

/// Result of re-checking a draft's whole history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryAudit {
    /// Number of snapshots examined.
    pub snapshots: usize,
    /// Every step that fails validation.
    pub violations: Vec<HistoryViolation>,
}

impl HistoryAudit {
    /// Whether every step is a legal extension of its predecessor.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Re-validate a history given oldest first.
///
/// The first snapshot is the draft's seed and only has to be non-empty.
/// Every later snapshot must be a legal successor of the one before it.
#[tracing::instrument(level = "debug", skip(snapshots))]
pub fn verify_history<'a, I>(limit: Limit, snapshots: I) -> HistoryAudit
where
    I: IntoIterator<Item = &'a str>,
{
    let mut violations = Vec::new();
    let mut previous: Option<&str> = None;
    let mut count = 0;

    for (seq, snapshot) in (0u64..).zip(snapshots) {
        count += 1;
        let outcome = match previous {
            None if snapshot.trim().is_empty() => Err(DraftError::EmptyContribution),
            None => Ok(()),
            Some(prev) => validate_contribution(prev, snapshot, limit, DraftState::Open).map(drop),
        };
        if let Err(err) = outcome {
            violations.push(HistoryViolation {
                seq,
                kind: err.kind().to_string(),
                message: err.to_string(),
            });
        }
        previous = Some(snapshot);
    }

    HistoryAudit {
        snapshots: count,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LimitUnit;

    fn words(quantity: i64) -> Limit {
        Limit::new(LimitUnit::Words, quantity).unwrap()
    }

    const SEED: &str = "The cat sat.";

    #[test]
    fn accepts_bounded_extension() {
        let accepted = validate_contribution(
            SEED,
            "The cat sat. It was happy today.",
            words(5),
            DraftState::Open,
        )
        .unwrap();
        assert_eq!(accepted.delta, 4);
        assert_eq!(accepted.snapshot, "The cat sat. It was happy today.");
    }

    #[test]
    fn rejects_over_limit() {
        let current = "The cat sat. It was happy today.";
        let proposed = "The cat sat. It was happy today. Then it ran far away quickly.";
        let err = validate_contribution(current, proposed, words(5), DraftState::Open).unwrap_err();
        assert!(matches!(err, DraftError::LimitExceeded { delta: 6, .. }));
    }

    #[test]
    fn accepts_exactly_the_limit() {
        let proposed = "The cat sat. One two three four five.";
        let accepted = validate_contribution(SEED, proposed, words(5), DraftState::Open).unwrap();
        assert_eq!(accepted.delta, 5);
    }

    #[test]
    fn rejects_rewritten_prefix() {
        let err =
            validate_contribution(SEED, "The dog sat.", words(5), DraftState::Open).unwrap_err();
        assert!(matches!(err, DraftError::PrefixViolation));
    }

    #[test]
    fn rejects_unchanged_text() {
        let err = validate_contribution(SEED, SEED, words(5), DraftState::Open).unwrap_err();
        assert!(matches!(err, DraftError::NoNewContent { delta: 0 }));
    }

    #[test]
    fn rejects_punctuation_only_addition() {
        let err = validate_contribution(SEED, "The cat sat. ...", words(5), DraftState::Open)
            .unwrap_err();
        assert!(matches!(err, DraftError::NoNewContent { delta: 0 }));
    }

    #[test]
    fn rejects_when_closed_before_anything_else() {
        let err = validate_contribution(SEED, "", words(5), DraftState::Completed).unwrap_err();
        assert!(matches!(err, DraftError::DraftClosed));
    }

    #[test]
    fn rejects_blank_proposal() {
        let err = validate_contribution(SEED, " \n\t", words(5), DraftState::Open).unwrap_err();
        assert!(matches!(err, DraftError::EmptyContribution));
    }

    #[test]
    fn surrounding_whitespace_is_ignored_but_inner_is_not() {
        let padded = validate_contribution(
            "  The cat sat.\n",
            "The cat sat. Meow.  ",
            words(5),
            DraftState::Open,
        );
        assert!(padded.is_ok());

        let reflowed =
            validate_contribution(SEED, "The  cat sat. Meow.", words(5), DraftState::Open);
        assert!(matches!(reflowed, Err(DraftError::PrefixViolation)));
    }

    #[test]
    fn empty_current_accepts_any_bounded_text() {
        let accepted =
            validate_contribution("", "Once upon a time.", words(5), DraftState::Open).unwrap();
        assert_eq!(accepted.delta, 4);
    }

    #[test]
    fn merging_paragraphs_counts_as_no_new_content() {
        let limit = Limit::new(LimitUnit::Paragraphs, 2).unwrap();
        // Prefix kept, words added, but the paragraph count does not grow.
        let err =
            validate_contribution("One\nTwo", "One\nTwo and more words", limit, DraftState::Open)
                .unwrap_err();
        assert!(matches!(err, DraftError::NoNewContent { delta: 0 }));
    }

    #[test]
    fn sentence_limit_counts_sentences() {
        let limit = Limit::new(LimitUnit::Sentences, 1).unwrap();
        let ok = validate_contribution(SEED, "The cat sat. It purred.", limit, DraftState::Open);
        assert_eq!(ok.unwrap().delta, 1);

        let proposed = "The cat sat. It purred. It slept.";
        let too_many = validate_contribution(SEED, proposed, limit, DraftState::Open);
        assert!(matches!(too_many, Err(DraftError::LimitExceeded { delta: 2, .. })));
    }

    #[test]
    fn sentence_after_single_letter_counts_toward_limit() {
        let limit = Limit::new(LimitUnit::Sentences, 1).unwrap();
        let current = "We chose plan A.";
        let proposed = "We chose plan A. Then plan B. Then it slept.";
        let result = validate_contribution(current, proposed, limit, DraftState::Open);
        assert!(matches!(result, Err(DraftError::LimitExceeded { delta: 2, .. })));
    }

    #[test]
    fn verify_history_flags_bad_steps() {
        let snapshots = [
            "The cat sat.",
            "The cat sat. It was happy.",
            "The dog sat. It was happy. Really.",
            "The dog sat. It was happy. Really.",
        ];
        let audit = verify_history(words(5), snapshots);
        assert_eq!(audit.snapshots, 4);
        assert!(!audit.is_clean());
        let kinds: Vec<_> = audit
            .violations
            .iter()
            .map(|v| (v.seq, v.kind.as_str()))
            .collect();
        assert_eq!(kinds, vec![(2, "prefix_violation"), (3, "no_new_content")]);
    }

    #[test]
    fn verify_history_accepts_clean_log() {
        let audit = verify_history(words(3), ["Hi.", "Hi. Hello there.", "Hi. Hello there. Bye."]);
        assert!(audit.is_clean());
        assert_eq!(audit.snapshots, 3);
    }
}
