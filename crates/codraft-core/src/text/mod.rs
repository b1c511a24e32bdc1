//! Text metrics.
//!
//! Pure counting functions used to measure how much a contribution adds.
//! Every function returns 0 for the empty string.

mod abbreviations;
mod sentences;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::model::LimitUnit;

pub use sentences::split_sentences;

/// Maximal runs of Unicode word characters.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Count runs of word characters (letters, digits, marks, `_`).
///
/// Punctuation splits words: `don't` counts as two, `state-of-the-art` as four.
pub fn word_count(text: &str) -> usize {
    WORD_PATTERN.find_iter(text).count()
}

/// Count sentences using [`split_sentences`].
pub fn sentence_count(text: &str) -> usize {
    split_sentences(text).len()
}

/// Count lines that are not blank once trimmed.
pub fn paragraph_count(text: &str) -> usize {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .count()
}

/// Count lines, blank ones included.
///
/// `\n`, `\r\n` and a lone `\r` all end a line; a trailing line ending does
/// not start a new, empty line.
pub fn line_count(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => {
                lines += 1;
                open = false;
            }
            '\r' => {
                chars.next_if_eq(&'\n');
                lines += 1;
                open = false;
            }
            _ => open = true,
        }
    }

    if open { lines + 1 } else { lines }
}

/// Measure `text` in the given unit.
pub fn measure(text: &str, unit: LimitUnit) -> usize {
    match unit {
        LimitUnit::Words => word_count(text),
        LimitUnit::Sentences => sentence_count(text),
        LimitUnit::Paragraphs => paragraph_count(text),
    }
}

/// All counts for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TextMetrics {
    /// See [`word_count`].
    pub words: usize,
    /// See [`sentence_count`].
    pub sentences: usize,
    /// See [`paragraph_count`].
    pub paragraphs: usize,
    /// See [`line_count`].
    pub lines: usize,
}

impl TextMetrics {
    /// Compute every metric for `text`.
    #[tracing::instrument(level = "debug", skip_all, fields(text_len = text.len()))]
    pub fn of(text: &str) -> Self {
        Self {
            words: word_count(text),
            sentences: sentence_count(text),
            paragraphs: paragraph_count(text),
            lines: line_count(text),
        }
    }

    /// The count for one unit.
    pub const fn get(&self, unit: LimitUnit) -> usize {
        match unit {
            LimitUnit::Words => self.words,
            LimitUnit::Sentences => self.sentences,
            LimitUnit::Paragraphs => self.paragraphs,
        }
    }
}
