//! Sentence segmentation.
//!
//! A character scan that treats `.`, `!` and `?` as candidate boundaries and
//! rejects the ones that belong to abbreviations, initials, decimal numbers,
//! URLs, or ellipses. A blank line also ends a sentence.
//!
//! An abbreviation or initial still ends a sentence when the next word is a
//! capitalized common sentence opener ("plan B. Then", "5 p.m. It"). Titles
//! such as `Dr.` never do.

use regex::Regex;
use std::sync::LazyLock;

use super::abbreviations::{is_abbreviation, is_title};

/// Initials such as `J.K.` or `U.S.A.`
static INITIALS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z]\.)+[A-Z]?$").expect("valid regex"));

/// Words that commonly open a sentence, lowercased.
const SENTENCE_OPENERS: &[&str] = &[
    "a", "after", "and", "as", "at", "but", "he", "her", "his", "i", "if", "in", "it", "its",
    "my", "no", "now", "on", "our", "she", "so", "that", "the", "their", "then", "there",
    "these", "they", "this", "those", "we", "what", "when", "where", "while", "yes", "you",
];

/// Split text into sentences.
///
/// Returned sentences are trimmed. Fragments with no letters or digits
/// (stray punctuation, list bullets) are dropped.
#[tracing::instrument(level = "trace", skip_all, fields(text_len = text.len()))]
pub fn split_sentences(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        current.push(ch);
        let mut last = i;

        let boundary = if is_sentence_terminator(ch) {
            // Closing quotes and brackets stay with the sentence they close.
            last = skip_closers(&chars, i);
            current.extend(&chars[i + 1..=last]);
            let context = extract_context(&chars, i, last);
            is_sentence_boundary(&context, &current)
        } else {
            ch == '\n' && starts_blank_line(&chars, i + 1)
        };

        if boundary {
            flush(&mut sentences, &mut current);
        }
        i = last + 1;
    }

    flush(&mut sentences, &mut current);
    sentences
}

fn flush(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if sentence.chars().any(char::is_alphanumeric) {
        sentences.push(sentence.to_string());
    }
    current.clear();
}

const fn is_sentence_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

const fn is_closer(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

fn skip_closers(chars: &[char], pos: usize) -> usize {
    let mut last = pos;
    while chars.get(last + 1).copied().is_some_and(is_closer) {
        last += 1;
    }
    last
}

fn starts_blank_line(chars: &[char], from: usize) -> bool {
    chars[from..]
        .iter()
        .find(|c| !matches!(c, ' ' | '\t' | '\r'))
        .is_some_and(|&c| c == '\n')
}

/// Context around a potential sentence boundary.
struct SentenceContext {
    punctuation: char,
    word_before: String,
    /// The terminator is immediately followed by a non-space character.
    glued: bool,
    char_after: Option<char>,
    second_char_after: Option<char>,
    /// The next word, with any opening quote skipped.
    word_after: String,
}

fn extract_context(chars: &[char], pos: usize, last: usize) -> SentenceContext {
    let glued = chars.get(last + 1).is_some_and(|c| !c.is_whitespace());

    let mut after = last + 1;
    while after < chars.len() && chars[after].is_whitespace() {
        after += 1;
    }

    let word_start = if chars.get(after).copied().is_some_and(is_opening_quote) {
        after + 1
    } else {
        after
    };
    let word_after = chars
        .get(word_start..)
        .unwrap_or_default()
        .iter()
        .take_while(|c| c.is_alphanumeric())
        .collect();

    SentenceContext {
        punctuation: chars[pos],
        word_before: get_word_before(chars, pos),
        glued,
        char_after: chars.get(after).copied(),
        second_char_after: chars.get(after + 1).copied(),
        word_after,
    }
}

fn get_word_before(chars: &[char], pos: usize) -> String {
    let mut start = pos;
    while start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '.') {
        start -= 1;
    }
    chars[start..pos].iter().collect()
}

fn is_sentence_boundary(context: &SentenceContext, current_sentence: &str) -> bool {
    let Some(next_char) = context.char_after else {
        // Nothing but whitespace remains.
        return true;
    };

    // "3.14", "e.g.,", "www.example.com", "?!"
    if context.glued {
        return false;
    }

    if context.punctuation == '!' || context.punctuation == '?' {
        return !next_starts_lowercase(context);
    }

    if current_sentence.trim_end_matches(is_closer).ends_with("...") {
        return false;
    }

    if is_title(&context.word_before) {
        return false;
    }

    if is_likely_abbreviation(&context.word_before) || is_likely_initial(&context.word_before) {
        return opens_sentence(&context.word_after);
    }

    !next_char.is_lowercase()
}

fn next_starts_lowercase(context: &SentenceContext) -> bool {
    match context.char_after {
        Some(c) if is_opening_quote(c) => context.second_char_after.is_some_and(char::is_lowercase),
        Some(c) => c.is_lowercase(),
        None => false,
    }
}

const fn is_opening_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '\u{201C}' | '\u{2018}')
}

fn is_likely_abbreviation(word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    if is_abbreviation(word) {
        return true;
    }
    // A lone capital other than the pronoun "I" is usually an initial.
    let mut letters = word.chars();
    matches!(
        (letters.next(), letters.next()),
        (Some(c), None) if c.is_uppercase() && c != 'I'
    )
}

fn is_likely_initial(word: &str) -> bool {
    word.contains('.') && INITIALS_PATTERN.is_match(word)
}

fn opens_sentence(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
        && SENTENCE_OPENERS.contains(&word.to_lowercase().as_str())
}
