//! Abbreviations that end in a period without ending a sentence.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Titles written before a name; a sentence never ends on one.
const TITLES: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "rev", "fr", "messrs", "mmes", "msgr", "hon", "capt", "col",
    "gen", "lt", "maj", "sgt", "cpl", "pvt", "adm", "cmdr", "sen", "rep", "gov", "pres", "supt",
    "insp", "st",
];

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "esq"];

const DEGREES: &[&str] = &[
    "b.a", "b.s", "m.a", "m.s", "m.b.a", "ph.d", "m.d", "j.d", "ll.b", "ll.m", "d.d.s", "d.v.m",
    "ed.d", "psy.d", "phd",
];

const LATIN: &[&str] = &[
    "etc", "vs", "e.g", "i.e", "al", "cf", "viz", "ibid", "n.b", "p.s", "r.s.v.p", "ca", "approx",
];

// No entry may also be an everyday word ("sat", "sun", "in", "no", "art").
const CALENDAR: &[&str] = &[
    "a.m", "p.m", "b.c", "a.d", "c.e", "b.c.e", "jan", "feb", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec", "mon", "tue", "tues", "thu", "thur", "thurs", "fri",
];

const PLACES: &[&str] = &[
    "ave", "blvd", "rd", "ln", "apt", "ste", "rm", "fl", "bldg", "dept", "mt", "ft", "u.s",
    "u.k", "u.s.a", "e.u",
];

const ORGANIZATIONS: &[&str] = &["inc", "corp", "ltd", "llc", "co", "bros", "assn", "intl"];

const MEASURES: &[&str] = &[
    "oz", "lb", "lbs", "kg", "mg", "ml", "cm", "mm", "km", "yd", "mi", "sq", "mph", "hr", "hrs",
];

const REFERENCES: &[&str] = &[
    "vol", "vols", "nos", "pp", "ch", "chap", "figs", "eq", "eds", "ref", "refs",
];

static ABBREVIATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        TITLES,
        NAME_SUFFIXES,
        DEGREES,
        LATIN,
        CALENDAR,
        PLACES,
        ORGANIZATIONS,
        MEASURES,
        REFERENCES,
    ]
    .into_iter()
    .flatten()
    .copied()
    .collect()
});

/// Whether `word` (with or without its trailing period) is a known abbreviation.
///
/// Matching is case-insensitive.
pub fn is_abbreviation(word: &str) -> bool {
    let lowered = word.to_lowercase();
    ABBREVIATIONS.contains(lowered.trim_matches('.'))
}

/// Whether `word` is a title such as `Dr` that always precedes a name.
pub fn is_title(word: &str) -> bool {
    let lowered = word.to_lowercase();
    TITLES.contains(&lowered.trim_matches('.'))
}
