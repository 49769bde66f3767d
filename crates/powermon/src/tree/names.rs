//! Label normalization.
//!
//! Producer-generated friendly names carry noise such as
//! `"Kitchen selected entities - Power"`. Everything here is a pure function
//! over strings and never leaves leading or trailing whitespace behind.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Longest label line before wrapping.
pub const LABEL_LINE_LENGTH: usize = 15;

static SELECTED_ENTITIES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*selected entities\s*-\s*").expect("selected-entities pattern is valid")
});

static MEASUREMENT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s?\b(?:selected entities - )?(?:power|leistung|energy|energie)\b\s*$")
        .expect("measurement suffix pattern is valid")
});

static LISTING_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i) selected entities -").expect("listing marker pattern is valid")
});

static LISTING_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i) (?:power|energy)$").expect("listing suffix pattern is valid")
});

/// How [`strip_ancestor_prefix`] compares the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMatch {
    /// Used for room labels.
    Exact,
    /// Used for leaf sensor labels.
    IgnoreCase,
}

/// Normalize a tree label.
///
/// Removes every `selected entities -` marker, then one trailing
/// power/energy word (English or German).
pub fn normalize(raw: &str) -> String {
    let unmarked = SELECTED_ENTITIES_RE.replace_all(raw, " ");
    let stripped = MEASUREMENT_SUFFIX_RE.replace(unmarked.trim(), "");
    stripped.trim().to_string()
}

/// Normalize a label for the room selector.
///
/// Only the literal ` Power` / ` Energy` suffix is removed here.
pub fn room_label(raw: &str) -> String {
    let unmarked = LISTING_MARKER_RE.replace_all(raw, "");
    let stripped = LISTING_SUFFIX_RE.replace(&unmarked, "");
    stripped.trim().to_string()
}

/// Remove `prefix` from the start of `name` once.
///
/// An empty prefix, or a name that does not start with it, leaves the name
/// unchanged.
pub fn strip_ancestor_prefix(name: &str, prefix: &str, matching: PrefixMatch) -> String {
    if prefix.is_empty() {
        return name.to_string();
    }

    let rest = match matching {
        PrefixMatch::Exact => name.strip_prefix(prefix),
        PrefixMatch::IgnoreCase => strip_prefix_ignore_case(name, prefix),
    };

    match rest {
        Some(rest) => rest.trim().to_string(),
        None => name.to_string(),
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let mut name_chars = name.char_indices();
    for p in prefix.chars() {
        let (_, n) = name_chars.next()?;
        if !n.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let rest_start = name_chars.next().map_or(name.len(), |(i, _)| i);
    Some(&name[rest_start..])
}

/// Base letters of `s`: decomposed, accents dropped, lowercased.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Decomposed and lowercased, accents kept.
fn folded_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

/// Order labels the way a human-facing list expects.
///
/// Base letters compare first, so `Ä` sorts with `A` and `Küche` before
/// `Kuh`. Ties are broken by accents, then lowercase before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded_letters(a).cmp(folded_letters(b)))
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .find(|(x, y)| x != y)
                .map_or(Ordering::Equal, |(x, _)| {
                    if x.is_lowercase() {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                })
        })
        .then_with(|| a.cmp(b))
}

/// Wrap a label into lines of at most `max_line_length` characters, breaking
/// at spaces. A word longer than the limit gets a line of its own.
pub fn split_label(text: &str, max_line_length: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        if !current.is_empty()
            && current.chars().count() + word.chars().count() > max_line_length
        {
            lines.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(word);
        current.push(' ');
    }

    let last = current.trim();
    if !last.is_empty() {
        lines.push(last.to_string());
    }

    lines
}
