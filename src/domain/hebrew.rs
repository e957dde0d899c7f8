//! Hebrew-aware word boundaries.
//!
//! A term written only in Hebrew letters must match a whole token: an
//! occurrence directly preceded or followed by another Hebrew letter is
//! part of a longer word and is rejected. Terms in any other script match
//! as plain substrings. Every detector and the literal substituter go
//! through [`occurrences`] or [`boundary_ok`], so there is one definition
//! of the rule.

/// Hebrew geresh, used like an apostrophe in transliterated names.
const GERESH: char = '\u{05F3}';

/// True for the 27 Hebrew letters, final forms included (א..ת).
pub fn is_hebrew_letter(c: char) -> bool {
    ('\u{05D0}'..='\u{05EA}').contains(&c)
}

/// True when `term` is written purely in Hebrew.
///
/// At least one Hebrew letter is required; every other non-whitespace
/// character must be an apostrophe or geresh.
pub fn is_hebrew_term(term: &str) -> bool {
    let mut has_letter = false;
    for c in term.chars() {
        if is_hebrew_letter(c) {
            has_letter = true;
        } else if !(c == '\'' || c == GERESH || c.is_whitespace()) {
            return false;
        }
    }
    has_letter
}

/// True when the span `[start, end)` of `haystack` is not glued to a
/// neighbouring Hebrew letter on either side.
pub fn is_standalone(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(is_hebrew_letter) && !after.is_some_and(is_hebrew_letter)
}

/// Boundary check for an arbitrary span: Hebrew-only spans must be
/// standalone, everything else always passes.
pub fn boundary_ok(haystack: &str, start: usize, end: usize) -> bool {
    !is_hebrew_term(&haystack[start..end]) || is_standalone(haystack, start, end)
}

/// All occurrences of `needle` in `haystack` as byte spans, honouring the
/// Hebrew boundary rule. Occurrences may overlap each other; the resolver
/// sorts that out.
pub fn occurrences(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }

    let hebrew = is_hebrew_term(needle);
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        if !hebrew || is_standalone(haystack, start, end) {
            spans.push((start, end));
        }
        // Step one character so overlapping occurrences are still seen.
        let step = haystack[start..].chars().next().map_or(1, char::len_utf8);
        from = start + step;
    }

    spans
}
