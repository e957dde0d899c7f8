//! Custom assertions for anonymization testing.
//!
//! Provides domain-specific assertions that make tests more readable
//! and provide better error messages.

use anonymizer::ExtractResponse;

/// Asserts that no accepted match of any page overlaps another.
///
/// # Panics
/// Panics on the first pair of overlapping matches.
pub fn assert_no_overlaps(response: &ExtractResponse) {
    for page in &response.pages {
        for pair in page.matches.windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "Matches overlap on page {}: {:?} and {:?}",
                page.page_number,
                pair[0],
                pair[1]
            );
        }
    }
}

/// Asserts that every reported match carries the substitute recorded for
/// its original in `mappings_used`.
///
/// # Panics
/// Panics if a match has no replacement or disagrees with the mapping.
pub fn assert_consistent_mappings(response: &ExtractResponse) {
    for page in &response.pages {
        for m in &page.matches {
            let expected = response.mappings_used.get(m.text.trim());
            assert_eq!(
                m.replacement.as_ref(),
                expected,
                "Match '{}' on page {} disagrees with mappings_used",
                m.text,
                page.page_number
            );
        }
    }
}

/// Asserts that `text` contains none of `originals`.
///
/// # Panics
/// Panics listing every original still present.
pub fn assert_all_redacted(text: &str, originals: &[&str]) {
    let found: Vec<_> = originals.iter().filter(|o| text.contains(*o)).collect();
    assert!(
        found.is_empty(),
        "The following values should be redacted but were found: {:?}",
        found
    );
}

/// Asserts that `text` still contains `value`.
///
/// # Panics
/// Panics if the value is missing.
pub fn assert_preserved(text: &str, value: &str) {
    assert!(
        text.contains(value),
        "Value '{}' should be preserved but was not found in:\n{}",
        value,
        text
    );
}
