//! Substitution of resolved matches into text.

use crate::domain::{hebrew, PiiMatch};
use std::collections::BTreeMap;

/// Rebuilds a segment with every match replaced by its assigned substitute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Obfuscator;

impl Obfuscator {
    pub fn new() -> Self {
        Self
    }

    /// Copies unmatched spans and substitutes matched ones, left to right.
    ///
    /// `matches` must be non-overlapping byte spans of `text`, as produced by
    /// the resolver. A match without a replacement, or whose span no longer
    /// holds its text, is left as it is.
    pub fn apply(&self, text: &str, matches: &[PiiMatch]) -> String {
        let mut ordered: Vec<&PiiMatch> = matches.iter().collect();
        ordered.sort_by_key(|m| m.start);

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for m in ordered {
            let Some(replacement) = m.replacement.as_deref() else {
                continue;
            };
            if m.start < cursor || text.get(m.start..m.end) != Some(m.text.as_str()) {
                continue;
            }
            output.push_str(&text[cursor..m.start]);
            output.push_str(replacement);
            cursor = m.end;
        }

        output.push_str(&text[cursor..]);
        output
    }
}

/// Literal, segment-free substitution of a known mapping.
///
/// Used to re-apply a saved `mappings_used` table to text. Longer originals
/// claim their spans before shorter ones, so a short original never splits a
/// longer one it is a substring of.
#[derive(Debug, Clone)]
pub struct LiteralSubstituter {
    /// Originals sorted longest first
    entries: Vec<(String, String)>,
}

impl LiteralSubstituter {
    pub fn new(mappings: &BTreeMap<String, String>) -> Self {
        let mut entries: Vec<(String, String)> = mappings
            .iter()
            .filter(|(original, _)| !original.is_empty())
            .map(|(o, s)| (o.clone(), s.clone()))
            .collect();
        entries.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(&b.0))
        });
        Self { entries }
    }

    /// Returns the substituted text and the number of replacements made.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let mut claimed: BTreeMap<usize, (usize, &str)> = BTreeMap::new();

        for (original, substitute) in &self.entries {
            for (start, end) in hebrew::occurrences(text, original) {
                let free = match claimed.range(..end).next_back() {
                    Some((_, &(taken_end, _))) => taken_end <= start,
                    None => true,
                };
                if free {
                    claimed.insert(start, (end, substitute.as_str()));
                }
            }
        }

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for (&start, &(end, substitute)) in &claimed {
            output.push_str(&text[cursor..start]);
            output.push_str(substitute);
            cursor = end;
        }
        output.push_str(&text[cursor..]);

        (output, claimed.len())
    }
}
