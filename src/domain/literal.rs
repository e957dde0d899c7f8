//! Exact-match detection of literal terms.
//!
//! Used for the keys of `user_replacements` and of the server's
//! `default_replacements`: whatever the caller asked to replace is found
//! verbatim (case-sensitive, Hebrew-boundary aware).

use super::{hebrew, Detector, PiiMatch, PiiType, Priority};

/// Detector name for request-level replacement keys.
pub const USER_DEFINED: &str = "user_defined";

/// Detector name for server-level replacement keys.
pub const DEFAULT_REPLACEMENTS: &str = "default_replacements";

/// Finds every occurrence of a fixed set of terms.
#[derive(Debug, Clone)]
pub struct LiteralDetector {
    name: String,
    priority: Priority,
    terms: Vec<String>,
}

impl LiteralDetector {
    pub fn new<I, S>(name: impl Into<String>, priority: Priority, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        terms.sort();
        terms.dedup();

        Self {
            name: name.into(),
            priority,
            terms,
        }
    }

    /// Detector over the request's `user_replacements` keys.
    pub fn user_defined<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(USER_DEFINED, Priority::UserDefined, terms)
    }

    /// Detector over the server's `default_replacements` keys.
    pub fn default_replacements<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(DEFAULT_REPLACEMENTS, Priority::DefaultReplacement, terms)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Detector for LiteralDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn detect(&self, text: &str) -> Vec<PiiMatch> {
        let mut matches = Vec::new();
        for term in &self.terms {
            for (start, end) in hebrew::occurrences(text, term) {
                matches.push(
                    PiiMatch::new(term.clone(), PiiType::UserDefined, start, end, self.priority)
                        .with_pattern_name(self.name.clone()),
                );
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_every_occurrence() {
        let detector = LiteralDetector::user_defined(["מיכאל"]);
        let text = "מיכאל הלך. מיכאל חזר.";
        let matches = detector.detect(text);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| &text[m.start..m.end] == "מיכאל"));
        assert!(matches.iter().all(|m| m.priority == Priority::UserDefined));
    }

    #[test]
    fn test_is_case_sensitive() {
        let detector = LiteralDetector::user_defined(["John"]);
        assert!(detector.detect("john JOHN").is_empty());
        assert_eq!(detector.detect("John john").len(), 1);
    }

    #[test]
    fn test_respects_hebrew_boundary() {
        let detector = LiteralDetector::default_replacements(["מאור"]);
        assert!(detector.detect("מאורגנת").is_empty());
        assert_eq!(detector.detect("מאור הלך").len(), 1);
    }

    #[test]
    fn test_blank_terms_are_dropped() {
        let detector = LiteralDetector::user_defined(["", "  ", "x", "x"]);
        assert_eq!(detector.terms(), &["x".to_string()]);
    }
}
