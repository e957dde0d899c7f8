//! Word-list categories.
//!
//! A category is a named set of literal terms (military units, clinic
//! names, ...). Each enabled category becomes one detector named
//! `category:<name>`; matches carry the category name as their type so a
//! replacement pool of the same name can serve them.

use super::{hebrew, Detector, PiiMatch, PiiType, Priority};

/// Prefix of category detector names.
pub const CATEGORY_PREFIX: &str = "category:";

#[derive(Debug, Clone)]
pub struct CategoryDetector {
    detector_name: String,
    category: String,
    words: Vec<String>,
}

impl CategoryDetector {
    pub fn new<I, S>(category: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let category = category.into();
        let mut words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        // Longer words first so a short word cannot claim a span a longer
        // word of the same list also covers.
        words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        words.dedup();

        Self {
            detector_name: format!("{}{}", CATEGORY_PREFIX, category),
            category,
            words,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Detector for CategoryDetector {
    fn name(&self) -> &str {
        &self.detector_name
    }

    fn priority(&self) -> Priority {
        Priority::Category
    }

    fn detect(&self, text: &str) -> Vec<PiiMatch> {
        let mut matches = Vec::new();
        for word in &self.words {
            for (start, end) in hebrew::occurrences(text, word) {
                matches.push(
                    PiiMatch::new(
                        word.clone(),
                        PiiType::Other(self.category.clone()),
                        start,
                        end,
                        Priority::Category,
                    )
                    .with_pattern_name(self.detector_name.clone()),
                );
            }
        }
        matches
    }
}
