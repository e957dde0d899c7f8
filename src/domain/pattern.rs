//! Regex pattern detection with optional validation.
//!
//! Patterns are compiled and checked when the configuration is written
//! (see [`crate::config::compiled`]); this detector only runs them.

use super::{hebrew, Detector, PiiMatch, Priority, ValidationTally};
use crate::config::compiled::CompiledPattern;
use std::collections::HashSet;
use std::sync::Arc;

/// Detector for one configured pattern.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    pattern: Arc<CompiledPattern>,
}

impl PatternDetector {
    pub fn new(pattern: Arc<CompiledPattern>) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }
}

/// Narrows `[start, end)` so it carries no leading or trailing whitespace.
fn trim_span(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return (start, start);
    }
    (start + leading, end - trailing)
}

impl Detector for PatternDetector {
    fn name(&self) -> &str {
        &self.pattern.definition.name
    }

    fn priority(&self) -> Priority {
        Priority::Pattern
    }

    fn detect(&self, text: &str) -> Vec<PiiMatch> {
        self.detect_tallied(text, &mut ValidationTally::default())
    }

    fn detect_tallied(&self, text: &str, tally: &mut ValidationTally) -> Vec<PiiMatch> {
        let definition = &self.pattern.definition;
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for caps in self.pattern.regex.captures_iter(text) {
            let Some(group) = caps.get(definition.capture_group) else {
                continue;
            };

            let (start, end) = trim_span(text, group.start(), group.end());
            if start == end || !seen.insert((start, end)) {
                continue;
            }
            if !hebrew::boundary_ok(text, start, end) {
                continue;
            }

            let value = &text[start..end];
            if let Some(validator) = self.pattern.validator {
                let accepted = validator.validate(value);
                tally.record(&definition.name, accepted);
                if !accepted {
                    continue;
                }
            }

            matches.push(
                PiiMatch::new(
                    value,
                    definition.pii_type.clone(),
                    start,
                    end,
                    Priority::Pattern,
                )
                .with_pattern_name(definition.name.clone()),
            );
        }

        matches.sort_by_key(|m| (m.start, m.end));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternDefinition;
    use crate::domain::PiiType;

    fn detector(definition: PatternDefinition) -> PatternDetector {
        PatternDetector::new(Arc::new(
            CompiledPattern::compile(definition).expect("valid pattern"),
        ))
    }

    #[test]
    fn test_phone_detection() {
        let d = detector(PatternDefinition::new(
            "phone",
            PiiType::Phone,
            r"0[5][0-9][-־]?\d{7}",
        ));
        let matches = d.detect("טלפון: 058-6045454");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "058-6045454");
        assert_eq!(matches[0].pii_type, PiiType::Phone);
        assert_eq!(matches[0].pattern_name.as_deref(), Some("phone"));
    }

    #[test]
    fn test_capture_group_selects_value() {
        let d = detector(
            PatternDefinition::new(
                "hebrew_first_name",
                PiiType::Name,
                r"שם\s+פרטי\s*[:\-]?\s*([\x{05D0}-\x{05EA}']+)",
            )
            .with_capture_group(1),
        );
        let text = "שם פרטי\nמיכאל";
        let matches = d.detect(text);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "מיכאל");
        assert_eq!(&text[matches[0].start..matches[0].end], "מיכאל");
    }

    #[test]
    fn test_validator_rejects_bad_checksum() {
        let d = detector(
            PatternDefinition::new("israeli_id", PiiType::Id, r"\b\d{9}\b")
                .with_validator("israeli_id_checksum"),
        );
        assert_eq!(d.detect("תעודת זהות: 123456782").len(), 1);

        let mut tally = ValidationTally::default();
        assert!(d.detect_tallied("תעודת זהות: 123456789", &mut tally).is_empty());
        assert_eq!(tally.fully_rejected().count(), 1);
    }

    #[test]
    fn test_whitespace_is_trimmed_from_span() {
        let d = detector(
            PatternDefinition::new("label", PiiType::Other("CASE".into()), r"Case:(\s*\d+\s*)")
                .with_capture_group(1),
        );
        let text = "Case:  4411  end";
        let matches = d.detect(text);
        assert_eq!(matches[0].text, "4411");
        assert_eq!(&text[matches[0].start..matches[0].end], "4411");
    }

    #[test]
    fn test_hebrew_only_match_inside_word_is_dropped() {
        let d = detector(PatternDefinition::new(
            "maor",
            PiiType::Name,
            r"מאור",
        ));
        assert!(d.detect("מאורגנת").is_empty());
        assert_eq!(d.detect("מאור הלך").len(), 1);
    }
}
