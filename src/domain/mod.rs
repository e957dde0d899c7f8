//! Detection domain: matches, detectors and the rules that merge them.
//!
//! Every detection strategy implements [`Detector`] and reports
//! [`PiiMatch`] candidates over one segment of text. Candidates from all
//! detectors are merged by [`resolver::resolve`] into a single
//! non-overlapping list.

pub mod category;
pub mod hebrew;
pub mod literal;
pub mod names;
pub mod pattern;
pub mod resolver;
pub mod set;
pub mod validator;

pub use category::CategoryDetector;
pub use literal::LiteralDetector;
pub use names::{EnglishNameDetector, HebrewNameDetector};
pub use pattern::PatternDetector;
pub use set::DetectorSet;
pub use validator::Validator;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Category tag of a detected value.
///
/// Well-known tags get their own variant; anything else (a word-list
/// category, `BANK_ACCOUNT`, ...) is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PiiType {
    Name,
    Id,
    Phone,
    Email,
    Address,
    UserDefined,
    Other(String),
}

impl PiiType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "NAME",
            Self::Id => "ID",
            Self::Phone => "PHONE",
            Self::Email => "EMAIL",
            Self::Address => "ADDRESS",
            Self::UserDefined => "USER_DEFINED",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for PiiType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "NAME" => Self::Name,
            "ID" => Self::Id,
            "PHONE" => Self::Phone,
            "EMAIL" => Self::Email,
            "ADDRESS" => Self::Address,
            "USER_DEFINED" => Self::UserDefined,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for PiiType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<PiiType> for String {
    fn from(ty: PiiType) -> Self {
        match ty {
            PiiType::Other(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precedence of a detector when its candidates overlap another's.
///
/// Lower values win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Keys of the request's `user_replacements`
    UserDefined = 0,
    /// Keys of the server's `default_replacements`
    DefaultReplacement = 1,
    /// Word-list categories
    Category = 2,
    /// Configured regex patterns
    Pattern = 3,
    /// Label-anchored name detectors
    Name = 4,
}

/// One detected occurrence of PII inside a text segment.
///
/// `start` and `end` are byte offsets, so `&segment[start..end] == text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiMatch {
    pub text: String,
    pub pii_type: PiiType,
    pub start: usize,
    pub end: usize,
    pub pattern_name: Option<String>,
    pub priority: Priority,
    /// Assigned substitute, filled in by the replacement mapper.
    pub replacement: Option<String>,
}

impl PiiMatch {
    pub fn new(
        text: impl Into<String>,
        pii_type: PiiType,
        start: usize,
        end: usize,
        priority: Priority,
    ) -> Self {
        Self {
            text: text.into(),
            pii_type,
            start,
            end,
            pattern_name: None,
            priority,
            replacement: None,
        }
    }

    pub fn with_pattern_name(mut self, name: impl Into<String>) -> Self {
        self.pattern_name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the two half-open spans share at least one byte.
    pub fn overlaps(&self, other: &PiiMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Per-pattern count of regex hits and validator rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationTally {
    counts: BTreeMap<String, (usize, usize)>,
}

impl ValidationTally {
    pub fn record(&mut self, pattern: &str, accepted: bool) {
        let entry = self.counts.entry(pattern.to_string()).or_default();
        entry.0 += 1;
        if !accepted {
            entry.1 += 1;
        }
    }

    pub fn merge(&mut self, other: ValidationTally) {
        for (name, (seen, rejected)) in other.counts {
            let entry = self.counts.entry(name).or_default();
            entry.0 += seen;
            entry.1 += rejected;
        }
    }

    /// Patterns whose validator rejected every candidate it was shown.
    pub fn fully_rejected(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts
            .iter()
            .filter(|(_, (seen, rejected))| *seen > 0 && seen == rejected)
            .map(|(name, (seen, _))| (name.as_str(), *seen))
    }
}

/// A detection strategy over normalized text.
pub trait Detector: Send + Sync {
    /// Unique name used by `disabled_detectors`.
    fn name(&self) -> &str;

    /// Precedence applied by the resolver.
    fn priority(&self) -> Priority;

    /// Finds every candidate in `text`.
    fn detect(&self, text: &str) -> Vec<PiiMatch>;

    /// Same as [`Detector::detect`], additionally recording validator outcomes.
    fn detect_tallied(&self, text: &str, _tally: &mut ValidationTally) -> Vec<PiiMatch> {
        self.detect(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pii_type_round_trips_through_tags() {
        assert_eq!(PiiType::from("NAME"), PiiType::Name);
        assert_eq!(
            PiiType::from("military_unit"),
            PiiType::Other("military_unit".to_string())
        );
        assert_eq!(String::from(PiiType::Email), "EMAIL");
    }

    #[test]
    fn test_overlap() {
        let a = PiiMatch::new("ab", PiiType::Name, 0, 2, Priority::Name);
        let b = PiiMatch::new("bc", PiiType::Name, 1, 3, Priority::Name);
        let c = PiiMatch::new("cd", PiiType::Name, 2, 4, Priority::Name);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_tally_reports_only_fully_rejected() {
        let mut tally = ValidationTally::default();
        tally.record("israeli_id", false);
        tally.record("israeli_id", false);
        tally.record("phone", true);
        tally.record("phone", false);
        let rejected: Vec<_> = tally.fully_rejected().collect();
        assert_eq!(rejected, vec![("israeli_id", 2)]);
    }
}
