//! Label-anchored name detectors.
//!
//! Forms usually print names after a field label ("שם פרטי: מיכאל",
//! "Last Name: Smith"). These detectors find the label, then take the run
//! of name-shaped tokens that follows it on the same line. Only the name
//! span is reported; the label stays in the text.
//!
//! The pattern name of each match records which label it came from
//! (`hebrew_first_name`, `english_last_name`, `hebrew_full_name`, ...), which
//! the replacement mapper uses to pick a first- or last-name pool.

use super::{hebrew, Detector, PiiMatch, PiiType, Priority};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const HEBREW_NAME: &str = "hebrew_name";
pub const ENGLISH_NAME: &str = "english_name";

/// Which field a label introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    First,
    Last,
    Full,
    Generic,
}

impl LabelKind {
    fn max_tokens(self, generic_limit: usize) -> usize {
        match self {
            Self::First | Self::Last => 1,
            Self::Full | Self::Generic => generic_limit,
        }
    }

    fn pattern_name(self, script: &str, tokens: usize) -> String {
        let suffix = match self {
            Self::First => "first_name",
            Self::Last => "last_name",
            Self::Full => "full_name",
            Self::Generic if tokens > 1 => "full_name",
            Self::Generic => "name",
        };
        format!("{}_{}", script, suffix)
    }
}

/// Words that follow a label but are themselves field labels, not names.
const HEBREW_STOP_WORDS: &[&str] = &[
    "שם", "פרטי", "משפחה", "המשפחה", "מלא", "האב", "האם", "תעודת", "זהות", "ת\"ז",
    "טלפון", "כתובת", "גיל", "מין", "תאריך", "לידה", "ישוב", "רחוב", "דואר",
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "Name", "First", "Last", "Full", "Surname", "Address", "Phone", "Email", "Date",
    "ID", "Id", "Age", "City", "Street", "Signature", "Gender", "Birth", "Mobile",
];

fn hebrew_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?x)
            \b(?P<label>שם\s+פרטי|שם\s+משפחה|שם\s+מלא|שם)
            [\ \t]*[:\-]?\s*
            (?P<t1>[\x{05D0}-\x{05EA}][\x{05D0}-\x{05EA}'\x{05F3}]*)
            (?:[\ \t]+(?P<t2>[\x{05D0}-\x{05EA}][\x{05D0}-\x{05EA}'\x{05F3}]*))?
            ",
        )
        .expect("Valid Hebrew name regex")
    });
    &PATTERN
}

fn english_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?x)
            (?i:\b(?P<label>first\s+name|given\s+name|last\s+name|family\s+name|surname|full\s+name|name))
            [\ \t]*[:\-]?\s*
            (?P<t1>[A-Z][A-Za-z'\-]+)
            (?:[\ \t]+(?P<t2>[A-Z][A-Za-z'\-]+))?
            (?:[\ \t]+(?P<t3>[A-Z][A-Za-z'\-]+))?
            ",
        )
        .expect("Valid English name regex")
    });
    &PATTERN
}

fn hebrew_label_kind(label: &str) -> LabelKind {
    if label.ends_with("פרטי") {
        LabelKind::First
    } else if label.ends_with("משפחה") {
        LabelKind::Last
    } else if label.ends_with("מלא") {
        LabelKind::Full
    } else {
        LabelKind::Generic
    }
}

fn english_label_kind(label: &str) -> LabelKind {
    let lower = label.to_lowercase();
    if lower.starts_with("first") || lower.starts_with("given") {
        LabelKind::First
    } else if lower.starts_with("last") || lower.starts_with("family") || lower == "surname" {
        LabelKind::Last
    } else if lower.starts_with("full") {
        LabelKind::Full
    } else {
        LabelKind::Generic
    }
}

/// Turns one regex hit into a match over the kept tokens.
///
/// Tokens are kept left to right until a stop word, the label's token limit
/// or the end of the captured run.
fn name_match(
    text: &str,
    caps: &Captures<'_>,
    kind: LabelKind,
    limit: usize,
    script: &str,
    stop_words: &[&str],
    min_len: usize,
) -> Option<PiiMatch> {
    let mut tokens = Vec::new();
    for group in ["t1", "t2", "t3"] {
        let Some(token) = caps.name(group) else {
            break;
        };
        if stop_words.contains(&token.as_str()) || tokens.len() >= kind.max_tokens(limit) {
            break;
        }
        tokens.push(token);
    }

    let first = tokens.first()?;
    let last = tokens.last()?;
    let (start, end) = (first.start(), last.end());
    let value = &text[start..end];
    if value.chars().count() < min_len || !hebrew::boundary_ok(text, start, end) {
        return None;
    }

    Some(
        PiiMatch::new(value, PiiType::Name, start, end, Priority::Name)
            .with_pattern_name(kind.pattern_name(script, tokens.len())),
    )
}

/// Runs `pattern` over `text`, resuming after each kept name (or after the
/// label when nothing was kept) so a token rejected as a stop word can still
/// start the next labelled field.
fn scan<F>(text: &str, pattern: &Regex, mut to_match: F) -> Vec<PiiMatch>
where
    F: FnMut(&Captures<'_>) -> Option<PiiMatch>,
{
    let mut matches = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(caps) = pattern.captures_at(text, pos) else {
            break;
        };
        let Some(label) = caps.name("label") else {
            break;
        };

        match to_match(&caps) {
            Some(found) => {
                pos = found.end;
                matches.push(found);
            }
            None => pos = label.end(),
        }
    }

    matches
}

/// Hebrew names after "שם", "שם פרטי", "שם משפחה" or "שם מלא".
#[derive(Debug, Clone, Default)]
pub struct HebrewNameDetector;

impl HebrewNameDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for HebrewNameDetector {
    fn name(&self) -> &str {
        HEBREW_NAME
    }

    fn priority(&self) -> Priority {
        Priority::Name
    }

    fn detect(&self, text: &str) -> Vec<PiiMatch> {
        scan(text, hebrew_pattern(), |caps| {
            let kind = hebrew_label_kind(caps.name("label")?.as_str());
            name_match(text, caps, kind, 2, "hebrew", HEBREW_STOP_WORDS, 2)
        })
    }
}

/// English names after "Name", "First Name", "Last Name", "Surname", ...
#[derive(Debug, Clone, Default)]
pub struct EnglishNameDetector;

impl EnglishNameDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for EnglishNameDetector {
    fn name(&self) -> &str {
        ENGLISH_NAME
    }

    fn priority(&self) -> Priority {
        Priority::Name
    }

    fn detect(&self, text: &str) -> Vec<PiiMatch> {
        scan(text, english_pattern(), |caps| {
            let kind = english_label_kind(caps.name("label")?.as_str());
            name_match(text, caps, kind, 3, "english", ENGLISH_STOP_WORDS, 2)
        })
    }
}
