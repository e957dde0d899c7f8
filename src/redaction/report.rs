//! Response contracts returned to API consumers.
//!
//! Field names here are the integration contract; offsets are reported in
//! characters of the page text.

use crate::domain::{PiiMatch, PiiType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One match as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub text: String,
    #[serde(rename = "type")]
    pub pii_type: PiiType,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl MatchReport {
    /// Converts a byte-offset match over `segment` into character offsets.
    pub fn from_match(segment: &str, m: &PiiMatch) -> Self {
        let start = segment[..m.start].chars().count();
        let end = start + segment[m.start..m.end].chars().count();
        Self {
            text: m.text.clone(),
            pii_type: m.pii_type.clone(),
            start,
            end,
            pattern_name: m.pattern_name.clone(),
            replacement: m.replacement.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_number: usize,
    pub matches_found: usize,
    pub matches: Vec<MatchReport>,
}

impl PageSummary {
    pub fn new(page_number: usize, segment: &str, matches: &[PiiMatch]) -> Self {
        Self {
            page_number,
            matches_found: matches.len(),
            matches: matches
                .iter()
                .map(|m| MatchReport::from_match(segment, m))
                .collect(),
        }
    }
}

/// Response for a processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub file_id: String,
    pub page_count: usize,
    pub total_matches: usize,
    pub pages: Vec<PageSummary>,
    pub mappings_used: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Redacted pages joined by a blank line
    #[serde(default)]
    pub obfuscated_text: String,
}

/// Response for plain-text input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainTextResponse {
    pub total_matches: usize,
    pub mappings_used: BTreeMap<String, String>,
    pub obfuscated_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Non-fatal condition met while processing. Never aborts a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionWarning {
    /// Too little text and no OCR available to compensate
    SparseTextLayer { characters: usize, threshold: usize },
    /// Pages were re-read with OCR because the text layer was too sparse
    OcrFallback { pages: usize },
    /// OCR was requested or needed but did not produce usable pages
    OcrUnavailable { reason: String },
    /// A validator rejected every candidate its pattern matched
    ValidatorRejectedAll { pattern: String, candidates: usize },
    /// A pool ran out of unused values and repeated some
    PoolExhausted { pool: String },
}

impl fmt::Display for DetectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SparseTextLayer {
                characters,
                threshold,
            } => write!(
                f,
                "Text layer is sparse ({} characters, threshold {}); document may be scanned and was not OCR-processed",
                characters, threshold
            ),
            Self::OcrFallback { pages } => {
                write!(f, "Text layer too sparse, {} page(s) were read with OCR", pages)
            }
            Self::OcrUnavailable { reason } => write!(f, "OCR not applied: {}", reason),
            Self::ValidatorRejectedAll {
                pattern,
                candidates,
            } => write!(
                f,
                "Pattern '{}' matched {} candidate(s) but its validator rejected all of them",
                pattern, candidates
            ),
            Self::PoolExhausted { pool } => write!(
                f,
                "Replacement pool '{}' ran out of unused values; some substitutes repeat",
                pool
            ),
        }
    }
}
