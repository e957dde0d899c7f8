//! PII anonymization for PDF text with Hebrew-aware substitution.
//!
//! The library extracts page text from documents, detects personally
//! identifiable information with configurable detectors, assigns each
//! detected value a consistent substitute and rebuilds the document from the
//! redacted text, one output page per input page.
//!
//! # Features
//!
//! - **Layered detection**: exact user terms, server default replacements,
//!   word-list categories, validated regex patterns and label-anchored
//!   Hebrew/English name detectors, merged without overlap by priority
//! - **Consistent substitutes**: the same original maps to the same fake
//!   value on every page of a request
//! - **Hebrew boundaries**: a Hebrew term never matches inside a longer word
//! - **Atomic configuration**: admin edits are validated before they are
//!   swapped in; in-flight requests keep their snapshot
//!
//! # Architecture
//!
//! - [`domain`]: matches, detectors, validators and the overlap resolver
//! - [`config`]: server/request configuration and the compiled snapshot store
//! - [`replacement`]: the request-scoped replacement mapper and pool allocator
//! - [`redaction`]: the pipeline service, obfuscation and response contracts
//! - [`backend`]: document text extraction and reassembly
//! - [`error`]: error types
//!
//! # Quick Start
//!
//! ```no_run
//! use anonymizer::{AnonymizationService, ConfigStore, RequestConfig, ServerConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(ConfigStore::new(ServerConfig::builtin())?);
//! let service = AnonymizationService::new(store);
//!
//! let bytes = std::fs::read("input.pdf")?;
//! let request = RequestConfig::default().with_replacement("מיכאל", "דוד");
//! let document = service.process_pdf(&bytes, &request)?;
//!
//! std::fs::write("anonymized.pdf", &document.output)?;
//! println!("{} matches", document.response.total_matches);
//! # Ok(())
//! # }
//! ```
//!
//! ## Plain text
//!
//! ```
//! use anonymizer::{AnonymizationService, ConfigStore, RequestConfig, ServerConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(ConfigStore::new(ServerConfig::builtin()).unwrap());
//! let service = AnonymizationService::new(store);
//!
//! let request = RequestConfig::default().with_replacement("מאור", "אור");
//! let response = service.process_text("מאור הלך למאורגנת", &request).unwrap();
//! assert_eq!(response.obfuscated_text, "אור הלך למאורגנת");
//! ```

// Public API
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod redaction;
pub mod replacement;

// Re-exports for convenient access
pub use backend::{DocumentBackend, OcrEngine, PageText, PdfBackend};
pub use config::{ConfigSnapshot, ConfigStore, PatternDefinition, RequestConfig, ServerConfig};
pub use domain::{Detector, DetectorSet, PiiMatch, PiiType, Priority};
pub use error::{AnonymizerError, AnonymizerResult};
pub use redaction::{
    AnonymizationService, AnonymizedDocument, DetectionWarning, ExtractResponse,
    PlainTextResponse,
};
pub use replacement::ReplacementMapper;

use std::path::Path;

/// Reads a PDF file and returns its page texts.
pub fn extract_pdf_pages(path: &Path) -> AnonymizerResult<Vec<PageText>> {
    let bytes = std::fs::read(path).map_err(|source| AnonymizerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    PdfBackend::new().extract(&bytes)
}
