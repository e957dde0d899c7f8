//! Boundary with document libraries.
//!
//! The pipeline only ever sees page text. A [`DocumentBackend`] turns an
//! uploaded file into ordered [`PageText`] segments and rebuilds an output
//! file from redacted segments; an [`OcrEngine`] re-reads image-only pages.

pub mod pdf;

pub use pdf::PdfBackend;

use crate::config::OcrSettings;
use crate::error::AnonymizerResult;
use serde::{Deserialize, Serialize};

/// One page's worth of text, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

impl PageText {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// Text round trip through a document format.
pub trait DocumentBackend: Send + Sync {
    /// Ordered page texts of `bytes`.
    fn extract(&self, bytes: &[u8]) -> AnonymizerResult<Vec<PageText>>;

    /// Output document with one page per entry of `pages`, in order.
    fn reassemble(&self, original: &[u8], pages: &[PageText]) -> AnonymizerResult<Vec<u8>>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// Optical character recognition for documents without a text layer.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, bytes: &[u8], settings: &OcrSettings) -> AnonymizerResult<Vec<PageText>>;
}
