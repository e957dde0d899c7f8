//! PDF inspection helpers.

use anonymizer::{DocumentBackend, PageText, PdfBackend};
use anyhow::Result;
use std::path::Path;

/// Extracts page texts from PDF bytes, returning an error instead of panicking.
pub fn pages_of(bytes: &[u8]) -> Result<Vec<PageText>> {
    PdfBackend::new()
        .extract(bytes)
        .map_err(|e| anyhow::anyhow!("Failed to extract text: {}", e))
}

/// Extracts page texts from a PDF file.
pub fn pages_of_file(pdf_path: &Path) -> Result<Vec<PageText>> {
    anonymizer::extract_pdf_pages(pdf_path)
        .map_err(|e| anyhow::anyhow!("Failed to extract text: {}", e))
}

/// All page texts joined with newlines.
pub fn text_of(bytes: &[u8]) -> Result<String> {
    Ok(pages_of(bytes)?
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Counts pages with lopdf directly.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let doc = ::lopdf::Document::load_mem(bytes)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF: {}", e))?;
    Ok(doc.get_pages().len())
}

/// Validates that PDF bytes are loadable and have basic structure.
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    ::lopdf::Document::load_mem(bytes).is_ok()
}
