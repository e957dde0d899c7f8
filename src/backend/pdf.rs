//! PDF text round trip with `lopdf` (reading) and `printpdf` (writing).
//!
//! Reassembly writes a fresh document: one A4 page per input page, each
//! line of redacted text drawn as its own text object. Layout of the
//! original is not reproduced.

use super::{DocumentBackend, PageText};
use crate::error::{AnonymizerError, AnonymizerResult};
use lopdf::Document;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use std::io::Cursor;
use tracing::debug;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const MAX_FONT_SIZE: f32 = 11.0;
const MIN_FONT_SIZE: f32 = 4.0;
/// Millimetres per point.
const PT_TO_MM: f32 = 0.352_778;

/// Checks the file signature before handing bytes to the parser.
pub fn ensure_pdf(bytes: &[u8]) -> AnonymizerResult<()> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let detected = if bytes.is_empty() {
        "empty file".to_string()
    } else {
        let head: String = bytes
            .iter()
            .take(8)
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        format!("data starting with '{}'", head)
    };
    Err(AnonymizerError::UnsupportedContentType { detected })
}

#[derive(Debug, Clone, Default)]
pub struct PdfBackend {
    /// TrueType font embedded in output; Helvetica when absent
    font: Option<Vec<u8>>,
}

impl PdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds `font` (TrueType bytes) in reassembled documents. Needed for
    /// scripts Helvetica cannot encode, such as Hebrew.
    pub fn with_font(mut self, font: Vec<u8>) -> Self {
        self.font = Some(font);
        self
    }

    fn load_font(&self, doc: &PdfDocumentReference) -> AnonymizerResult<IndirectFontRef> {
        let font = match &self.font {
            Some(bytes) => doc.add_external_font(Cursor::new(bytes.as_slice())),
            None => doc.add_builtin_font(BuiltinFont::Helvetica),
        };
        font.map_err(|e| AnonymizerError::PdfProcessing {
            message: format!("Failed to load output font: {}", e),
            page: None,
            source: None,
        })
    }
}

/// Font size at which `lines` fit the printable height, in points.
fn fit_font_size(lines: usize) -> f32 {
    let printable = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    let size = printable / (lines.max(1) as f32 * 1.2 * PT_TO_MM);
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

impl DocumentBackend for PdfBackend {
    fn extract(&self, bytes: &[u8]) -> AnonymizerResult<Vec<PageText>> {
        ensure_pdf(bytes)?;

        let doc = Document::load_mem(bytes).map_err(|e| AnonymizerError::CorruptDocument {
            reason: e.to_string(),
            source: None,
        })?;

        let mut pages = Vec::new();
        for (index, page_number) in doc.get_pages().keys().enumerate() {
            let text = doc
                .extract_text(&[*page_number])
                .map_err(|e| AnonymizerError::PdfProcessing {
                    message: format!("Failed to extract page text: {}", e),
                    page: Some(index + 1),
                    source: None,
                })?;
            pages.push(PageText::new(index + 1, text.trim_end().to_string()));
        }

        debug!(pages = pages.len(), "Extracted PDF text");
        Ok(pages)
    }

    fn reassemble(&self, _original: &[u8], pages: &[PageText]) -> AnonymizerResult<Vec<u8>> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            "Anonymized document",
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = self.load_font(&doc)?;

        for (index, page) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_ref, layer_ref) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                doc.get_page(page_ref).get_layer(layer_ref)
            };

            let lines: Vec<&str> = page.text.lines().collect();
            let size = fit_font_size(lines.len());
            let step = size * 1.2 * PT_TO_MM;
            let mut y = PAGE_HEIGHT_MM - MARGIN_MM - size * PT_TO_MM;

            for line in lines {
                if !line.trim().is_empty() {
                    layer.use_text(line, size, Mm(MARGIN_MM), Mm(y), &font);
                }
                y -= step;
            }
        }

        doc.save_to_bytes().map_err(|e| AnonymizerError::PdfProcessing {
            message: format!("Failed to write output PDF: {}", e),
            page: None,
            source: None,
        })
    }

    fn name(&self) -> &str {
        "pdf"
    }
}
