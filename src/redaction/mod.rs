//! Anonymization pipeline orchestration.
//!
//! [`AnonymizationService`] ties the pieces together for one request:
//! upload checks, text extraction (with OCR fallback), per-page detection,
//! substitute assignment, obfuscation and reassembly. It holds no
//! per-request state, so one instance can serve concurrent requests.

pub mod obfuscator;
pub mod report;
pub mod session;

pub use obfuscator::{LiteralSubstituter, Obfuscator};
pub use report::{DetectionWarning, ExtractResponse, MatchReport, PageSummary, PlainTextResponse};
pub use session::{RedactedPage, RequestSession};

use crate::backend::{DocumentBackend, OcrEngine, PageText, PdfBackend};
use crate::config::{ConfigSnapshot, ConfigStore, RequestConfig};
use crate::error::{AnonymizerError, AnonymizerResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Separator between pages in `obfuscated_text`.
const PAGE_SEPARATOR: &str = "\n\n";

/// A processed document: the redacted file and its report.
#[derive(Debug, Clone)]
pub struct AnonymizedDocument {
    pub response: ExtractResponse,
    pub output: Vec<u8>,
}

/// Extracted pages plus any warnings raised while reading them.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub pages: Vec<PageText>,
    pub warnings: Vec<DetectionWarning>,
}

pub struct AnonymizationService {
    store: Arc<ConfigStore>,
    backend: Box<dyn DocumentBackend>,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl AnonymizationService {
    /// Creates a service reading PDFs through [`PdfBackend`].
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self::with_backend(store, Box::new(PdfBackend::new()))
    }

    pub fn with_backend(store: Arc<ConfigStore>, backend: Box<dyn DocumentBackend>) -> Self {
        Self {
            store,
            backend,
            ocr: None,
        }
    }

    pub fn with_ocr(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Rejects uploads over the configured size limit.
    pub fn check_upload(&self, bytes: &[u8], snapshot: &ConfigSnapshot) -> AnonymizerResult<()> {
        let limit = snapshot.config().max_file_size;
        if bytes.len() > limit {
            return Err(AnonymizerError::FileTooLarge {
                size: bytes.len(),
                limit,
            });
        }
        Ok(())
    }

    /// Reads page texts, switching to OCR when the text layer is too sparse
    /// or the request forces it.
    pub fn extract_pages(
        &self,
        bytes: &[u8],
        request: &RequestConfig,
    ) -> AnonymizerResult<Extraction> {
        let snapshot = self.store.snapshot();
        self.check_upload(bytes, &snapshot)?;
        self.extract_with(bytes, request, &snapshot)
    }

    fn extract_with(
        &self,
        bytes: &[u8],
        request: &RequestConfig,
        snapshot: &ConfigSnapshot,
    ) -> AnonymizerResult<Extraction> {
        let settings = &snapshot.config().ocr;
        let pages = self.backend.extract(bytes)?;
        let characters: usize = pages
            .iter()
            .map(|p| p.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        let sparse = characters < settings.min_text_threshold;

        if !sparse && !request.force_ocr {
            return Ok(Extraction {
                pages,
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        let engine = self.ocr.as_deref().filter(|_| settings.enabled);
        let Some(engine) = engine else {
            if sparse {
                warn!(characters, threshold = settings.min_text_threshold, "Sparse text layer, OCR unavailable");
                warnings.push(DetectionWarning::SparseTextLayer {
                    characters,
                    threshold: settings.min_text_threshold,
                });
            } else {
                warnings.push(DetectionWarning::OcrUnavailable {
                    reason: "OCR was forced but no OCR engine is enabled".to_string(),
                });
            }
            return Ok(Extraction { pages, warnings });
        };

        match engine.recognize(bytes, settings) {
            Ok(recognized) if recognized.len() == pages.len() => {
                info!(pages = recognized.len(), forced = request.force_ocr, "Pages read with OCR");
                if sparse {
                    warnings.push(DetectionWarning::OcrFallback {
                        pages: recognized.len(),
                    });
                }
                Ok(Extraction {
                    pages: recognized,
                    warnings,
                })
            }
            Ok(recognized) => {
                warnings.push(DetectionWarning::OcrUnavailable {
                    reason: format!(
                        "OCR returned {} page(s) for a {}-page document",
                        recognized.len(),
                        pages.len()
                    ),
                });
                Ok(Extraction { pages, warnings })
            }
            Err(e) => {
                warn!(error = %e, "OCR failed, using text layer");
                warnings.push(DetectionWarning::OcrUnavailable {
                    reason: e.to_string(),
                });
                Ok(Extraction { pages, warnings })
            }
        }
    }

    /// Anonymizes a PDF upload, returning the rebuilt document and its report.
    pub fn process_pdf(
        &self,
        bytes: &[u8],
        request: &RequestConfig,
    ) -> AnonymizerResult<AnonymizedDocument> {
        let snapshot = self.store.snapshot();
        self.check_upload(bytes, &snapshot)?;

        let extraction = self.extract_with(bytes, request, &snapshot)?;
        let mut session = RequestSession::new(Arc::clone(&snapshot), request)?;
        for warning in extraction.warnings {
            session.warn(warning);
        }

        let redacted = session.anonymize_pages(&extraction.pages);
        let (mappings_used, warnings) = session.finish();

        let pages: Vec<PageText> = redacted.iter().map(|r| r.page.clone()).collect();
        let output = self.backend.reassemble(bytes, &pages)?;

        let summaries: Vec<PageSummary> = redacted.into_iter().map(|r| r.summary).collect();
        let total_matches = summaries.iter().map(|s| s.matches_found).sum();
        let obfuscated_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        let response = ExtractResponse {
            file_id: Uuid::new_v4().to_string(),
            page_count: pages.len(),
            total_matches,
            pages: summaries,
            mappings_used,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            obfuscated_text,
        };

        info!(
            file_id = %response.file_id,
            backend = self.backend.name(),
            pages = response.page_count,
            matches = response.total_matches,
            warnings = response.warnings.len(),
            "Document anonymized"
        );

        Ok(AnonymizedDocument { response, output })
    }

    /// Anonymizes plain text as a single segment.
    pub fn process_text(
        &self,
        text: &str,
        request: &RequestConfig,
    ) -> AnonymizerResult<PlainTextResponse> {
        let snapshot = self.store.snapshot();
        let mut session = RequestSession::new(snapshot, request)?;

        let (obfuscated_text, matches) = session.anonymize_text(text);
        let (mappings_used, warnings) = session.finish();

        info!(matches = matches.len(), "Text anonymized");
        Ok(PlainTextResponse {
            total_matches: matches.len(),
            mappings_used,
            obfuscated_text,
            warnings: warnings.iter().map(ToString::to_string).collect(),
        })
    }

    /// Re-applies a saved mapping table to text with literal substitution.
    pub fn apply_mappings(text: &str, mappings: &BTreeMap<String, String>) -> (String, usize) {
        LiteralSubstituter::new(mappings).apply(text)
    }
}
