//! State of one anonymization request.
//!
//! A session pins the configuration snapshot the request started with,
//! builds its detectors once and owns the replacement mapper. Detection of
//! separate pages runs in parallel; substitute assignment and obfuscation
//! run afterwards on the calling thread, in page order, so the same input
//! always yields the same substitutes.

use super::obfuscator::Obfuscator;
use super::report::{DetectionWarning, PageSummary};
use crate::backend::PageText;
use crate::config::{ConfigSnapshot, RequestConfig};
use crate::domain::{DetectorSet, PiiMatch, ValidationTally};
use crate::error::AnonymizerResult;
use crate::replacement::ReplacementMapper;
use std::collections::BTreeMap;
use std::panic;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// A page after anonymization.
#[derive(Debug, Clone)]
pub struct RedactedPage {
    pub page: PageText,
    pub summary: PageSummary,
}

pub struct RequestSession {
    detectors: DetectorSet,
    mapper: ReplacementMapper,
    obfuscator: Obfuscator,
    tally: ValidationTally,
    warnings: Vec<DetectionWarning>,
}

impl RequestSession {
    pub fn new(snapshot: Arc<ConfigSnapshot>, request: &RequestConfig) -> AnonymizerResult<Self> {
        let detectors = DetectorSet::build(&snapshot, request)?;
        let mapper = ReplacementMapper::new(snapshot, &request.user_replacements);
        Ok(Self {
            detectors,
            mapper,
            obfuscator: Obfuscator::new(),
            tally: ValidationTally::default(),
            warnings: Vec::new(),
        })
    }

    pub fn detectors(&self) -> &DetectorSet {
        &self.detectors
    }

    pub fn warn(&mut self, warning: DetectionWarning) {
        self.warnings.push(warning);
    }

    /// Resolved matches for every page, in page order.
    fn detect_pages(&self, pages: &[PageText]) -> Vec<(Vec<PiiMatch>, ValidationTally)> {
        if pages.len() < 2 {
            return pages.iter().map(|p| self.detectors.detect(&p.text)).collect();
        }

        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(pages.len());
        let chunk = (pages.len() + workers - 1) / workers;
        let detectors = &self.detectors;

        thread::scope(|scope| {
            let handles: Vec<_> = pages
                .chunks(chunk)
                .map(|batch| {
                    scope.spawn(move || {
                        batch
                            .iter()
                            .map(|p| detectors.detect(&p.text))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect()
        })
    }

    /// Detects, maps and substitutes every page.
    pub fn anonymize_pages(&mut self, pages: &[PageText]) -> Vec<RedactedPage> {
        let detected = self.detect_pages(pages);
        let mut redacted = Vec::with_capacity(pages.len());

        for (page, (mut matches, tally)) in pages.iter().zip(detected) {
            self.tally.merge(tally);
            self.mapper.assign_all(&mut matches);
            let text = self.obfuscator.apply(&page.text, &matches);

            debug!(
                page = page.page_number,
                matches = matches.len(),
                "Anonymized page"
            );
            redacted.push(RedactedPage {
                summary: PageSummary::new(page.page_number, &page.text, &matches),
                page: PageText::new(page.page_number, text),
            });
        }

        redacted
    }

    /// Anonymizes one unsegmented text, returning it with its matches.
    pub fn anonymize_text(&mut self, text: &str) -> (String, Vec<PiiMatch>) {
        let (mut matches, tally) = self.detectors.detect(text);
        self.tally.merge(tally);
        self.mapper.assign_all(&mut matches);
        (self.obfuscator.apply(text, &matches), matches)
    }

    /// Closes the session, returning the applied mappings and every warning
    /// raised along the way.
    pub fn finish(self) -> (BTreeMap<String, String>, Vec<DetectionWarning>) {
        let mut warnings = self.warnings;

        warnings.extend(self.tally.fully_rejected().map(|(pattern, candidates)| {
            DetectionWarning::ValidatorRejectedAll {
                pattern: pattern.to_string(),
                candidates,
            }
        }));
        warnings.extend(
            self.mapper
                .exhausted_pools()
                .map(|pool| DetectionWarning::PoolExhausted {
                    pool: pool.to_string(),
                }),
        );

        (self.mapper.into_mappings(), warnings)
    }
}
