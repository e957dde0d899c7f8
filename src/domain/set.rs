//! The per-request collection of active detectors.

use super::literal::LiteralDetector;
use super::names::{EnglishNameDetector, HebrewNameDetector};
use super::pattern::PatternDetector;
use super::{resolver, Detector, PiiMatch, ValidationTally};
use crate::config::compiled::compile_patterns;
use crate::config::{ConfigSnapshot, RequestConfig};
use crate::error::AnonymizerResult;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Active detectors keyed by name.
///
/// Built once per request from a configuration snapshot and the request's
/// overrides, then shared read-only by every page.
#[derive(Clone, Default)]
pub struct DetectorSet {
    detectors: BTreeMap<String, Arc<dyn Detector>>,
}

impl fmt::Debug for DetectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorSet")
            .field("detectors", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl DetectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles the detectors for one request.
    ///
    /// Request `custom_patterns` are compiled here; an invalid one fails the
    /// request and leaves the server configuration untouched. A custom
    /// pattern named like a server pattern replaces it for this request.
    pub fn build(snapshot: &ConfigSnapshot, request: &RequestConfig) -> AnonymizerResult<Self> {
        request.validate()?;
        let config = snapshot.config();
        let mut set = Self::new();

        set.insert(Arc::new(LiteralDetector::user_defined(
            request.user_replacements.keys(),
        )));
        set.insert(Arc::new(LiteralDetector::default_replacements(
            config.default_replacements.keys(),
        )));

        for category in snapshot.enabled_categories() {
            set.insert(category.clone());
        }

        for pattern in snapshot.enabled_patterns() {
            set.insert(Arc::new(PatternDetector::new(Arc::clone(pattern))));
        }
        for pattern in compile_patterns(&request.custom_patterns)? {
            if pattern.definition.enabled {
                set.insert(Arc::new(PatternDetector::new(pattern)));
            }
        }

        set.insert(Arc::new(HebrewNameDetector::new()));
        set.insert(Arc::new(EnglishNameDetector::new()));

        for name in &request.disabled_detectors {
            set.remove(name);
        }

        debug!(detectors = set.len(), "Built detector set");
        Ok(set)
    }

    /// Adds a detector, replacing any detector of the same name.
    pub fn insert(&mut self, detector: Arc<dyn Detector>) {
        self.detectors.insert(detector.name().to_string(), detector);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.detectors.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.detectors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.detectors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Runs every detector over `text` and resolves the candidates into a
    /// non-overlapping list sorted by start.
    ///
    /// Each candidate is ranked by the detector that produced it.
    pub fn detect(&self, text: &str) -> (Vec<PiiMatch>, ValidationTally) {
        let mut tally = ValidationTally::default();
        let mut candidates = Vec::new();

        for detector in self.detectors.values() {
            let priority = detector.priority();
            candidates.extend(
                detector
                    .detect_tallied(text, &mut tally)
                    .into_iter()
                    .map(|mut m| {
                        m.priority = priority;
                        m
                    }),
            );
        }

        (resolver::resolve(candidates), tally)
    }
}
