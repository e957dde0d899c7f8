//! Validated, ready-to-run form of a [`ServerConfig`].
//!
//! Compiling is where configuration errors surface: regex syntax, capture
//! group range, validator names, duplicate or reserved pattern names. A
//! [`ConfigSnapshot`] that exists is known to be good, so detection never
//! has to handle a bad pattern.

use super::{PatternDefinition, ServerConfig};
use crate::domain::category::CATEGORY_PREFIX;
use crate::domain::literal::{DEFAULT_REPLACEMENTS, USER_DEFINED};
use crate::domain::names::{ENGLISH_NAME, HEBREW_NAME};
use crate::domain::{CategoryDetector, Validator};
use crate::error::{AnonymizerError, AnonymizerResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Detector names that patterns may not take.
pub const RESERVED_NAMES: [&str; 4] = [USER_DEFINED, DEFAULT_REPLACEMENTS, HEBREW_NAME, ENGLISH_NAME];

/// A pattern definition with its regex and validator resolved.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub definition: PatternDefinition,
    pub regex: Regex,
    pub validator: Option<Validator>,
}

impl CompiledPattern {
    pub fn compile(definition: PatternDefinition) -> AnonymizerResult<Self> {
        let subject = format!("pattern '{}'", definition.name);

        if definition.name.trim().is_empty() {
            return Err(AnonymizerError::config("pattern", "name must not be empty"));
        }
        if RESERVED_NAMES.contains(&definition.name.as_str())
            || definition.name.starts_with(CATEGORY_PREFIX)
        {
            return Err(AnonymizerError::config(
                subject,
                "name is reserved for a built-in detector",
            ));
        }

        let regex = Regex::new(&definition.regex)
            .map_err(|e| AnonymizerError::config(&subject, format!("invalid regex: {}", e)))?;

        // captures_len counts the implicit whole-match group 0
        let groups = regex.captures_len() - 1;
        if definition.capture_group > groups {
            return Err(AnonymizerError::config(
                subject,
                format!(
                    "capture group {} out of range, regex has {} group(s)",
                    definition.capture_group, groups
                ),
            ));
        }

        let validator = definition
            .validator
            .as_deref()
            .map(str::parse::<Validator>)
            .transpose()?;

        Ok(Self {
            definition,
            regex,
            validator,
        })
    }
}

/// Compiles a list of patterns, rejecting duplicate names.
pub fn compile_patterns(
    definitions: &[PatternDefinition],
) -> AnonymizerResult<Vec<Arc<CompiledPattern>>> {
    let mut names = HashSet::new();
    let mut compiled = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if !names.insert(definition.name.as_str()) {
            return Err(AnonymizerError::config(
                format!("pattern '{}'", definition.name),
                "duplicate pattern name",
            ));
        }
        compiled.push(Arc::new(CompiledPattern::compile(definition.clone())?));
    }

    Ok(compiled)
}

/// Immutable view of the server configuration used by requests.
///
/// Every pattern is compiled, disabled ones included, so toggling a pattern
/// back on can never fail.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    config: ServerConfig,
    patterns: Vec<Arc<CompiledPattern>>,
    categories: Vec<Arc<CategoryDetector>>,
}

impl ConfigSnapshot {
    pub fn compile(config: ServerConfig) -> AnonymizerResult<Self> {
        let patterns = compile_patterns(&config.patterns)?;

        let mut categories = Vec::with_capacity(config.categories.len());
        for (name, words) in &config.categories {
            if name.trim().is_empty() {
                return Err(AnonymizerError::config(
                    "category",
                    "name must not be empty",
                ));
            }
            categories.push(Arc::new(CategoryDetector::new(name.clone(), words)));
        }

        if config.max_file_size == 0 {
            return Err(AnonymizerError::config(
                "max_file_size",
                "must be greater than zero",
            ));
        }

        Ok(Self {
            config,
            patterns,
            categories,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Patterns whose `enabled` flag is set.
    pub fn enabled_patterns(&self) -> impl Iterator<Item = &Arc<CompiledPattern>> {
        self.patterns.iter().filter(|p| p.definition.enabled)
    }

    /// Categories not listed in `disabled_categories`.
    pub fn enabled_categories(&self) -> impl Iterator<Item = &Arc<CategoryDetector>> {
        self.categories.iter().filter(|c| {
            !self
                .config
                .disabled_categories
                .iter()
                .any(|d| d == c.category())
        })
    }
}
