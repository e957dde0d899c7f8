//! Server and request configuration documents.
//!
//! [`ServerConfig`] is the admin-controlled JSON document; [`RequestConfig`]
//! carries the per-call overrides. Neither is used for detection directly:
//! a server document is compiled into an immutable
//! [`ConfigSnapshot`](compiled::ConfigSnapshot) first, which is where every
//! regex and validator name is checked.

pub mod compiled;
pub mod store;

pub use compiled::{CompiledPattern, ConfigSnapshot};
pub use store::ConfigStore;

use crate::domain::PiiType;
use crate::error::{AnonymizerError, AnonymizerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default upload limit, 20 MiB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// Placeholder key used when a type has no placeholder of its own.
pub const DEFAULT_PLACEHOLDER_KEY: &str = "DEFAULT";

fn default_true() -> bool {
    true
}

/// A named, configurable regex detection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub name: String,
    pub pii_type: PiiType,
    pub regex: String,
    /// Capturing group reported as the match, 0 for the whole match
    #[serde(default)]
    pub capture_group: usize,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

impl PatternDefinition {
    pub fn new(name: impl Into<String>, pii_type: PiiType, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pii_type,
            regex: regex.into(),
            capture_group: 0,
            enabled: true,
            validator: None,
        }
    }

    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = group;
        self
    }

    pub fn with_validator(mut self, validator: &str) -> Self {
        self.validator = Some(validator.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// OCR fallback settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub enabled: bool,
    pub languages: Vec<String>,
    pub dpi: u32,
    /// Fewer extracted characters than this marks the document as image-based
    pub min_text_threshold: usize,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: vec!["he".to_string(), "en".to_string()],
            dpi: 300,
            min_text_threshold: 50,
        }
    }
}

fn default_placeholders() -> BTreeMap<String, String> {
    [
        ("NAME", "[NAME]"),
        ("ID", "[ID]"),
        ("PHONE", "[PHONE]"),
        ("EMAIL", "[EMAIL]"),
        ("ADDRESS", "[ADDRESS]"),
        (DEFAULT_PLACEHOLDER_KEY, "[REDACTED]"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Admin-controlled server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub patterns: Vec<PatternDefinition>,
    /// Category name to the words detected verbatim for it
    pub categories: BTreeMap<String, Vec<String>>,
    pub disabled_categories: Vec<String>,
    pub replacement_pools: BTreeMap<String, Vec<String>>,
    pub placeholders: BTreeMap<String, String>,
    pub default_replacements: BTreeMap<String, String>,
    pub ocr: OcrSettings,
    pub max_file_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            categories: BTreeMap::new(),
            disabled_categories: Vec::new(),
            replacement_pools: BTreeMap::new(),
            placeholders: default_placeholders(),
            default_replacements: BTreeMap::new(),
            ocr: OcrSettings::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn pool(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl ServerConfig {
    /// Configuration shipped with the binary: Israeli ID, mobile phone and
    /// email patterns plus small name and address pools.
    pub fn builtin() -> Self {
        let patterns = vec![
            PatternDefinition::new("israeli_id", PiiType::Id, r"\b\d{8,9}\b")
                .with_validator("israeli_id_checksum"),
            PatternDefinition::new(
                "israeli_mobile",
                PiiType::Phone,
                r"\b05\d[-\x{05BE}\s]?\d{3}[-\s]?\d{4}\b",
            )
            .with_validator("valid_phone_prefix"),
            PatternDefinition::new(
                "email",
                PiiType::Email,
                r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}",
            ),
        ];

        let replacement_pools = [
            (
                "name_hebrew_first",
                pool(&["דוד", "יוסף", "שרה", "רחל", "אבי", "נועה", "יעל", "משה"]),
            ),
            (
                "name_hebrew_last",
                pool(&["כהן", "לוי", "מזרחי", "פרץ", "ביטון", "אברהם", "פרידמן"]),
            ),
            (
                "name_english_first",
                pool(&["David", "Sarah", "Michael", "Rachel", "Daniel", "Noa"]),
            ),
            (
                "name_english_last",
                pool(&["Cohen", "Levi", "Mizrahi", "Peretz", "Friedman"]),
            ),
            ("city", pool(&["חיפה", "נתניה", "רחובות", "אשדוד", "הרצליה"])),
            ("street", pool(&["הרצל", "ויצמן", "בן גוריון", "הנביאים"])),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            patterns,
            replacement_pools,
            ..Self::default()
        }
    }

    /// Reads a configuration document from disk.
    pub fn load(path: &Path) -> AnonymizerResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AnonymizerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            patterns = config.patterns.len(),
            categories = config.categories.len(),
            "Loaded server configuration"
        );
        Ok(config)
    }

    /// Writes the document next to `path` and renames it into place, so a
    /// reader never sees a half-written file.
    pub fn save(&self, path: &Path) -> AnonymizerResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| AnonymizerError::Io {
            path: path.to_path_buf(),
            source,
        };

        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        info!(path = %path.display(), "Saved server configuration");
        Ok(())
    }

    pub fn pattern(&self, name: &str) -> Option<&PatternDefinition> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Placeholder for `pii_type`, falling back to the `DEFAULT` entry.
    pub fn placeholder_for(&self, pii_type: &PiiType) -> String {
        self.placeholders
            .get(pii_type.as_str())
            .or_else(|| self.placeholders.get(DEFAULT_PLACEHOLDER_KEY))
            .cloned()
            .unwrap_or_else(|| "[REDACTED]".to_string())
    }
}

/// Per-call overrides layered on top of the server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Exact original to substitute map; always wins
    pub user_replacements: BTreeMap<String, String>,
    /// Detector names to skip for this request
    pub disabled_detectors: Vec<String>,
    pub force_ocr: bool,
    /// Extra patterns that apply to this request only
    pub custom_patterns: Vec<PatternDefinition>,
}

impl RequestConfig {
    pub fn with_replacement(mut self, original: &str, substitute: &str) -> Self {
        self.user_replacements
            .insert(original.to_string(), substitute.to_string());
        self
    }

    pub fn with_disabled(mut self, detector: &str) -> Self {
        self.disabled_detectors.push(detector.to_string());
        self
    }

    pub fn is_disabled(&self, detector: &str) -> bool {
        self.disabled_detectors.iter().any(|d| d == detector)
    }

    /// Rejects overrides that name nothing: blank replacement originals and
    /// blank detector names.
    pub fn validate(&self) -> AnonymizerResult<()> {
        if self.user_replacements.keys().any(|k| k.trim().is_empty()) {
            return Err(AnonymizerError::invalid_input(
                "user_replacements",
                "original must not be blank",
            ));
        }
        if self.disabled_detectors.iter().any(|d| d.trim().is_empty()) {
            return Err(AnonymizerError::invalid_input(
                "disabled_detectors",
                "detector name must not be blank",
            ));
        }
        Ok(())
    }
}
