//! Shared, atomically swapped configuration.
//!
//! Every write clones the current document, applies the edit, compiles the
//! result and only then swaps it in. A rejected edit leaves the previous
//! snapshot active, and requests that already hold a snapshot keep seeing
//! the configuration they started with.

use super::{ConfigSnapshot, PatternDefinition, ServerConfig};
use crate::error::{AnonymizerError, AnonymizerResult};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl ConfigStore {
    pub fn new(config: ServerConfig) -> AnonymizerResult<Self> {
        Ok(Self {
            current: RwLock::new(Arc::new(ConfigSnapshot::compile(config)?)),
        })
    }

    /// The snapshot a request should use from start to finish.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            // A writer only panics before the swap, the stored value is intact
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replaces the whole document.
    pub fn replace(&self, config: ServerConfig) -> AnonymizerResult<()> {
        self.update("replace", |current| {
            *current = config;
            Ok(())
        })
    }

    pub fn add_pattern(&self, pattern: PatternDefinition) -> AnonymizerResult<()> {
        self.update("add_pattern", |config| {
            if config.pattern(&pattern.name).is_some() {
                return Err(AnonymizerError::config(
                    format!("pattern '{}'", pattern.name),
                    "already exists",
                ));
            }
            config.patterns.push(pattern);
            Ok(())
        })
    }

    /// Replaces the pattern called `name`; the new definition may rename it.
    pub fn update_pattern(&self, name: &str, pattern: PatternDefinition) -> AnonymizerResult<()> {
        self.update("update_pattern", |config| {
            let slot = pattern_mut(config, name)?;
            *slot = pattern;
            Ok(())
        })
    }

    pub fn delete_pattern(&self, name: &str) -> AnonymizerResult<()> {
        self.update("delete_pattern", |config| {
            let before = config.patterns.len();
            config.patterns.retain(|p| p.name != name);
            if config.patterns.len() == before {
                return Err(not_found("pattern", name));
            }
            Ok(())
        })
    }

    pub fn set_pattern_enabled(&self, name: &str, enabled: bool) -> AnonymizerResult<()> {
        self.update("set_pattern_enabled", |config| {
            pattern_mut(config, name)?.enabled = enabled;
            Ok(())
        })
    }

    pub fn set_pool(&self, name: &str, values: Vec<String>) -> AnonymizerResult<()> {
        self.update("set_pool", |config| {
            if name.trim().is_empty() {
                return Err(AnonymizerError::config("pool", "name must not be empty"));
            }
            let values: Vec<String> = values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            config.replacement_pools.insert(name.to_string(), values);
            Ok(())
        })
    }

    pub fn remove_pool(&self, name: &str) -> AnonymizerResult<()> {
        self.update("remove_pool", |config| {
            config
                .replacement_pools
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| not_found("pool", name))
        })
    }

    pub fn set_placeholder(&self, pii_type: &str, placeholder: &str) -> AnonymizerResult<()> {
        self.update("set_placeholder", |config| {
            config
                .placeholders
                .insert(pii_type.to_string(), placeholder.to_string());
            Ok(())
        })
    }

    pub fn set_default_replacement(&self, original: &str, substitute: &str) -> AnonymizerResult<()> {
        self.update("set_default_replacement", |config| {
            let original = original.trim();
            if original.is_empty() {
                return Err(AnonymizerError::config(
                    "default replacement",
                    "original must not be empty",
                ));
            }
            config
                .default_replacements
                .insert(original.to_string(), substitute.to_string());
            Ok(())
        })
    }

    pub fn remove_default_replacement(&self, original: &str) -> AnonymizerResult<()> {
        self.update("remove_default_replacement", |config| {
            config
                .default_replacements
                .remove(original)
                .map(|_| ())
                .ok_or_else(|| not_found("default replacement", original))
        })
    }

    pub fn add_category(&self, name: &str, words: Vec<String>) -> AnonymizerResult<()> {
        self.update("add_category", |config| {
            if config.categories.contains_key(name) {
                return Err(AnonymizerError::config(
                    format!("category '{}'", name),
                    "already exists",
                ));
            }
            config.categories.insert(name.to_string(), words);
            Ok(())
        })
    }

    pub fn remove_category(&self, name: &str) -> AnonymizerResult<()> {
        self.update("remove_category", |config| {
            config
                .categories
                .remove(name)
                .ok_or_else(|| not_found("category", name))?;
            config.disabled_categories.retain(|c| c != name);
            Ok(())
        })
    }

    pub fn add_category_word(&self, name: &str, word: &str) -> AnonymizerResult<()> {
        self.update("add_category_word", |config| {
            let words = config
                .categories
                .get_mut(name)
                .ok_or_else(|| not_found("category", name))?;
            let word = word.trim();
            if word.is_empty() {
                return Err(AnonymizerError::config(
                    format!("category '{}'", name),
                    "word must not be empty",
                ));
            }
            if !words.iter().any(|w| w == word) {
                words.push(word.to_string());
            }
            Ok(())
        })
    }

    pub fn remove_category_word(&self, name: &str, word: &str) -> AnonymizerResult<()> {
        self.update("remove_category_word", |config| {
            let words = config
                .categories
                .get_mut(name)
                .ok_or_else(|| not_found("category", name))?;
            let before = words.len();
            words.retain(|w| w != word);
            if words.len() == before {
                return Err(not_found("category word", word));
            }
            Ok(())
        })
    }

    /// Toggles detection for a category without touching its word list.
    pub fn set_category_enabled(&self, name: &str, enabled: bool) -> AnonymizerResult<()> {
        self.update("set_category_enabled", |config| {
            if !config.categories.contains_key(name) {
                return Err(not_found("category", name));
            }
            config.disabled_categories.retain(|c| c != name);
            if !enabled {
                config.disabled_categories.push(name.to_string());
            }
            Ok(())
        })
    }

    fn update<F>(&self, operation: &str, edit: F) -> AnonymizerResult<()>
    where
        F: FnOnce(&mut ServerConfig) -> AnonymizerResult<()>,
    {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut config = guard.config().clone();
        let result = edit(&mut config).and_then(|()| ConfigSnapshot::compile(config));

        match result {
            Ok(snapshot) => {
                *guard = Arc::new(snapshot);
                info!(operation, "Configuration updated");
                Ok(())
            }
            Err(e) => {
                warn!(operation, error = %e, "Configuration update rejected");
                Err(e)
            }
        }
    }
}

fn pattern_mut<'a>(
    config: &'a mut ServerConfig,
    name: &str,
) -> AnonymizerResult<&'a mut PatternDefinition> {
    config
        .patterns
        .iter_mut()
        .find(|p| p.name == name)
        .ok_or_else(|| not_found("pattern", name))
}

fn not_found(kind: &str, name: &str) -> AnonymizerError {
    AnonymizerError::config(format!("{} '{}'", kind, name), "not found")
}
