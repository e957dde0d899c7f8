//! Request-scoped assignment of substitutes to detected originals.
//!
//! Resolution order for an original seen for the first time:
//!
//! 1. the request's `user_replacements`
//! 2. the server's `default_replacements`
//! 3. a replacement pool chosen from the match type and pattern name
//! 4. a deterministic generator (IDs, phones, emails, ...)
//! 5. the type's placeholder
//!
//! Once assigned, an original keeps its substitute for the rest of the
//! request, across every page.

pub mod allocator;
pub mod generators;

pub use allocator::PoolAllocator;
pub use generators::Generator;

use crate::config::ConfigSnapshot;
use crate::domain::{hebrew, PiiMatch, PiiType};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Attempts made to find a generated value not yet handed out.
const MAX_GENERATOR_ATTEMPTS: u32 = 16;

const HEBREW_FIRST: &str = "name_hebrew_first";
const HEBREW_LAST: &str = "name_hebrew_last";
const ENGLISH_FIRST: &str = "name_english_first";
const ENGLISH_LAST: &str = "name_english_last";

/// Which name pool family a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Hebrew,
    English,
}

impl Script {
    fn of(m: &PiiMatch) -> Self {
        let pattern = m.pattern_name.as_deref().unwrap_or("").to_lowercase();
        if pattern.contains("english") {
            Self::English
        } else if pattern.contains("hebrew") || m.text.chars().any(hebrew::is_hebrew_letter) {
            Self::Hebrew
        } else {
            Self::English
        }
    }

    fn pools(self) -> (&'static str, &'static str) {
        match self {
            Self::Hebrew => (HEBREW_FIRST, HEBREW_LAST),
            Self::English => (ENGLISH_FIRST, ENGLISH_LAST),
        }
    }
}

pub struct ReplacementMapper {
    snapshot: Arc<ConfigSnapshot>,
    user_replacements: BTreeMap<String, String>,
    allocator: PoolAllocator,
    /// Every substitute assigned so far, including name tokens
    assigned: HashMap<String, String>,
    /// Mappings actually applied to matches
    applied: BTreeMap<String, String>,
}

impl ReplacementMapper {
    /// Override values are reserved up front so no pool or generator hands
    /// them to a different original.
    pub fn new(snapshot: Arc<ConfigSnapshot>, user_replacements: &BTreeMap<String, String>) -> Self {
        let user_replacements: BTreeMap<String, String> = user_replacements
            .iter()
            .map(|(k, v)| (k.trim().to_string(), v.clone()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        let mut allocator = PoolAllocator::new();
        for value in user_replacements
            .values()
            .chain(snapshot.config().default_replacements.values())
        {
            allocator.claim(value);
        }

        Self {
            snapshot,
            user_replacements,
            allocator,
            assigned: HashMap::new(),
            applied: BTreeMap::new(),
        }
    }

    /// Substitute for `m`, assigning one on first sight.
    pub fn resolve(&mut self, m: &PiiMatch) -> String {
        let original = m.text.trim();

        let substitute = if let Some(value) = self.user_replacements.get(original) {
            value.clone()
        } else if let Some(value) = self.snapshot.config().default_replacements.get(original) {
            value.clone()
        } else if let Some(value) = self.assigned.get(original) {
            value.clone()
        } else {
            let value = self.assign(m, original);
            self.assigned.insert(original.to_string(), value.clone());
            value
        };

        self.allocator.claim(&substitute);
        self.applied
            .insert(original.to_string(), substitute.clone());
        substitute
    }

    /// Fills in `replacement` on every match.
    pub fn assign_all(&mut self, matches: &mut [PiiMatch]) {
        for m in matches.iter_mut() {
            let substitute = self.resolve(m);
            m.replacement = Some(substitute);
        }
    }

    /// Original to substitute for every mapping applied so far.
    pub fn mappings_used(&self) -> &BTreeMap<String, String> {
        &self.applied
    }

    pub fn into_mappings(self) -> BTreeMap<String, String> {
        self.applied
    }

    pub fn exhausted_pools(&self) -> impl Iterator<Item = &str> {
        self.allocator.exhausted_pools()
    }

    fn assign(&mut self, m: &PiiMatch, original: &str) -> String {
        if m.pii_type == PiiType::Name {
            if let Some(full) = self.full_name(m, original) {
                return full;
            }
        }

        let snapshot = Arc::clone(&self.snapshot);
        let pools = &snapshot.config().replacement_pools;
        for key in pool_keys(m) {
            if let Some(pool) = pools.get(&key) {
                if let Some(value) = self.allocator.pick(&key, pool, original) {
                    return value;
                }
            }
        }

        if let Some(generator) = Generator::for_type(&m.pii_type) {
            return self.generate(generator, original);
        }

        snapshot.config().placeholder_for(&m.pii_type)
    }

    /// First token from the first-name pool, the rest from the last-name
    /// pool. Only applies to multi-token matches from a generic or full-name
    /// label, and only when both pools have values.
    fn full_name(&mut self, m: &PiiMatch, original: &str) -> Option<String> {
        let pattern = m.pattern_name.as_deref().unwrap_or("");
        if pattern.contains("first_name") || pattern.contains("last_name") {
            return None;
        }

        let tokens: Vec<&str> = original.split_whitespace().collect();
        if tokens.len() < 2 {
            return None;
        }

        let snapshot = Arc::clone(&self.snapshot);
        let pools = &snapshot.config().replacement_pools;
        let (first_key, last_key) = Script::of(m).pools();
        let first_pool = pools.get(first_key).filter(|p| !p.is_empty())?;
        let last_pool = pools.get(last_key).filter(|p| !p.is_empty())?;

        let last_index = tokens.len() - 1;
        let parts: Vec<String> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let (key, pool) = if i == last_index {
                    (last_key, last_pool)
                } else {
                    (first_key, first_pool)
                };
                self.token(key, pool, token)
            })
            .collect();

        Some(parts.join(" "))
    }

    /// Substitute for one token of a full name, shared with standalone
    /// occurrences of the same token.
    fn token(&mut self, key: &str, pool: &[String], token: &str) -> String {
        if let Some(value) = self
            .user_replacements
            .get(token)
            .or_else(|| self.snapshot.config().default_replacements.get(token))
            .or_else(|| self.assigned.get(token))
        {
            return value.clone();
        }

        let value = self
            .allocator
            .pick(key, pool, token)
            .unwrap_or_else(|| token.to_string());
        self.assigned.insert(token.to_string(), value.clone());
        value
    }

    fn generate(&mut self, generator: Generator, original: &str) -> String {
        let mut value = generator.generate(original, 0);
        for attempt in 1..MAX_GENERATOR_ATTEMPTS {
            if value != original && !self.allocator.is_used(&value) {
                break;
            }
            value = generator.generate(original, attempt);
        }
        value
    }
}

/// Candidate pool names for a match, most specific first.
fn pool_keys(m: &PiiMatch) -> Vec<String> {
    let pattern = m.pattern_name.as_deref().unwrap_or("");
    let lower = pattern.to_lowercase();
    let mut keys = Vec::new();

    if !pattern.is_empty() {
        keys.push(pattern.to_string());
    }

    match &m.pii_type {
        PiiType::Name => {
            let (first, last) = Script::of(m).pools();
            if lower.contains("last") {
                keys.push(last.to_string());
            }
            keys.push(first.to_string());
        }
        PiiType::Address => {
            if lower.contains("street") || pattern.contains("רחוב") {
                keys.push("street".to_string());
            }
            keys.push("city".to_string());
        }
        PiiType::Other(category) => keys.push(category.clone()),
        _ => {}
    }

    keys.push(m.pii_type.as_str().to_lowercase());
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::domain::Priority;

    fn mapper_with(config: ServerConfig, user: &[(&str, &str)]) -> ReplacementMapper {
        let user: BTreeMap<String, String> = user
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let snapshot = Arc::new(ConfigSnapshot::compile(config).unwrap());
        ReplacementMapper::new(snapshot, &user)
    }

    fn name(text: &str, pattern: &str) -> PiiMatch {
        PiiMatch::new(text, PiiType::Name, 0, text.len(), Priority::Name).with_pattern_name(pattern)
    }

    #[test]
    fn test_user_replacement_wins() {
        let mut config = ServerConfig::builtin();
        config
            .default_replacements
            .insert("מיכאל".to_string(), "אבי".to_string());
        let mut mapper = mapper_with(config, &[("מיכאל", "דוד")]);
        assert_eq!(mapper.resolve(&name("מיכאל", "hebrew_first_name")), "דוד");
    }

    #[test]
    fn test_default_replacement_applies() {
        let mut config = ServerConfig::builtin();
        config
            .default_replacements
            .insert("מאור".to_string(), "אור".to_string());
        let mut mapper = mapper_with(config, &[]);
        assert_eq!(mapper.resolve(&name("מאור", "hebrew_name")), "אור");
    }

    #[test]
    fn test_override_values_are_not_drawn_from_pools() {
        let mut config = ServerConfig::builtin();
        config.replacement_pools.insert(
            HEBREW_FIRST.to_string(),
            vec!["דוד".to_string(), "יוסף".to_string(), "אבי".to_string()],
        );
        config
            .default_replacements
            .insert("אלון".to_string(), "יוסף".to_string());
        let mut mapper = mapper_with(config, &[("מאור", "דוד")]);

        assert_eq!(mapper.resolve(&name("מיכאל", "hebrew_first_name")), "אבי");
        assert_eq!(mapper.resolve(&name("מאור", "hebrew_first_name")), "דוד");
        assert_eq!(mapper.resolve(&name("אלון", "hebrew_first_name")), "יוסף");
    }

    #[test]
    fn test_same_original_same_substitute() {
        let mut mapper = mapper_with(ServerConfig::builtin(), &[]);
        let first = mapper.resolve(&name("מיכאל", "hebrew_first_name"));
        let again = mapper.resolve(&name("מיכאל", "hebrew_first_name"));
        assert_eq!(first, again);
        assert_ne!(first, "מיכאל");
    }

    #[test]
    fn test_last_name_uses_last_pool() {
        let config = ServerConfig::builtin();
        let last_pool = config.replacement_pools[HEBREW_LAST].clone();
        let mut mapper = mapper_with(config, &[]);
        let value = mapper.resolve(&name("פורגאצ'", "hebrew_last_name"));
        assert!(last_pool.contains(&value));
    }

    #[test]
    fn test_english_name_uses_english_pool() {
        let config = ServerConfig::builtin();
        let pool = config.replacement_pools[ENGLISH_FIRST].clone();
        let mut mapper = mapper_with(config, &[]);
        assert!(pool.contains(&mapper.resolve(&name("John", "english_first_name"))));
    }

    #[test]
    fn test_full_name_combines_pools() {
        let config = ServerConfig::builtin();
        let first_pool = config.replacement_pools[HEBREW_FIRST].clone();
        let last_pool = config.replacement_pools[HEBREW_LAST].clone();
        let mut mapper = mapper_with(config, &[]);

        let full = mapper.resolve(&name("דנה לוי", "hebrew_full_name"));
        let parts: Vec<&str> = full.split(' ').collect();
        assert!(first_pool.iter().any(|v| v == parts[0]));
        assert!(last_pool.iter().any(|v| full.ends_with(v.as_str())));

        // The first name alone maps to the same first token
        let alone = mapper.resolve(&name("דנה", "hebrew_first_name"));
        assert!(full.starts_with(&alone));
    }

    #[test]
    fn test_generators_and_placeholders() {
        let mut mapper = mapper_with(ServerConfig::builtin(), &[]);
        let id = PiiMatch::new("123456782", PiiType::Id, 0, 9, Priority::Pattern);
        let fake = mapper.resolve(&id);
        assert_eq!(fake.len(), 9);
        assert_ne!(fake, "123456782");

        let other = PiiMatch::new("x", PiiType::from("SECRET"), 0, 1, Priority::Pattern);
        assert_eq!(mapper.resolve(&other), "[REDACTED]");
    }

    #[test]
    fn test_category_uses_pool_named_after_it() {
        let mut config = ServerConfig::builtin();
        config
            .replacement_pools
            .insert("military_unit".to_string(), vec!["יחידה 1".to_string()]);
        let mut mapper = mapper_with(config, &[]);
        let unit = PiiMatch::new(
            "גולני",
            PiiType::Other("military_unit".to_string()),
            0,
            10,
            Priority::Category,
        )
        .with_pattern_name("category:military_unit");
        assert_eq!(mapper.resolve(&unit), "יחידה 1");
    }

    #[test]
    fn test_missing_pool_falls_back_to_placeholder() {
        let mut mapper = mapper_with(ServerConfig::default(), &[]);
        assert_eq!(mapper.resolve(&name("מיכאל", "hebrew_first_name")), "[NAME]");
        assert_eq!(mapper.resolve(&name("דנה", "hebrew_first_name")), "[NAME]");
    }

    #[test]
    fn test_only_applied_mappings_are_reported() {
        let mut config = ServerConfig::builtin();
        config
            .default_replacements
            .insert("unused".to_string(), "x".to_string());
        let mut mapper = mapper_with(config, &[("also unused", "y"), ("מיכאל", "דוד")]);
        mapper.resolve(&name("מיכאל", "hebrew_first_name"));

        let used = mapper.into_mappings();
        assert_eq!(used.len(), 1);
        assert_eq!(used["מיכאל"], "דוד");
    }

    #[test]
    fn test_assign_all_fills_replacements() {
        let mut mapper = mapper_with(ServerConfig::builtin(), &[("a", "b")]);
        let mut matches = vec![PiiMatch::new("a", PiiType::UserDefined, 0, 1, Priority::UserDefined)];
        mapper.assign_all(&mut matches);
        assert_eq!(matches[0].replacement.as_deref(), Some("b"));
    }
}
