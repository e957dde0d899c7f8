//! Pipeline properties over plain text and in-memory pages.
//!
//! Covers the Hebrew boundary rule, resolver priority, mapping consistency
//! and the response contract without going through PDF bytes.

mod common;

use anonymizer::{
    AnonymizationService, AnonymizerResult, ConfigStore, DocumentBackend, PageText,
    PatternDefinition, PiiType, RequestConfig, ServerConfig,
};
use common::*;
use std::sync::Arc;

/// Backend that serves fixed pages and returns the redacted text as bytes.
struct MemoryBackend {
    pages: Vec<PageText>,
}

impl DocumentBackend for MemoryBackend {
    fn extract(&self, _bytes: &[u8]) -> AnonymizerResult<Vec<PageText>> {
        Ok(self.pages.clone())
    }

    fn reassemble(&self, _original: &[u8], pages: &[PageText]) -> AnonymizerResult<Vec<u8>> {
        Ok(pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\u{0C}")
            .into_bytes())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn memory_service(config: ServerConfig, pages: &[&str]) -> AnonymizationService {
    let pages = pages
        .iter()
        .enumerate()
        .map(|(i, text)| PageText::new(i + 1, *text))
        .collect();
    let store = Arc::new(ConfigStore::new(config).unwrap());
    AnonymizationService::with_backend(store, Box::new(MemoryBackend { pages }))
}

mod hebrew_boundary {
    use super::*;

    #[test]
    fn test_embedded_term_is_not_replaced() {
        let request = RequestConfig::default().with_replacement("מאור", "אור");
        let response = builtin_service().process_text("מאורגנת", &request).unwrap();
        assert_eq!(response.obfuscated_text, "מאורגנת");
        assert_eq!(response.total_matches, 0);
        assert!(response.mappings_used.is_empty());
    }

    #[test]
    fn test_standalone_term_is_replaced() {
        let request = RequestConfig::default().with_replacement("מאור", "אור");
        let response = builtin_service().process_text("מאור הלך", &request).unwrap();
        assert_eq!(response.obfuscated_text, "אור הלך");
        assert_eq!(response.mappings_used["מאור"], "אור");
    }

    #[test]
    fn test_default_replacement_obeys_boundary() {
        let mut config = ServerConfig::builtin();
        config
            .default_replacements
            .insert("מאור".to_string(), "אור".to_string());
        let response = service_with(config)
            .process_text("מאור, מאורגנת ומאור.", &RequestConfig::default())
            .unwrap();
        assert_eq!(response.obfuscated_text, "אור, מאורגנת ומאור.");
    }

    #[test]
    fn test_category_word_obeys_boundary() {
        let mut config = ServerConfig::builtin();
        config
            .categories
            .insert("military_unit".to_string(), vec!["גולני".to_string()]);
        config
            .replacement_pools
            .insert("military_unit".to_string(), vec!["יחידה 101".to_string()]);
        let response = service_with(config)
            .process_text("שירת בגולני ואחר כך גולני", &RequestConfig::default())
            .unwrap();
        assert_eq!(response.obfuscated_text, "שירת בגולני ואחר כך יחידה 101");
    }
}

mod priority {
    use super::*;

    #[test]
    fn test_user_replacement_suppresses_id_pattern() {
        let request = RequestConfig::default().with_replacement("15968548", "99999999");
        let response = builtin_service()
            .process_text("מספר זהות 15968548 בתיק", &request)
            .unwrap();

        assert!(response.obfuscated_text.contains("99999999"));
        assert!(!response.obfuscated_text.contains("15968548"));
        assert_eq!(response.mappings_used["15968548"], "99999999");
        assert_eq!(response.total_matches, 1);
    }

    #[test]
    fn test_without_user_replacement_pattern_applies() {
        let response = builtin_service()
            .process_text("מספר זהות 15968548 בתיק", &RequestConfig::default())
            .unwrap();
        let fake = &response.mappings_used["15968548"];
        assert_ne!(fake, "15968548");
        assert!(response.obfuscated_text.contains(fake.as_str()));
    }

    #[test]
    fn test_user_replacement_beats_default_replacement() {
        let mut config = ServerConfig::builtin();
        config
            .default_replacements
            .insert("מיכאל".to_string(), "אבי".to_string());
        let request = RequestConfig::default().with_replacement("מיכאל", "דוד");
        let response = service_with(config)
            .process_text("מיכאל כתב", &request)
            .unwrap();
        assert_eq!(response.obfuscated_text, "דוד כתב");
    }

    #[test]
    fn test_user_term_wins_over_longer_name_match() {
        let request = RequestConfig::default().with_replacement("לוי", "כהן");
        let response = builtin_service()
            .process_text("שם: דנה לוי", &request)
            .unwrap();
        assert!(response.obfuscated_text.contains("כהן"));
        assert!(!response.obfuscated_text.contains("דנה לוי"));
    }
}

mod mapping {
    use super::*;

    #[test]
    fn test_recurring_original_gets_identical_substitute() {
        let service = memory_service(
            ServerConfig::builtin(),
            &[
                "שם פרטי: מיכאל\nת.ז. 123456782 ועוד טקסט רגיל בעמוד הראשון של המסמך",
                "העמוד השני מזכיר שוב את מיכאל ואת מספר הזהות 123456782",
                "שם פרטי: מיכאל\nסוף המסמך",
            ],
        );
        let request = RequestConfig::default().with_replacement("מיכאל", "דוד");
        let document = service.process_pdf(b"%PDF-", &request).unwrap();
        let response = &document.response;

        assert_consistent_mappings(response);
        let fake_id = &response.mappings_used["123456782"];
        assert_eq!(response.obfuscated_text.matches(fake_id.as_str()).count(), 2);
        assert_eq!(response.obfuscated_text.matches("דוד").count(), 3);
    }

    #[test]
    fn test_distinct_names_get_distinct_pool_values() {
        let response = builtin_service()
            .process_text(
                "שם פרטי: מיכאל\nשם פרטי: דנה\nשם פרטי: רון",
                &RequestConfig::default(),
            )
            .unwrap();
        let mut values: Vec<_> = response.mappings_used.values().collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_exhausted_pool_wraps_with_warning() {
        let mut config = ServerConfig::builtin();
        config
            .replacement_pools
            .insert("name_hebrew_first".to_string(), vec!["דוד".to_string()]);
        let response = service_with(config)
            .process_text("שם פרטי: מיכאל\nשם פרטי: דנה", &RequestConfig::default())
            .unwrap();

        assert_eq!(response.mappings_used["מיכאל"], "דוד");
        assert_eq!(response.mappings_used["דנה"], "דוד");
        assert!(response
            .warnings
            .iter()
            .any(|w| w.contains("name_hebrew_first")));
    }

    #[test]
    fn test_missing_pool_collapses_to_placeholder() {
        let mut config = ServerConfig::builtin();
        config.replacement_pools.clear();
        let response = service_with(config)
            .process_text("שם פרטי: מיכאל\nשם פרטי: דנה", &RequestConfig::default())
            .unwrap();
        assert_eq!(response.obfuscated_text, "שם פרטי: [NAME]\nשם פרטי: [NAME]");
    }

    #[test]
    fn test_same_input_same_output_across_requests() {
        let text = "שם: דנה לוי, טלפון 054-7654321, ת.ז. 123456782";
        let first = builtin_service()
            .process_text(text, &RequestConfig::default())
            .unwrap();
        let second = builtin_service()
            .process_text(text, &RequestConfig::default())
            .unwrap();
        assert_eq!(first.obfuscated_text, second.obfuscated_text);
        assert_eq!(first.mappings_used, second.mappings_used);
    }
}

mod detection {
    use super::*;

    #[test]
    fn test_validator_rejection_produces_no_match() {
        let response = builtin_service()
            .process_text("מספר 123456789", &RequestConfig::default())
            .unwrap();
        assert_eq!(response.total_matches, 0);
        assert_eq!(response.obfuscated_text, "מספר 123456789");
        assert!(response.warnings.iter().any(|w| w.contains("israeli_id")));
    }

    #[test]
    fn test_disabled_pattern_produces_nothing() {
        let mut config = ServerConfig::builtin();
        for pattern in &mut config.patterns {
            pattern.enabled = false;
        }
        let response = service_with(config)
            .process_text("ת.ז. 123456782", &RequestConfig::default())
            .unwrap();
        assert_eq!(response.total_matches, 0);
    }

    #[test]
    fn test_custom_request_pattern() {
        let mut request = RequestConfig::default();
        request.custom_patterns.push(
            PatternDefinition::new("license", PiiType::from("LICENSE"), r"רישיון\s+(\d{5})")
                .with_capture_group(1),
        );
        let response = builtin_service()
            .process_text("רישיון 12345", &request)
            .unwrap();
        let fake = &response.mappings_used["12345"];
        assert_eq!(fake.len(), 5);
        assert!(response.obfuscated_text.starts_with("רישיון "));
    }

    #[test]
    fn test_earlier_overlapping_pattern_wins() {
        let mut request = RequestConfig::default();
        request.custom_patterns.push(PatternDefinition::new(
            "reference",
            PiiType::from("CASE_NUMBER"),
            r"\bREF\d{3}",
        ));
        request.custom_patterns.push(PatternDefinition::new(
            "docket",
            PiiType::from("CASE_NUMBER"),
            r"\d{3}-[A-Z]+-\d+",
        ));
        let response = builtin_service()
            .process_text("REF123-ABC-99", &request)
            .unwrap();

        assert_eq!(response.total_matches, 1);
        assert!(response.mappings_used.contains_key("REF123"));
        assert!(!response.mappings_used.contains_key("123-ABC-99"));
        assert!(!response.obfuscated_text.contains("REF123"));
        assert!(response.obfuscated_text.ends_with("-ABC-99"));
    }

    #[test]
    fn test_obfuscated_text_joins_pages() {
        let service = memory_service(
            ServerConfig::builtin(),
            &["first page has plenty of characters in it", "second page as well"],
        );
        let document = service.process_pdf(b"%PDF-", &RequestConfig::default()).unwrap();
        assert_eq!(
            document.response.obfuscated_text,
            "first page has plenty of characters in it\n\nsecond page as well"
        );
    }
}
