//! Integration tests for filter rules: from YAML configuration to item decisions.

use std::path::Path;

use harvester_core::{FilterEngine, HarvestSettings, Item, Metadata};
use serde_json::json;

fn settings(item_filter: &str) -> HarvestSettings {
    let yaml = format!(
        "General:\n  output-path: /tmp/harvest\nHarvesters:\n  - Zobodat:\n      class: zobodat\n  - Other:\n      class: zobodat\n{item_filter}"
    );
    HarvestSettings::from_yaml_str(&yaml, Path::new(".")).expect("valid configuration")
}

fn engine(settings: &HarvestSettings, source: &str) -> FilterEngine {
    let rules = settings.filter_rules_for(source).expect("valid rules");
    FilterEngine::from_configurations(rules).expect("valid filters")
}

fn item_with(document: serde_json::Value) -> Item {
    let mut item = Item::new();
    let map: Metadata = document.as_object().cloned().expect("object");
    item.set_document_metadata(map);
    item
}

#[test]
fn test_equalless_year_filter() {
    let settings = settings("ItemFilter:\n  General:\n    year:\n      equalless: 1923\n");
    let engine = engine(&settings, "Zobodat");

    assert!(engine.is_filtered_out(&item_with(json!({ "year": 1924 }))));
    assert!(!engine.is_filtered_out(&item_with(json!({ "year": 1923 }))));
    assert!(!engine.is_filtered_out(&item_with(json!({ "year": 1900 }))));
}

#[test]
fn test_contains_title_filter() {
    let settings = settings("ItemFilter:\n  Zobodat:\n    title:\n      contains: test\n");
    let engine = engine(&settings, "Zobodat");

    assert!(engine.is_filtered_out(&item_with(json!({ "title": "About Birds!" }))));
    assert!(!engine.is_filtered_out(&item_with(json!({ "title": "A Story about Testing" }))));
}

#[test]
fn test_lenient_and_strict_missing_field() {
    let lenient = settings("ItemFilter:\n  General:\n    year:\n      equalless: 1923\n");
    let strict = settings(
        "ItemFilter:\n  General:\n    year:\n      equalless: 1923\n      strict: true\n",
    );
    let no_year = item_with(json!({ "title": "Undated" }));

    assert!(!engine(&lenient, "Zobodat").is_filtered_out(&no_year));
    assert!(engine(&strict, "Zobodat").is_filtered_out(&no_year));
}

#[test]
fn test_own_rules_shadow_general() {
    let settings = settings(
        "ItemFilter:\n  General:\n    year:\n      equalless: 1923\n  Zobodat:\n    title:\n      contains: spinnen\n",
    );
    let old_birds = item_with(json!({ "year": 1900, "title": "Vögel" }));
    let new_spiders = item_with(json!({ "year": 2000, "title": "Spinnen Tirols" }));

    let zobodat = engine(&settings, "Zobodat");
    assert!(zobodat.is_filtered_out(&old_birds));
    assert!(!zobodat.is_filtered_out(&new_spiders));

    let other = engine(&settings, "Other");
    assert!(!other.is_filtered_out(&old_birds));
    assert!(other.is_filtered_out(&new_spiders));
}

#[test]
fn test_no_rules_keeps_everything() {
    let settings = settings("");
    let engine = engine(&settings, "Zobodat");
    assert!(engine.is_empty());
    assert!(!engine.is_filtered_out(&item_with(json!({ "year": 3000 }))));
    assert!(!engine.is_filtered_out(&Item::new()));
}

#[test]
fn test_multiple_rules_all_must_pass() {
    let settings = settings(
        "ItemFilter:\n  General:\n    year:\n      greaterequal: 1900\n    Title:\n      contains: Käfer\n",
    );
    let engine = engine(&settings, "Zobodat");
    assert_eq!(engine.len(), 2);

    let old_beetles = item_with(json!({ "year": 1950, "title": "Die Käfer Wiens" }));
    let older_beetles = item_with(json!({ "year": 1850, "title": "Die Käfer Wiens" }));
    let bugs = item_with(json!({ "year": 1950, "title": "Die Wanzen Wiens" }));
    assert!(!engine.is_filtered_out(&old_beetles));
    assert!(engine.is_filtered_out(&older_beetles));
    assert!(engine.is_filtered_out(&bugs));
}

#[test]
fn test_unknown_predicate_fails_only_sources_using_it() {
    let settings = settings(
        "ItemFilter:\n  General:\n    year:\n      around: 1923\n  Zobodat:\n    title:\n      contains: spinnen\n",
    );
    assert!(settings.filter_rules_for("Other").is_err());
    assert!(!engine(&settings, "Zobodat").is_empty());
}

#[test]
fn test_unsupported_value_type_fails_when_building_filters() {
    let settings = settings("ItemFilter:\n  Zobodat:\n    year:\n      equal: [1923, 1924]\n");
    let rules = settings.filter_rules_for("Zobodat").expect("well-formed rules");
    assert!(FilterEngine::from_configurations(rules).is_err());
}
