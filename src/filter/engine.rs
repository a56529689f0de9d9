//! Executable filters and the per-source filter engine.
//!
//! Each [`FilterConfiguration`] becomes either an integer or a text
//! [`Filter`], decided by the runtime type of the configured expected value.
//! A [`FilterEngine`] holds the filters for one source and rejects an item as
//! soon as any filter rejects it.

use serde_json::Value;
use tracing::debug;

use super::comparison::ComparisonResult;
use super::error::FilterError;
use crate::config::FilterConfiguration;
use crate::item::{Item, Metadata};

/// A single predicate over one document metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Numeric comparison, e.g. `year equalless 1923`.
    Integer {
        /// Metadata key to inspect.
        field: String,
        /// Expected value.
        expected: i64,
        /// Ordering predicate.
        comparison: ComparisonResult,
        /// Reject items lacking the field.
        strict: bool,
    },
    /// Case-insensitive text comparison or substring test.
    Text {
        /// Metadata key to inspect.
        field: String,
        /// Expected value, lower-cased.
        expected: String,
        /// Ordering predicate or `contains`.
        comparison: ComparisonResult,
        /// Reject items lacking the field.
        strict: bool,
    },
}

impl Filter {
    /// Builds a filter from a configured rule.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnsupportedFilterType`] when the expected value
    /// is neither an integer nor a string, or when `contains` is used with an
    /// integer.
    pub fn from_configuration(configuration: &FilterConfiguration) -> Result<Self, FilterError> {
        let field = configuration.metadata_parameter_name.clone();
        let comparison = configuration.comparison;
        let strict = configuration.is_strict;

        match &configuration.expected_value {
            Value::Number(number) => {
                let expected = number.as_i64().ok_or_else(|| {
                    FilterError::unsupported(&field, format!("{number} is not an integer"))
                })?;
                if comparison.is_contains() {
                    return Err(FilterError::unsupported(
                        &field,
                        "'contains' cannot be applied to an integer",
                    ));
                }
                Ok(Self::Integer {
                    field,
                    expected,
                    comparison,
                    strict,
                })
            }
            Value::String(text) => Ok(Self::Text {
                field,
                expected: text.to_lowercase(),
                comparison,
                strict,
            }),
            other => Err(FilterError::unsupported(
                &field,
                format!("expected an integer or a string, got {other}"),
            )),
        }
    }

    /// Metadata key this filter inspects.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Integer { field, .. } | Self::Text { field, .. } => field,
        }
    }

    /// Whether items lacking the field are rejected.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        match self {
            Self::Integer { strict, .. } | Self::Text { strict, .. } => *strict,
        }
    }

    /// Evaluates the filter on an item's document metadata.
    #[must_use]
    pub fn is_item_valid(&self, item: &Item) -> bool {
        self.is_metadata_valid(item.document_metadata())
    }

    /// Evaluates the filter on a metadata map.
    ///
    /// A field that is missing, or present with a value this filter cannot
    /// read, counts as absent.
    #[must_use]
    pub fn is_metadata_valid(&self, metadata: &Metadata) -> bool {
        let raw = lookup_field(metadata, self.field());
        match self {
            Self::Integer {
                expected,
                comparison,
                ..
            } => match raw.and_then(integer_value) {
                Some(actual) => comparison.matches_ordering(actual.cmp(expected)),
                None => !self.is_strict(),
            },
            Self::Text {
                expected,
                comparison,
                ..
            } => match raw.and_then(text_value) {
                Some(actual) => {
                    let actual = actual.to_lowercase();
                    if comparison.is_contains() {
                        actual.contains(expected.as_str())
                    } else {
                        comparison.matches_ordering(actual.as_str().cmp(expected.as_str()))
                    }
                }
                None => !self.is_strict(),
            },
        }
    }
}

/// The filters of one source.
///
/// An engine without filters keeps every item.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    filters: Vec<Filter>,
}

impl FilterEngine {
    /// Creates an engine from already-built filters.
    #[must_use]
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// Builds every configured rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`FilterError`] raised by
    /// [`Filter::from_configuration`].
    pub fn from_configurations(
        configurations: &[FilterConfiguration],
    ) -> Result<Self, FilterError> {
        let filters = configurations
            .iter()
            .map(Filter::from_configuration)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(filters))
    }

    /// The configured filters.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Number of configured filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether no filter is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether every filter accepts the item.
    #[must_use]
    pub fn is_item_valid(&self, item: &Item) -> bool {
        match self.filters.iter().find(|filter| !filter.is_item_valid(item)) {
            Some(rejecting) => {
                debug!(
                    id = ?item.id(),
                    field = rejecting.field(),
                    "item rejected by filter"
                );
                false
            }
            None => true,
        }
    }

    /// Whether any filter rejects the item.
    #[must_use]
    pub fn is_filtered_out(&self, item: &Item) -> bool {
        !self.is_item_valid(item)
    }
}

/// Finds a field by exact key, then lower-cased key, then any key equal
/// ignoring ASCII case.
fn lookup_field<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a Value> {
    metadata
        .get(key)
        .or_else(|| metadata.get(&key.to_lowercase()))
        .or_else(|| {
            metadata
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rule(field: &str, comparison: &str, expected: Value, strict: bool) -> FilterConfiguration {
        FilterConfiguration {
            metadata_parameter_name: field.to_string(),
            expected_value: expected,
            comparison: ComparisonResult::from_label(comparison).unwrap(),
            is_strict: strict,
        }
    }

    fn item_with(key: &str, value: Value) -> Item {
        let mut item = Item::new();
        item.add_metadata(key, value);
        item
    }

    #[test]
    fn test_integer_filter_equalless_year() {
        let engine =
            FilterEngine::from_configurations(&[rule("year", "equalless", json!(1923), false)])
                .unwrap();
        assert!(engine.is_filtered_out(&item_with("year", json!(1924))));
        assert!(!engine.is_filtered_out(&item_with("year", json!(1923))));
        assert!(!engine.is_filtered_out(&item_with("year", json!(1900))));
    }

    #[test]
    fn test_integer_filter_reads_numeric_strings_and_floats() {
        let filter =
            Filter::from_configuration(&rule("year", "lessthan", json!(2000), true)).unwrap();
        assert!(filter.is_item_valid(&item_with("year", json!("1999"))));
        assert!(filter.is_item_valid(&item_with("year", json!(1999.7))));
        assert!(!filter.is_item_valid(&item_with("year", json!("2001"))));
    }

    #[test]
    fn test_unreadable_value_counts_as_absent() {
        let lenient =
            Filter::from_configuration(&rule("year", "equal", json!(1900), false)).unwrap();
        let strict = Filter::from_configuration(&rule("year", "equal", json!(1900), true)).unwrap();
        let item = item_with("year", json!("unknown"));
        assert!(lenient.is_item_valid(&item));
        assert!(!strict.is_item_valid(&item));
    }

    #[test]
    fn test_text_filter_contains_is_case_insensitive() {
        let engine =
            FilterEngine::from_configurations(&[rule("title", "contains", json!("TEST"), false)])
                .unwrap();
        assert!(engine.is_filtered_out(&item_with("title", json!("About Birds!"))));
        assert!(!engine.is_filtered_out(&item_with("title", json!("A Story about Testing"))));
    }

    #[test]
    fn test_text_filter_ordering() {
        let filter =
            Filter::from_configuration(&rule("title", "equal", json!("Flora"), true)).unwrap();
        assert!(filter.is_item_valid(&item_with("title", json!("FLORA"))));
        assert!(!filter.is_item_valid(&item_with("title", json!("Fauna"))));

        let filter =
            Filter::from_configuration(&rule("title", "lessthan", json!("m"), true)).unwrap();
        assert!(filter.is_item_valid(&item_with("title", json!("Alpen"))));
        assert!(!filter.is_item_valid(&item_with("title", json!("Zoologie"))));
    }

    #[test]
    fn test_field_lookup_ignores_case() {
        let filter = Filter::from_configuration(&rule("Year", "equal", json!(1900), true)).unwrap();
        assert!(filter.is_item_valid(&item_with("year", json!(1900))));
        assert!(filter.is_item_valid(&item_with("YEAR", json!(1900))));
    }

    #[test]
    fn test_missing_field_strictness() {
        let lenient_rule = rule("title", "contains", json!("x"), false);
        let strict_rule = rule("title", "contains", json!("x"), true);
        let lenient = FilterEngine::from_configurations(&[lenient_rule]).unwrap();
        let strict = FilterEngine::from_configurations(&[strict_rule]).unwrap();
        let item = item_with("year", json!(1900));
        assert!(!lenient.is_filtered_out(&item));
        assert!(strict.is_filtered_out(&item));
    }

    #[test]
    fn test_filters_use_document_metadata() {
        let mut item = item_with("year", json!(1800));
        let mut document = Metadata::new();
        document.insert("year".into(), json!(1950));
        item.set_document_metadata(document);

        let engine =
            FilterEngine::from_configurations(&[rule("year", "equalless", json!(1923), true)])
                .unwrap();
        assert!(engine.is_filtered_out(&item));
    }

    #[test]
    fn test_any_failing_filter_rejects() {
        let engine = FilterEngine::from_configurations(&[
            rule("year", "equalless", json!(1923), false),
            rule("title", "contains", json!("käfer"), false),
        ])
        .unwrap();

        let mut item = item_with("year", json!(1900));
        item.add_metadata("title", "Die Käfer Europas");
        assert!(!engine.is_filtered_out(&item));

        item.add_metadata("title", "Die Wanzen Europas");
        assert!(engine.is_filtered_out(&item));
    }

    #[test]
    fn test_empty_engine_keeps_everything() {
        let engine = FilterEngine::default();
        assert!(engine.is_empty());
        assert!(!engine.is_filtered_out(&Item::new()));
    }

    #[test]
    fn test_unsupported_expected_values_are_rejected() {
        for expected in [json!(true), json!(19.5), json!(["a"]), json!({ "a": 1 }), Value::Null] {
            let err =
                Filter::from_configuration(&rule("year", "equal", expected, false)).unwrap_err();
            assert!(matches!(err, FilterError::UnsupportedFilterType { .. }));
        }
    }

    #[test]
    fn test_contains_on_integer_is_rejected() {
        let err =
            Filter::from_configuration(&rule("year", "contains", json!(19), false)).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedFilterType { .. }));
    }
}
