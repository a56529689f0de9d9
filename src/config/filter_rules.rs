//! Per-source filter rule resolution.
//!
//! The `ItemFilter` section of the harvest configuration is a tree
//! `source -> field -> { <predicate>: <expected>, strict: <bool> }`. The
//! reserved source name `General` holds rules that apply to every source
//! without a section of its own.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::filter::{ComparisonResult, FilterError};

/// Source name whose rules apply to sources without their own section.
pub const GENERAL_RULES_KEY: &str = "General";

/// Per-field key marking a rule as strict.
pub const STRICT_KEY: &str = "strict";

/// One configured predicate on one metadata field.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfiguration {
    /// Metadata key the rule inspects. Looked up case-insensitively.
    pub metadata_parameter_name: String,
    /// Value the item's field is compared against. Its JSON type decides
    /// whether an integer or a text filter is built.
    pub expected_value: Value,
    /// Predicate applied to the comparison.
    pub comparison: ComparisonResult,
    /// When set, items lacking the field are rejected instead of kept.
    pub is_strict: bool,
}

/// Rules of one source group, or the error that group failed with.
type GroupRules = Result<Vec<FilterConfiguration>, FilterError>;

/// Filter rules grouped by source name, with `General` as the fallback.
///
/// Each group is parsed on its own: a malformed group only fails the
/// sources that resolve to it, see [`FilterRules::rules_for`]. Built once
/// from configuration and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    general: Option<GroupRules>,
    by_source: HashMap<String, GroupRules>,
}

impl FilterRules {
    /// Parses a rule tree. `null` yields an empty rule set.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::MalformedFilterRule`] only when the tree itself
    /// is not a mapping of source names. Errors inside a source group are
    /// kept with that group.
    pub fn parse(tree: &Value) -> Result<Self, FilterError> {
        let sources = match tree {
            Value::Null => return Ok(Self::default()),
            Value::Object(sources) => sources,
            _ => return Err(FilterError::malformed("ItemFilter", "expected a mapping")),
        };

        let mut rules = Self::default();
        for (source_name, fields) in sources {
            info!(source = %source_name, "reading filter rules");
            let parsed = parse_source_rules(source_name, fields);
            match &parsed {
                Ok(group) => {
                    debug!(source = %source_name, rules = group.len(), "filter rules parsed");
                }
                Err(e) => warn!(source = %source_name, error = %e, "invalid filter rules"),
            }
            if source_name == GENERAL_RULES_KEY {
                rules.general = Some(parsed);
            } else {
                rules.by_source.insert(source_name.clone(), parsed);
            }
        }
        Ok(rules)
    }

    /// Rules for `source_name`: its own section when present, else the
    /// `General` section, else nothing.
    ///
    /// # Errors
    ///
    /// Returns the [`FilterError`] of the resolved section when it is
    /// malformed (a wrong shape, two predicates on one field, a non-boolean
    /// `strict` or an unknown predicate label).
    pub fn rules_for(&self, source_name: &str) -> Result<&[FilterConfiguration], FilterError> {
        match self.by_source.get(source_name).or(self.general.as_ref()) {
            None => Ok(&[]),
            Some(Ok(group)) => Ok(group.as_slice()),
            Some(Err(e)) => Err(e.clone()),
        }
    }

    /// Whether no section at all was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.by_source.is_empty()
    }
}

fn parse_source_rules(
    source_name: &str,
    fields: &Value,
) -> Result<Vec<FilterConfiguration>, FilterError> {
    let fields = match fields {
        Value::Null => return Ok(Vec::new()),
        Value::Object(fields) => fields,
        _ => return Err(FilterError::malformed(source_name, "expected a mapping of fields")),
    };

    fields
        .iter()
        .map(|(field, condition)| parse_field_rule(source_name, field, condition))
        .collect()
}

fn parse_field_rule(
    source_name: &str,
    field: &str,
    condition: &Value,
) -> Result<FilterConfiguration, FilterError> {
    let location = format!("{source_name}.{field}");
    let Value::Object(condition) = condition else {
        return Err(FilterError::malformed(location, "expected a mapping of predicate to value"));
    };

    let is_strict = match condition.get(STRICT_KEY) {
        None => false,
        Some(Value::Bool(strict)) => *strict,
        Some(other) => {
            return Err(FilterError::malformed(
                location,
                format!("'{STRICT_KEY}' must be a boolean, got {other}"),
            ));
        }
    };

    let mut predicates = condition.iter().filter(|(key, _)| key.as_str() != STRICT_KEY);
    let (label, expected_value) = match (predicates.next(), predicates.next()) {
        (Some(predicate), None) => predicate,
        (None, _) => return Err(FilterError::malformed(location, "no predicate given")),
        (Some(_), Some(_)) => {
            return Err(FilterError::malformed(location, "more than one predicate given"));
        }
    };

    Ok(FilterConfiguration {
        metadata_parameter_name: field.to_string(),
        expected_value: expected_value.clone(),
        comparison: ComparisonResult::from_label(label)?,
        is_strict,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_rules() -> FilterRules {
        FilterRules::parse(&json!({
            "General": { "year": { "equalless": 1923 } },
            "BHL": { "title": { "contains": "test", "strict": true } }
        }))
        .unwrap()
    }

    #[test]
    fn test_source_with_own_rules_gets_only_its_rules() {
        let rules = sample_rules();
        let bhl = rules.rules_for("BHL").unwrap();
        assert_eq!(bhl.len(), 1);
        assert_eq!(bhl[0].metadata_parameter_name, "title");
        assert_eq!(bhl[0].comparison, ComparisonResult::Contains);
        assert_eq!(bhl[0].expected_value, json!("test"));
        assert!(bhl[0].is_strict);
    }

    #[test]
    fn test_source_without_rules_falls_back_to_general() {
        let rules = sample_rules();
        let zobodat = rules.rules_for("Zobodat").unwrap();
        assert_eq!(zobodat.len(), 1);
        assert_eq!(zobodat[0].metadata_parameter_name, "year");
        assert_eq!(zobodat[0].comparison, ComparisonResult::EqualLess);
        assert!(!zobodat[0].is_strict);
    }

    #[test]
    fn test_no_rules_and_no_general_is_empty() {
        let rules = FilterRules::parse(&json!({
            "BHL": { "title": { "contains": "test" } }
        }))
        .unwrap();
        assert!(rules.rules_for("Zobodat").unwrap().is_empty());
        assert!(FilterRules::parse(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_empty_own_section_shadows_general() {
        let rules = FilterRules::parse(&json!({
            "General": { "year": { "equal": 1900 } },
            "Zobodat": {}
        }))
        .unwrap();
        assert!(rules.rules_for("Zobodat").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_predicate_is_rejected() {
        let err = FilterRules::parse(&json!({
            "General": { "year": { "between": 1923 } }
        }))
        .unwrap()
        .rules_for("General")
        .unwrap_err();
        assert!(matches!(err, FilterError::UnknownPredicate { .. }));
    }

    #[test]
    fn test_two_predicates_on_one_field_are_rejected() {
        let err = FilterRules::parse(&json!({
            "General": { "year": { "equal": 1923, "lessthan": 2000 } }
        }))
        .unwrap()
        .rules_for("General")
        .unwrap_err();
        assert!(matches!(
            err,
            FilterError::MalformedFilterRule { ref location, .. } if location == "General.year"
        ));
    }

    #[test]
    fn test_strict_only_is_rejected() {
        let err = FilterRules::parse(&json!({
            "General": { "year": { "strict": true } }
        }))
        .unwrap()
        .rules_for("General")
        .unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilterRule { .. }));
    }

    #[test]
    fn test_non_boolean_strict_is_rejected() {
        let err = FilterRules::parse(&json!({
            "General": { "year": { "equal": 1923, "strict": "yes" } }
        }))
        .unwrap()
        .rules_for("General")
        .unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilterRule { .. }));
    }

    #[test]
    fn test_field_condition_must_be_mapping() {
        let err = FilterRules::parse(&json!({ "General": { "year": 1923 } }))
            .unwrap()
            .rules_for("General")
            .unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilterRule { .. }));
    }

    #[test]
    fn test_malformed_group_only_fails_its_own_source() {
        let rules = FilterRules::parse(&json!({
            "General": { "year": { "equalless": 1923 } },
            "Other": { "year": { "between": 1 } }
        }))
        .unwrap();

        let err = rules.rules_for("Other").unwrap_err();
        assert_eq!(err, FilterError::unknown_predicate("between"));
        assert_eq!(rules.rules_for("Zobodat").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_general_fails_only_sources_falling_back() {
        let rules = FilterRules::parse(&json!({
            "General": { "year": { "between": 1 } },
            "Zobodat": { "title": { "contains": "spinnen" } }
        }))
        .unwrap();

        assert_eq!(rules.rules_for("Zobodat").unwrap().len(), 1);
        assert!(rules.rules_for("Other").is_err());
    }

    #[test]
    fn test_tree_must_be_mapping() {
        let err = FilterRules::parse(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, FilterError::MalformedFilterRule { .. }));
    }
}
