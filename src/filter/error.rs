//! Error types for filter rule construction.

use thiserror::Error;

/// Errors raised while turning configured rules into executable filters.
///
/// All of these surface during setup. Once a [`FilterEngine`](super::FilterEngine)
/// exists, evaluating an item cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A predicate label that does not name any known comparison.
    #[error("unknown filter predicate '{label}'")]
    UnknownPredicate {
        /// The label as written in the configuration.
        label: String,
    },

    /// The expected value has a type no filter can compare against.
    #[error("unsupported filter value for field '{field}': {reason}")]
    UnsupportedFilterType {
        /// Metadata field the rule targets.
        field: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// The rule tree does not have the `source -> field -> {predicate: value}` shape.
    #[error("malformed filter rule at '{location}': {reason}")]
    MalformedFilterRule {
        /// Dotted path of the offending node (`Source.field`).
        location: String,
        /// What was wrong with the node.
        reason: String,
    },
}

impl FilterError {
    /// Creates an unknown predicate error.
    pub fn unknown_predicate(label: impl Into<String>) -> Self {
        Self::UnknownPredicate {
            label: label.into(),
        }
    }

    /// Creates an unsupported value type error.
    pub fn unsupported(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFilterType {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed rule error.
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFilterRule {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_unknown_predicate_display() {
        let msg = FilterError::unknown_predicate("between").to_string();
        assert!(msg.contains("between"), "Expected label in: {msg}");
    }

    #[test]
    fn test_filter_error_malformed_display_names_location() {
        let msg = FilterError::malformed("BHL.title", "expected a mapping").to_string();
        assert!(msg.contains("BHL.title"), "Expected location in: {msg}");
        assert!(msg.contains("expected a mapping"), "Expected reason in: {msg}");
    }
}
