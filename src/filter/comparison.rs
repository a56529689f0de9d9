//! Named comparison predicates used by filter rules.
//!
//! A predicate is identified in configuration by a case-insensitive label such
//! as `equalless` or `contains`. Ordering predicates are satisfied by a subset
//! of the three-way comparison results {-1, 0, 1}; `contains` is a substring
//! test and is never satisfied by a numeric comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::FilterError;

/// A comparison predicate a filter rule applies between an item's value and
/// the configured expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonResult {
    /// Item value strictly below the expected value.
    LessThan,
    /// Item value below or equal to the expected value.
    EqualLess,
    /// Item value equal to the expected value.
    Equal,
    /// Item value above or equal to the expected value.
    EqualGreater,
    /// Item value strictly above the expected value.
    GreaterThan,
    /// Item value contains the expected value (text only).
    Contains,
}

impl ComparisonResult {
    /// All predicates in canonical order.
    pub const ALL: [Self; 6] = [
        Self::LessThan,
        Self::EqualLess,
        Self::Equal,
        Self::EqualGreater,
        Self::GreaterThan,
        Self::Contains,
    ];

    /// Parses a predicate label, ignoring case and surrounding whitespace.
    ///
    /// `lessequal` and `greaterequal` are accepted as aliases.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownPredicate`] for any other label.
    pub fn from_label(label: &str) -> Result<Self, FilterError> {
        match label.trim().to_lowercase().as_str() {
            "lessthan" => Ok(Self::LessThan),
            "equalless" | "lessequal" => Ok(Self::EqualLess),
            "equal" => Ok(Self::Equal),
            "equalgreater" | "greaterequal" => Ok(Self::EqualGreater),
            "greaterthan" => Ok(Self::GreaterThan),
            "contains" => Ok(Self::Contains),
            _ => Err(FilterError::unknown_predicate(label.trim())),
        }
    }

    /// Canonical configuration label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LessThan => "lessthan",
            Self::EqualLess => "equalless",
            Self::Equal => "equal",
            Self::EqualGreater => "equalgreater",
            Self::GreaterThan => "greaterthan",
            Self::Contains => "contains",
        }
    }

    /// Whether this is the substring predicate rather than an ordering one.
    #[must_use]
    pub fn is_contains(self) -> bool {
        self == Self::Contains
    }

    /// Tests a three-way comparison result. Only its sign is considered.
    #[must_use]
    pub fn matches(self, three_way: i32) -> bool {
        self.matches_ordering(three_way.cmp(&0))
    }

    /// Tests an [`Ordering`] of item value against expected value.
    #[must_use]
    pub fn matches_ordering(self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => ordering == Ordering::Less,
            Self::EqualLess => ordering != Ordering::Greater,
            Self::Equal => ordering == Ordering::Equal,
            Self::EqualGreater => ordering != Ordering::Less,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::Contains => false,
        }
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ComparisonResult {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_case_insensitive_and_trimmed() {
        assert_eq!(
            ComparisonResult::from_label("  EqualLess ").unwrap(),
            ComparisonResult::EqualLess
        );
        assert_eq!(
            ComparisonResult::from_label("CONTAINS").unwrap(),
            ComparisonResult::Contains
        );
    }

    #[test]
    fn test_from_label_accepts_aliases() {
        assert_eq!(
            ComparisonResult::from_label("lessequal").unwrap(),
            ComparisonResult::EqualLess
        );
        assert_eq!(
            ComparisonResult::from_label("greaterequal").unwrap(),
            ComparisonResult::EqualGreater
        );
    }

    #[test]
    fn test_from_label_unknown_is_error() {
        let err = ComparisonResult::from_label("between").unwrap_err();
        assert!(matches!(err, FilterError::UnknownPredicate { ref label } if label == "between"));
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for predicate in ComparisonResult::ALL {
            assert_eq!(predicate.label().parse::<ComparisonResult>().unwrap(), predicate);
        }
    }

    #[test]
    fn test_matches_result_sets() {
        let cases = [
            (ComparisonResult::LessThan, [true, false, false]),
            (ComparisonResult::EqualLess, [true, true, false]),
            (ComparisonResult::Equal, [false, true, false]),
            (ComparisonResult::EqualGreater, [false, true, true]),
            (ComparisonResult::GreaterThan, [false, false, true]),
            (ComparisonResult::Contains, [false, false, false]),
        ];
        for (predicate, expected) in cases {
            for (three_way, want) in [-1, 0, 1].into_iter().zip(expected) {
                assert_eq!(
                    predicate.matches(three_way),
                    want,
                    "{predicate} on {three_way}"
                );
            }
        }
    }

    #[test]
    fn test_matches_uses_sign_only() {
        assert!(ComparisonResult::LessThan.matches(-42));
        assert!(ComparisonResult::GreaterThan.matches(7));
    }

    #[test]
    fn test_equal_matches_self_comparison() {
        for value in [i64::MIN, -3, 0, 1923, i64::MAX] {
            assert!(ComparisonResult::Equal.matches_ordering(value.cmp(&value)));
        }
    }
}
