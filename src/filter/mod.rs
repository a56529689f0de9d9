//! Rule-based item filtering.
//!
//! - [`ComparisonResult`] - named comparison predicates (`equalless`, `contains`, ...)
//! - [`Filter`] - one predicate bound to a metadata field and expected value
//! - [`FilterEngine`] - all filters of one source; an item survives only if every filter accepts it
//!
//! Rules come from [`FilterRules`](crate::config::FilterRules), resolved per source name.

mod comparison;
mod engine;
mod error;

pub use comparison::ComparisonResult;
pub use engine::{Filter, FilterEngine};
pub use error::FilterError;
