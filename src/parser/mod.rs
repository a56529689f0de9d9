//! Citation parsing.
//!
//! Turns the citation block of a literature page into a structured
//! [`Citation`]:
//!
//! - [`CitationFragment`] - links and flattened text of the citation block
//! - [`LinkClassifier`] - recognizes author, journal and issue links by target
//! - [`extract_citation`] - links first, then text patterns for whatever is missing
//!
//! # Example
//!
//! ```
//! use harvester_core::parser::{CitationFragment, LinkClassifier, extract_citation};
//!
//! let fragment = CitationFragment::new(
//!     Vec::new(),
//!     "Thaler K. (1998/1999): Spinnen. – Ber. nat.-med. Verein Innsbruck – 85: 1 - 20.",
//! );
//! let classifier = LinkClassifier::new("personen.php", "publikation_series.php", "publikation_volumes.php");
//! let citation = extract_citation(&fragment, &classifier);
//! assert_eq!(citation.year, 1999);
//! assert_eq!(citation.first_page, "1");
//! ```

mod citation;
mod fragment;
mod metadata;

pub use citation::{Citation, LinkClassifier, LinkRole, YEAR_ABSENT, extract_citation};
pub use fragment::{CitationFragment, Hyperlink, extract_citation_from_html};
pub use metadata::MetadataElement;
