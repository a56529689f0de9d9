//! Structured citations from semi-structured citation fragments.
//!
//! Extraction runs in two passes over a [`CitationFragment`]:
//!
//! 1. **Structural**: hyperlinks are classified by a substring of their
//!    target into author, journal or issue links.
//! 2. **Textual**: regular expressions over the fragment's flattened text
//!    fill whatever the links left empty.
//!
//! A field filled by the structural pass is never overwritten by the
//! textual pass. Extraction is a pure function of its input.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use super::fragment::CitationFragment;
use super::metadata::MetadataElement;
use crate::item::Metadata;

/// Sentinel for an unknown publication year.
pub const YEAR_ABSENT: i32 = -1;

/// Leading author list and parenthesised year, e.g. `Thaler K. (1998/1999)`.
#[allow(clippy::expect_used)]
static AUTHOR_AND_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\D*?) ?\((?P<first_year>[0-9]{4})[-/]?(?P<later_year>[0-9]{0,4})\)")
        .expect("citation author-and-year regex is valid")
});

/// Issue between a dash and a colon, e.g. `– 02: `.
#[allow(clippy::expect_used)]
static ISSUE_NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[–—] ([^–—]*?): ").expect("citation issue regex is valid")
});

/// Page range closing the citation, e.g. `: 1 - 20.` or `: XI - XIV.`.
#[allow(clippy::expect_used)]
static PAGES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r": ([IVXLCDMivxlcdm0-9]*?) - ([IVXLCDMivxlcdm0-9]*?)\.$")
        .expect("citation pages regex is valid")
});

/// Title and journal between the year and the following dashes.
#[allow(clippy::expect_used)]
static TITLE_AND_JOURNAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([0-9]{4}(?:[-/][0-9]{0,4})?\): (.*?) [–—] (.*) [–—] ")
        .expect("citation title-and-journal regex is valid")
});

/// A bibliographic reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Authors in order of appearance, unique by label.
    pub authors: Vec<MetadataElement>,
    /// Article title.
    pub title: String,
    /// First page; may be a Roman numeral.
    pub first_page: String,
    /// Last page; may be a Roman numeral.
    pub last_page: String,
    /// Journal or series.
    pub journal_name: MetadataElement,
    /// Issue or volume.
    pub issue_number: MetadataElement,
    /// Publication year, [`YEAR_ABSENT`] when unknown. Omitted from
    /// serialized metadata when unknown.
    #[serde(skip_serializing_if = "is_year_absent")]
    pub year: i32,
}

impl Default for Citation {
    fn default() -> Self {
        Self {
            authors: Vec::new(),
            title: String::new(),
            first_page: String::new(),
            last_page: String::new(),
            journal_name: MetadataElement::default(),
            issue_number: MetadataElement::default(),
            year: YEAR_ABSENT,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_year_absent(year: &i32) -> bool {
    *year == YEAR_ABSENT
}

impl Citation {
    /// Adds an author unless one with the same label is present. Empty
    /// labels are ignored.
    pub fn add_author(&mut self, author: MetadataElement) {
        if !author.is_empty() && !self.authors.contains(&author) {
            self.authors.push(author);
        }
    }

    /// Whether the publication year is known.
    #[must_use]
    pub fn has_year(&self) -> bool {
        self.year != YEAR_ABSENT
    }

    /// The citation as a metadata map, suitable as an item's document
    /// metadata.
    #[must_use]
    pub fn to_metadata(&self) -> Metadata {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Metadata::new(),
        }
    }
}

/// Role of a hyperlink inside a citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    /// Links to an author page.
    Author,
    /// Links to a journal or series page.
    Journal,
    /// Links to an issue or volume page.
    Issue,
}

/// Classifies citation hyperlinks by substrings of their targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClassifier {
    author: String,
    journal: String,
    issue: String,
}

impl LinkClassifier {
    /// Creates a classifier from the target substrings identifying each role.
    #[must_use]
    pub fn new(
        author: impl Into<String>,
        journal: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            journal: journal.into(),
            issue: issue.into(),
        }
    }

    /// Role of a link with target `href`, checked in author, journal, issue
    /// order.
    #[must_use]
    pub fn classify(&self, href: &str) -> Option<LinkRole> {
        if href.contains(&self.author) {
            Some(LinkRole::Author)
        } else if href.contains(&self.journal) {
            Some(LinkRole::Journal)
        } else if href.contains(&self.issue) {
            Some(LinkRole::Issue)
        } else {
            None
        }
    }
}

/// Extracts a citation from a fragment.
#[must_use]
pub fn extract_citation(fragment: &CitationFragment, classifier: &LinkClassifier) -> Citation {
    let mut citation = Citation::default();
    apply_links(&mut citation, fragment, classifier);
    apply_text_fallback(&mut citation, fragment.text());
    debug!(
        authors = citation.authors.len(),
        year = citation.year,
        title = %citation.title,
        "citation extracted"
    );
    citation
}

fn apply_links(citation: &mut Citation, fragment: &CitationFragment, classifier: &LinkClassifier) {
    for link in fragment.links() {
        let Some(role) = classifier.classify(&link.href) else {
            continue;
        };
        let element = MetadataElement::new(&link.text, Some(&link.href));
        trace!(?role, label = element.label(), "classified citation link");
        match role {
            LinkRole::Author => citation.add_author(element),
            LinkRole::Journal => citation.journal_name = element,
            LinkRole::Issue => citation.issue_number = element,
        }
    }
}

fn apply_text_fallback(citation: &mut Citation, text: &str) {
    // Only some authors may be linked, so unlinked ones are still collected.
    if let Some(captures) = AUTHOR_AND_YEAR_PATTERN.captures(text) {
        for name in captures[1].split(',') {
            citation.add_author(MetadataElement::unlinked(name));
        }
        if !citation.has_year() {
            citation.year = parse_year(&captures["first_year"], &captures["later_year"]);
        }
    }

    if citation.issue_number.is_empty()
        && let Some(captures) = ISSUE_NUMBER_PATTERN.captures_iter(text).last()
    {
        citation.issue_number = MetadataElement::unlinked(&captures[1]);
    }

    if citation.first_page.is_empty()
        && let Some(captures) = PAGES_PATTERN.captures_iter(text).last()
    {
        citation.first_page = captures[1].to_string();
        citation.last_page = captures[2].to_string();
    }

    if (citation.title.is_empty() || citation.journal_name.is_empty())
        && let Some(captures) = TITLE_AND_JOURNAL_PATTERN.captures_iter(text).last()
    {
        if citation.title.is_empty() {
            citation.title = captures[1].trim().to_string();
        }
        if citation.journal_name.is_empty() {
            citation.journal_name = MetadataElement::unlinked(&captures[2]);
        }
    }
}

/// The later year of a range wins only when it is a full four-digit year,
/// so `1904/05` is 1904 and `1998/1999` is 1999.
fn parse_year(first: &str, later: &str) -> i32 {
    let chosen = if later.len() == 4 { later } else { first };
    chosen.parse().unwrap_or(YEAR_ABSENT)
}
