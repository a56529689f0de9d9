//! Citation fragments: the links and flattened text of a citation block.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::citation::{Citation, LinkClassifier, extract_citation};

#[allow(clippy::expect_used)]
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector is valid"));

/// A hyperlink inside a citation fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    /// Absolute link target.
    pub href: String,
    /// Visible link text, whitespace-normalized.
    pub text: String,
}

impl Hyperlink {
    /// Creates a hyperlink.
    #[must_use]
    pub fn new(href: impl Into<String>, text: &str) -> Self {
        Self {
            href: href.into(),
            text: normalize_whitespace(text),
        }
    }
}

/// Document-order links plus the complete flattened text of a citation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationFragment {
    links: Vec<Hyperlink>,
    text: String,
}

impl CitationFragment {
    /// Creates a fragment from already-extracted parts.
    #[must_use]
    pub fn new(links: Vec<Hyperlink>, text: &str) -> Self {
        Self {
            links,
            text: normalize_whitespace(text),
        }
    }

    /// Builds a fragment from an HTML element, resolving relative link
    /// targets against `base`.
    #[must_use]
    pub fn from_element(element: ElementRef<'_>, base: &Url) -> Self {
        let links = element
            .select(&LINK_SELECTOR)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                match base.join(href) {
                    Ok(resolved) => {
                        let text: String = anchor.text().collect();
                        Some(Hyperlink::new(resolved.to_string(), &text))
                    }
                    Err(error) => {
                        debug!(href, %error, "skipping unresolvable citation link");
                        None
                    }
                }
            })
            .collect();
        let text: String = element.text().collect();
        Self::new(links, &text)
    }

    /// Links in document order.
    #[must_use]
    pub fn links(&self) -> &[Hyperlink] {
        &self.links
    }

    /// Flattened text with runs of whitespace collapsed to single spaces.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Parses `html`, locates the first element matching `container_selector`
/// and extracts a citation from it.
///
/// Returns `None` when the selector is invalid or nothing matches.
#[must_use]
pub fn extract_citation_from_html(
    html: &str,
    container_selector: &str,
    base: &Url,
    classifier: &LinkClassifier,
) -> Option<Citation> {
    let selector = match Selector::parse(container_selector) {
        Ok(selector) => selector,
        Err(error) => {
            warn!(selector = container_selector, %error, "invalid citation container selector");
            return None;
        }
    };
    let document = Html::parse_document(html);
    let Some(container) = document.select(&selector).next() else {
        debug!(selector = container_selector, "citation container not found");
        return None;
    };
    let fragment = CitationFragment::from_element(container, base);
    Some(extract_citation(&fragment, classifier))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
