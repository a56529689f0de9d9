//! User-Agent string for crawler traffic.
//!
//! Single source for project URL and UA format so page fetches and file
//! downloads identify the same way (good citizenship; RFC 9308).

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/harvester";

/// Default User-Agent for crawl and download requests.
#[must_use]
pub(crate) fn default_crawler_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("harvester/{version} (literature-harvester; +{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ua_contains_project_url_and_version() {
        let ua = default_crawler_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL");
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("harvester/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
            "UA must contain crate version"
        );
    }

    #[test]
    fn test_ua_identifies_tool_purpose() {
        let ua = default_crawler_user_agent();
        assert!(
            ua.contains("literature-harvester"),
            "UA must identify as literature-harvester: {ua}"
        );
    }
}
