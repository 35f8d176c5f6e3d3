//! Browser identity classification from the user-agent string

use super::BrowserFamily;

/// One entry of the classification chain
struct FamilyRule {
    matches: fn(&str) -> bool,
    family: BrowserFamily,
    /// Token whose trailing integer is the major version
    version_token: &'static str,
}

// Order matters: identity tokens overlap. Legacy Edge also carries `Chrome/`,
// every Chromium browser also carries `Safari/` and `AppleWebKit`, so the
// more specific rules have to run first.
const RULES: &[FamilyRule] = &[
    FamilyRule {
        matches: |ua| ua.contains("Edge/"),
        family: BrowserFamily::EdgeLegacy,
        version_token: "Edge/",
    },
    FamilyRule {
        matches: |ua| ua.contains("Chrome/") || ua.contains("Chromium/"),
        family: BrowserFamily::Chromium,
        version_token: "Chrome/",
    },
    FamilyRule {
        matches: |ua| ua.contains("Firefox/"),
        family: BrowserFamily::Gecko,
        version_token: "Firefox/",
    },
    FamilyRule {
        matches: |ua| ua.contains("AppleWebKit/") && !ua.contains("Chrome/") && !ua.contains("Chromium/"),
        family: BrowserFamily::Webkit,
        version_token: "Version/",
    },
];

/// Classify an identity string into a family and major version
///
/// A version that cannot be extracted is reported as 0.
pub fn classify(user_agent: &str) -> (BrowserFamily, u32) {
    for rule in RULES {
        if (rule.matches)(user_agent) {
            let version = extract_version(user_agent, rule.version_token)
                .or_else(|| {
                    // Chromium builds without a Chrome/ token
                    if rule.family == BrowserFamily::Chromium {
                        extract_version(user_agent, "Chromium/")
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            return (rule.family, version);
        }
    }
    (BrowserFamily::Unknown, 0)
}

/// First integer directly after `token`
pub fn extract_version(user_agent: &str, token: &str) -> Option<u32> {
    let start = user_agent.find(token)? + token.len();
    let digits: String = user_agent[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_120: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_18: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36 Edge/18.19041";
    const EDGE_CHROMIUM: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const FIREFOX_115: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";
    const SAFARI_12: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.1.2 Safari/605.1.15";

    #[test]
    fn test_chromium() {
        assert_eq!(classify(CHROME_120), (BrowserFamily::Chromium, 120));
    }

    #[test]
    fn test_legacy_edge_before_chromium() {
        assert_eq!(classify(EDGE_18), (BrowserFamily::EdgeLegacy, 18));
    }

    #[test]
    fn test_chromium_edge_is_chromium() {
        assert_eq!(classify(EDGE_CHROMIUM), (BrowserFamily::Chromium, 120));
    }

    #[test]
    fn test_gecko() {
        assert_eq!(classify(FIREFOX_115), (BrowserFamily::Gecko, 115));
    }

    #[test]
    fn test_webkit_requires_missing_chrome_token() {
        assert_eq!(classify(SAFARI_12), (BrowserFamily::Webkit, 12));
    }

    #[test]
    fn test_webkit_without_safari_token() {
        // WKWebView and in-app browsers omit both `Safari/` and `Version/`
        let web_view = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
        assert_eq!(classify(web_view), (BrowserFamily::Webkit, 0));
    }

    #[test]
    fn test_missing_version_defaults_to_zero() {
        assert_eq!(classify("Mozilla/5.0 AppleWebKit/605.1.15 Safari/605"), (BrowserFamily::Webkit, 0));
        assert_eq!(classify("Chrome/abc"), (BrowserFamily::Chromium, 0));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify("curl/8.4.0"), (BrowserFamily::Unknown, 0));
        assert_eq!(classify(""), (BrowserFamily::Unknown, 0));
    }
}
